//! Sala Core - DSP primitives for feedback-delay-network reverbs
//!
//! This crate provides the building blocks the `sala-reverb` engine is wired
//! from. Every type owns fixed-capacity storage that is allocated at
//! construction (or on an explicit resize) and never touched by the allocator
//! while processing audio.
//!
//! # Buffers
//!
//! - [`RingBuffer`] - Fixed-capacity circular sample buffer shared by every delay
//! - [`DelayLine`] - Fixed-length FIFO delay (one per network line)
//! - [`PredelayLine`] - Runtime-variable delay applied before the network
//!
//! ## Filters
//!
//! - [`Biquad`] - Second-order IIR (transposed direct form II, RBJ coefficients)
//! - [`CascadedBiquad`] - Two biquads in series for 24 dB/oct slopes
//! - [`AllpassFilter`] - First-order allpass diffuser with output smoothing
//! - [`ModulatedAllpass`] - Allpass diffuser with an LFO-modulated delay length
//! - [`DcBlocker`] - Second-order DC notch
//!
//! ## Mixing
//!
//! - [`Matrix`] - Fixed N×N mixing matrix with [`hadamard`] and [`householder`] generators
//!
//! ## Utilities
//!
//! - [`soft_limit`] - Smooth limiter that never reaches ±1.0
//! - [`DenormalGuard`] - Keeps feedback paths out of the subnormal range
//! - Conversions: [`db_to_linear`], [`linear_to_db`], [`ms_to_samples`]
//!
//! # no_std Support
//!
//! Disable the default `std` feature for embedded targets:
//!
//! ```toml
//! [dependencies]
//! sala-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use sala_core::{Biquad, DelayLine, soft_limit};
//!
//! let mut delay = DelayLine::new(1031);
//! let mut lowpass = Biquad::new();
//! lowpass.set_lowpass(5000.0, 0.7071, 44100.0);
//!
//! let out = soft_limit(delay.process(lowpass.process(0.5)));
//! assert!(out.abs() < 1.0);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod allpass;
pub mod biquad;
pub mod dc_blocker;
pub mod delay;
pub mod denormal;
pub mod lfo;
pub mod math;
pub mod matrix;
pub mod ring_buffer;

// Re-export main types at crate root
pub use allpass::{AllpassFilter, ModulatedAllpass};
pub use biquad::{
    BUTTERWORTH_Q, Biquad, CascadedBiquad, clamp_cutoff, highpass_coefficients,
    lowpass_coefficients,
};
pub use dc_blocker::DcBlocker;
pub use delay::{DelayLine, PredelayLine};
pub use denormal::DenormalGuard;
pub use lfo::Lfo;
pub use math::{
    db_to_linear, flush_denormal, linear_to_db, ms_to_samples, samples_to_ms, soft_limit,
    wet_dry_mix,
};
pub use matrix::{Matrix, hadamard, householder};
pub use ring_buffer::RingBuffer;
