//! Sala Reverb - feedback-delay-network reverberator
//!
//! A realtime-safe FDN reverb built on the primitives in `sala-core`:
//! prime-length delay lines mixed through Hadamard and Householder matrices,
//! per-line filtering and allpass diffusion, and a tapped early-reflection
//! simulator in front of the late network.
//!
//! # Components
//!
//! - [`FdnReverb`] - The engine, generic over the number of lines
//!   ([`FdnReverb4`], [`FdnReverb8`], [`FdnReverb16`])
//! - [`ReverbProcessor`] - Engine plus enable flag and dry/wet blend, as a host
//!   inserts it
//! - [`ReverbParams`] - Control snapshot read once per block
//! - [`EarlyReflections`] - Tapped delay producing the first few echoes
//! - [`tuning`] - Reference-rate delay tables and the helpers that rescale them
//!
//! # Lifecycle
//!
//! `prepare(sample_rate)` is the only call that allocates. `process` may then
//! be called any number of times from the audio thread; it never allocates,
//! locks or fails. Out-of-range controls are clamped.
//!
//! # Example
//!
//! ```rust
//! use sala_reverb::{FdnReverb8, ReverbParams};
//!
//! let mut reverb = FdnReverb8::new();
//! reverb.prepare(44100.0);
//!
//! let params = ReverbParams {
//!     predelay_ms: 20.0,
//!     decay: 0.9,
//!     ..ReverbParams::default()
//! };
//!
//! let mut block = [vec![0.0f32; 512], vec![0.0f32; 512]];
//! block[0][0] = 1.0;
//! reverb.process_in_place(&mut block, &params);
//! ```
//!
//! # Features
//!
//! - `std` (default) - Standard library support; disable for `no_std`
//! - `tracing` - Lifecycle logging through `tracing` (never from `process`)
//! - `serde` - `Serialize`/`Deserialize` for [`ReverbParams`] and [`FilterSlope`]

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod early;
pub mod engine;
pub mod params;
pub mod processor;
pub mod tuning;

pub use early::EarlyReflections;
pub use engine::{
    DEFAULT_EARLY_LEVEL, FdnReverb, FdnReverb4, FdnReverb8, FdnReverb16, FilterSlope,
    MAX_PREDELAY_SECONDS,
};
pub use params::ReverbParams;
pub use processor::{DEFAULT_MIX, ReverbProcessor};
