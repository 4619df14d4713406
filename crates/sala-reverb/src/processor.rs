//! Host-side wrapper: bypass switch and dry/wet blend around the engine.

use alloc::vec::Vec;

use sala_core::wet_dry_mix;

use crate::engine::{FdnReverb, FilterSlope};
use crate::params::ReverbParams;

/// Default dry/wet blend.
pub const DEFAULT_MIX: f32 = 0.5;

/// Reverb as a host inserts it: the engine plus an enable flag and a dry/wet
/// blend applied to the same buffers.
///
/// When disabled the block passes through untouched. When enabled each sample
/// becomes `dry + (wet - dry) * mix`. The dry copy lives in scratch buffers
/// sized by [`prepare`](Self::prepare), so processing never allocates; blocks
/// longer than the prepared size run in prepared-size chunks, and channels
/// beyond the prepared count pass through dry.
///
/// # Example
///
/// ```rust
/// use sala_reverb::ReverbProcessor;
///
/// let mut reverb = ReverbProcessor::<8>::new();
/// reverb.prepare(48000.0, 512, 2);
/// reverb.set_mix(0.3);
///
/// let mut block = [vec![0.25f32; 512], vec![0.25f32; 512]];
/// reverb.process(&mut block);
/// assert!(block.iter().flatten().all(|s| s.is_finite()));
/// ```
#[derive(Debug, Clone)]
pub struct ReverbProcessor<const N: usize> {
    engine: FdnReverb<N>,
    params: ReverbParams,
    enabled: bool,
    mix: f32,
    dry: Vec<Vec<f32>>,
    wet: Vec<Vec<f32>>,
    max_block_size: usize,
}

impl<const N: usize> Default for ReverbProcessor<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ReverbProcessor<N> {
    /// Creates an enabled processor with default parameters and a 50% mix.
    pub fn new() -> Self {
        Self::with_engine(FdnReverb::new())
    }

    /// Wraps an existing engine, e.g. one built with
    /// [`FdnReverb::with_seed`].
    pub fn with_engine(engine: FdnReverb<N>) -> Self {
        Self {
            engine,
            params: ReverbParams::default(),
            enabled: true,
            mix: DEFAULT_MIX,
            dry: Vec::new(),
            wet: Vec::new(),
            max_block_size: 0,
        }
    }

    /// Prepares the engine and sizes the scratch buffers (allocates).
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize, max_channels: usize) {
        self.engine.prepare(sample_rate);

        let block = max_block_size.max(1);
        self.dry = (0..max_channels).map(|_| Vec::with_capacity(block)).collect();
        self.wet = (0..max_channels).map(|_| Vec::with_capacity(block)).collect();
        self.max_block_size = block;
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &FdnReverb<N> {
        &self.engine
    }

    /// Mutable access to the wrapped engine.
    pub fn engine_mut(&mut self) -> &mut FdnReverb<N> {
        &mut self.engine
    }

    /// Replaces the control snapshot used by subsequent blocks.
    pub fn set_params(&mut self, params: ReverbParams) {
        self.params = params;
    }

    /// Current control snapshot.
    pub fn params(&self) -> &ReverbParams {
        &self.params
    }

    /// Sets the dry/wet blend, clamped to `[0, 1]` (NaN keeps the old value).
    pub fn set_mix(&mut self, mix: f32) {
        if !mix.is_nan() {
            self.mix = mix.clamp(0.0, 1.0);
        }
    }

    /// Current dry/wet blend.
    pub fn mix(&self) -> f32 {
        self.mix
    }

    /// Forwards to [`FdnReverb::set_early_level`].
    pub fn set_early_level(&mut self, level: f32) {
        self.engine.set_early_level(level);
    }

    /// Forwards to [`FdnReverb::set_highpass_slope`].
    pub fn set_highpass_slope(&mut self, slope: FilterSlope) {
        self.engine.set_highpass_slope(slope);
    }

    /// Turns the reverb on or off. Turning it on starts from a silent network.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        if enabled {
            self.engine.reset();
        }
        self.enabled = enabled;

        #[cfg(feature = "tracing")]
        tracing::debug!(enabled, "reverb toggled");
    }

    /// Whether the reverb is active.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Largest block processed in one engine call.
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Processes one block in place.
    pub fn process<B: AsMut<[f32]>>(&mut self, buffer: &mut [B]) {
        if !self.enabled || !self.engine.is_prepared() || self.max_block_size == 0 {
            return;
        }

        let channels = buffer.len().min(self.dry.len());
        let frames = buffer[..channels]
            .iter_mut()
            .map(|c| c.as_mut().len())
            .min()
            .unwrap_or(0);

        let mut start = 0;
        while start < frames {
            let end = (start + self.max_block_size).min(frames);
            self.process_chunk(&mut buffer[..channels], start, end);
            start = end;
        }
    }

    fn process_chunk<B: AsMut<[f32]>>(&mut self, buffer: &mut [B], start: usize, end: usize) {
        let len = end - start;
        for (dry, channel) in self.dry.iter_mut().zip(buffer.iter_mut()) {
            dry.clear();
            dry.extend_from_slice(&channel.as_mut()[start..end]);
        }
        for wet in self.wet.iter_mut().take(buffer.len()) {
            wet.resize(len, 0.0);
        }

        let channels = buffer.len();
        self.engine
            .process(&self.dry[..channels], &mut self.wet[..channels], &self.params);

        for ((channel, dry), wet) in buffer.iter_mut().zip(&self.dry).zip(&self.wet) {
            let out = &mut channel.as_mut()[start..end];
            for ((o, &d), &w) in out.iter_mut().zip(dry).zip(wet) {
                *o = wet_dry_mix(d, w, self.mix);
            }
        }
    }
}
