//! Feedback-delay-network reverb engine.
//!
//! `N` prime-length delay lines recirculate through an orthogonal Householder
//! matrix. Input enters through a Hadamard spread, each line low-passes what it
//! is fed and shapes what comes out (DC block, allpass diffusion, high-pass,
//! soft limit), and a trimmed copy of the shaped signal becomes the next
//! sample's feedback.
//!
//! ```text
//! in ─► DC ─► guard ─► predelay ─► Hadamard ─► ±x + 0.98·fb ─► LPF ─► delay ─┐
//!                                                                           │
//!   ┌──────────────────────────────── Householder ◄─────────────────────────┘
//!   └─► DC ─► allpass ─► allpass ─► mod allpass ─► HPF ─► limit ─► tap
//!                                                          fb = guard(tap · decay · trim)
//!
//! out[ch] = limit(early · level + gain · Σ tap[(k + ch) mod N]),  k = 0, 2, 4, ...
//! ```

use sala_core::{
    AllpassFilter, BUTTERWORTH_Q, Biquad, CascadedBiquad, DcBlocker, DelayLine, DenormalGuard,
    Matrix, ModulatedAllpass, PredelayLine, hadamard, householder, ms_to_samples, soft_limit,
};

use crate::early::EarlyReflections;
use crate::params::{DECAY_RANGE, DIFFUSION_RANGE, ReverbParams, clamp_or};
use crate::tuning::{
    DIFFUSER_A_44K, DIFFUSER_B_44K, MAX_LINES, MODULATED_44K, REFERENCE_RATE, decay_variation,
    line_delay, lowpass_spread, modulation_rate, scale_to_prime, table_index,
};

/// Longest predelay the engine can produce, in seconds.
pub const MAX_PREDELAY_SECONDS: f32 = 2.0;

/// Scale applied to the previous feedback sample before it re-enters a line.
const FEEDBACK_SCALE: f32 = 0.98;

/// Output gain before normalization by the number of summed lines.
///
/// Each channel sums `N / 2` decorrelated taps, so the sum is divided by
/// `sqrt(N / 2)` to keep the late level independent of the network size.
const OUTPUT_GAIN: f32 = 2.0;

/// Default blend weight of the early reflections.
pub const DEFAULT_EARLY_LEVEL: f32 = 0.8;

/// Output smoothing of the static diffusers.
const DIFFUSER_SMOOTHING: f32 = 0.9;

/// Diffusion above which the modulated diffuser joins the chain.
const MODULATION_THRESHOLD: f32 = 0.5;

/// Modulated diffuser depth (fraction of its nominal size).
const MODULATION_DEPTH: f32 = 0.1;

/// Relative sample-rate change that triggers rebuilding the delay lines.
const RESCALE_TOLERANCE: f32 = 0.01;

/// Supported sample-rate range; `prepare` clamps into it.
const SAMPLE_RATE_RANGE: (f32, f32) = (8000.0, 384_000.0);

/// Slope of the per-line high-pass filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FilterSlope {
    /// One biquad section.
    #[default]
    Db12,
    /// Two cascaded sections.
    Db24,
}

#[derive(Debug, Clone)]
enum Highpass {
    Single(Biquad),
    Cascaded(CascadedBiquad),
}

impl Highpass {
    fn new(slope: FilterSlope) -> Self {
        match slope {
            FilterSlope::Db12 => Self::Single(Biquad::new()),
            FilterSlope::Db24 => Self::Cascaded(CascadedBiquad::new()),
        }
    }

    fn set_cutoff(&mut self, frequency: f32, sample_rate: f32) {
        match self {
            Self::Single(f) => f.set_highpass(frequency, BUTTERWORTH_Q, sample_rate),
            Self::Cascaded(f) => f.set_highpass(frequency, BUTTERWORTH_Q, sample_rate),
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        match self {
            Self::Single(f) => f.process(input),
            Self::Cascaded(f) => f.process(input),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Single(f) => f.reset(),
            Self::Cascaded(f) => f.reset(),
        }
    }
}

/// Everything one network line owns.
#[derive(Debug, Clone)]
struct Line {
    input_dc: DcBlocker,
    predelay: PredelayLine,
    lowpass: Biquad,
    delay: DelayLine,
    dc: DcBlocker,
    diffuser_a: AllpassFilter,
    diffuser_b: AllpassFilter,
    modulated: ModulatedAllpass,
    highpass: Highpass,
    decay_trim: f32,
    lfo_phase: f32,
}

impl Line {
    fn new(index: usize, n: usize, sample_rate: f32, slope: FilterSlope) -> Self {
        let table = table_index(index, n);
        let mut modulated = ModulatedAllpass::new(MODULATED_44K[table], sample_rate);
        modulated.set_modulation(MODULATION_DEPTH, modulation_rate(index, n));
        let lfo_phase = index as f32 / n as f32;
        modulated.set_phase(lfo_phase);

        Self {
            input_dc: DcBlocker::new(),
            predelay: PredelayLine::from_time(sample_rate, MAX_PREDELAY_SECONDS),
            lowpass: Biquad::new(),
            delay: DelayLine::new(line_delay(index, n)),
            dc: DcBlocker::new(),
            diffuser_a: AllpassFilter::new(DIFFUSER_A_44K[table]).with_smoothing(DIFFUSER_SMOOTHING),
            diffuser_b: AllpassFilter::new(DIFFUSER_B_44K[table]).with_smoothing(DIFFUSER_SMOOTHING),
            modulated,
            highpass: Highpass::new(slope),
            decay_trim: decay_variation(index),
            lfo_phase,
        }
    }

    /// Resizes every fixed-length buffer from the reference tables.
    fn rebuild(&mut self, index: usize, n: usize, ratio: f32, sample_rate: f32) {
        let table = table_index(index, n);
        self.delay.resize(scale_to_prime(line_delay(index, n), ratio));
        self.diffuser_a.resize(scale_to_prime(DIFFUSER_A_44K[table], ratio));
        self.diffuser_b.resize(scale_to_prime(DIFFUSER_B_44K[table], ratio));
        self.modulated
            .resize(scale_to_prime(MODULATED_44K[table], ratio), sample_rate);
    }

    fn reset(&mut self) {
        self.input_dc.reset();
        self.predelay.clear();
        self.lowpass.reset();
        self.delay.clear();
        self.dc.reset();
        self.diffuser_a.clear();
        self.diffuser_b.clear();
        self.modulated.clear();
        self.modulated.set_phase(self.lfo_phase);
        self.highpass.reset();
    }
}

/// Per-block values derived from [`ReverbParams`].
#[derive(Debug, Clone, Copy)]
struct BlockParams {
    predelay_samples: usize,
    decay: f32,
    coeff_a: f32,
    coeff_b: f32,
    modulated_coeff: Option<f32>,
}

/// Feedback-delay-network reverb with `N` lines.
///
/// `N` must be a power of two between 2 and 16; the aliases [`FdnReverb4`],
/// [`FdnReverb8`] and [`FdnReverb16`] cover the usual sizes.
///
/// # Lifecycle
///
/// A new engine is *unprepared*: it owns buffers sized for 44.1 kHz but has
/// not been told the host rate, and [`process`](Self::process) writes silence.
/// [`prepare`](Self::prepare) sizes everything for the host rate, resets all
/// state and makes the engine *prepared*. Call it again whenever the rate
/// changes; it is the only method that allocates.
///
/// # Example
///
/// ```rust
/// use sala_reverb::{FdnReverb8, ReverbParams};
///
/// let mut reverb = FdnReverb8::new();
/// reverb.prepare(48000.0);
///
/// let input = [vec![1.0f32; 256], vec![0.0f32; 256]];
/// let mut output = [vec![0.0f32; 256], vec![0.0f32; 256]];
/// reverb.process(&input, &mut output, &ReverbParams::default());
///
/// assert!(output.iter().flatten().all(|s| s.abs() < 1.0));
/// ```
#[derive(Debug, Clone)]
pub struct FdnReverb<const N: usize> {
    lines: [Line; N],
    input_mix: Matrix<N>,
    feedback_mix: Matrix<N>,
    early: EarlyReflections,
    guard: DenormalGuard,
    /// Feedback written by the previous sample
    feedback: [f32; N],
    /// Shaped line outputs of the current sample
    taps: [f32; N],
    /// Gain applied to each channel's sum of late taps
    late_gain: f32,
    sample_rate: f32,
    /// Ratio the fixed-length buffers are currently scaled by
    scale_ratio: f32,
    prepared: bool,
    early_level: f32,
    slope: FilterSlope,
    /// (high-pass, low-pass) the filter coefficients were computed for
    filter_cache: Option<(f32, f32)>,
}

/// Four-line network.
pub type FdnReverb4 = FdnReverb<4>;
/// Eight-line network.
pub type FdnReverb8 = FdnReverb<8>;
/// Sixteen-line network.
pub type FdnReverb16 = FdnReverb<16>;

impl<const N: usize> Default for FdnReverb<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FdnReverb<N> {
    const VALID_SIZE: () = assert!(
        N.is_power_of_two() && N >= 2 && N <= MAX_LINES,
        "network size must be a power of two between 2 and 16"
    );

    /// Creates an unprepared engine with buffers sized for 44.1 kHz.
    pub fn new() -> Self {
        let () = Self::VALID_SIZE;

        Self {
            lines: core::array::from_fn(|i| Line::new(i, N, REFERENCE_RATE, FilterSlope::default())),
            input_mix: hadamard(),
            feedback_mix: householder(),
            early: EarlyReflections::new(REFERENCE_RATE),
            guard: DenormalGuard::default(),
            feedback: [0.0; N],
            taps: [0.0; N],
            late_gain: OUTPUT_GAIN / libm::sqrtf((N / 2) as f32),
            sample_rate: REFERENCE_RATE,
            scale_ratio: 1.0,
            prepared: false,
            early_level: DEFAULT_EARLY_LEVEL,
            slope: FilterSlope::default(),
            filter_cache: None,
        }
    }

    /// Uses `seed` for the denormal guard's noise, for bit-reproducible output.
    #[must_use]
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.guard = DenormalGuard::new(seed);
        self
    }

    /// Sizes every buffer for `sample_rate` and resets all state.
    ///
    /// Fixed-length buffers are rescaled from the 44.1 kHz tables, and only
    /// when the rate ratio moved by more than 1% since they were last built.
    /// Preparing at a rate, then another, then the first again, yields the
    /// original lengths.
    pub fn prepare(&mut self, sample_rate: f32) {
        let sample_rate = if sample_rate.is_finite() {
            sample_rate.clamp(SAMPLE_RATE_RANGE.0, SAMPLE_RATE_RANGE.1)
        } else {
            REFERENCE_RATE
        };

        let ratio = sample_rate / REFERENCE_RATE;
        let rebuild = (ratio - self.scale_ratio).abs() / self.scale_ratio > RESCALE_TOLERANCE;
        if rebuild {
            for (i, line) in self.lines.iter_mut().enumerate() {
                line.rebuild(i, N, ratio, sample_rate);
            }
            self.scale_ratio = ratio;
        }

        let predelay_capacity = (sample_rate * MAX_PREDELAY_SECONDS) as usize + 1;
        for line in &mut self.lines {
            if line.predelay.capacity() != predelay_capacity {
                line.predelay.resize(predelay_capacity);
            }
            line.modulated.set_sample_rate(sample_rate);
        }
        self.early.prepare(sample_rate);

        self.sample_rate = sample_rate;
        self.filter_cache = None;
        self.prepared = true;
        self.reset();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            sample_rate,
            ratio,
            rebuilt = rebuild,
            lines = N,
            "reverb prepared"
        );
    }

    /// Silences every buffer and filter without reallocating.
    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
        self.early.reset();
        self.guard.reset();
        self.feedback = [0.0; N];
        self.taps = [0.0; N];
    }

    /// Whether [`prepare`](Self::prepare) has been called.
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Sample rate of the last `prepare` (44.1 kHz before the first).
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Current delay-line lengths in samples.
    pub fn delay_lengths(&self) -> [usize; N] {
        core::array::from_fn(|i| self.lines[i].delay.len())
    }

    /// Current diffuser sizes per line: (static A, static B, modulated nominal).
    pub fn diffuser_sizes(&self) -> [(usize, usize, usize); N] {
        core::array::from_fn(|i| {
            let line = &self.lines[i];
            (
                line.diffuser_a.delay_samples(),
                line.diffuser_b.delay_samples(),
                line.modulated.nominal_size(),
            )
        })
    }

    /// The early-reflection simulator.
    pub fn early_reflections(&self) -> &EarlyReflections {
        &self.early
    }

    /// Sets the early-reflection blend weight, clamped to `[0, 1]`.
    pub fn set_early_level(&mut self, level: f32) {
        self.early_level = clamp_or(level, &(0.0..=1.0), DEFAULT_EARLY_LEVEL);
    }

    /// Early-reflection blend weight.
    pub fn early_level(&self) -> f32 {
        self.early_level
    }

    /// Selects the high-pass slope. Clears the high-pass state.
    pub fn set_highpass_slope(&mut self, slope: FilterSlope) {
        if slope == self.slope {
            return;
        }
        self.slope = slope;
        for line in &mut self.lines {
            line.highpass = Highpass::new(slope);
        }
        self.filter_cache = None;
    }

    /// Current high-pass slope.
    pub fn highpass_slope(&self) -> FilterSlope {
        self.slope
    }

    /// Renders the wet signal of one block.
    ///
    /// `input` and `output` are per-channel sample slices; their channel
    /// counts may differ. The first `min(input channels, N)` inputs feed the
    /// network, all inputs feed the early reflections, and every output
    /// channel receives its own round-robin subset of the lines. Output
    /// samples past the shortest channel are zeroed.
    pub fn process<I, O>(&mut self, input: &[I], output: &mut [O], params: &ReverbParams)
    where
        I: AsRef<[f32]>,
        O: AsMut<[f32]>,
    {
        if !self.prepared {
            for channel in output.iter_mut() {
                channel.as_mut().fill(0.0);
            }
            return;
        }

        let frames = input
            .iter()
            .map(|c| c.as_ref().len())
            .chain(output.iter_mut().map(|c| c.as_mut().len()))
            .min()
            .unwrap_or(0);
        let block = self.begin_block(params);
        let active = input.len().min(N);

        for n in 0..frames {
            let mut frame = [0.0; N];
            let mut mono = 0.0;
            for (ch, channel) in input.iter().enumerate() {
                let x = channel.as_ref()[n];
                mono += x;
                if ch < N {
                    frame[ch] = x;
                }
            }
            if !input.is_empty() {
                mono /= input.len() as f32;
            }

            let early = self.tick(mono, &frame, active, &block);
            for (ch, channel) in output.iter_mut().enumerate() {
                channel.as_mut()[n] = self.channel_sample(ch, early);
            }
        }

        for channel in output.iter_mut() {
            let channel = channel.as_mut();
            let len = channel.len();
            channel[frames.min(len)..].fill(0.0);
        }
    }

    /// Like [`process`](Self::process), replacing the dry block with the wet one.
    pub fn process_in_place<B: AsMut<[f32]>>(&mut self, buffer: &mut [B], params: &ReverbParams) {
        if !self.prepared {
            for channel in buffer.iter_mut() {
                channel.as_mut().fill(0.0);
            }
            return;
        }

        let frames = buffer
            .iter_mut()
            .map(|c| c.as_mut().len())
            .min()
            .unwrap_or(0);
        let block = self.begin_block(params);
        let channels = buffer.len();
        let active = channels.min(N);

        for n in 0..frames {
            let mut frame = [0.0; N];
            let mut mono = 0.0;
            for (ch, channel) in buffer.iter_mut().enumerate() {
                let x = channel.as_mut()[n];
                mono += x;
                if ch < N {
                    frame[ch] = x;
                }
            }
            if channels > 0 {
                mono /= channels as f32;
            }

            let early = self.tick(mono, &frame, active, &block);
            for (ch, channel) in buffer.iter_mut().enumerate() {
                channel.as_mut()[n] = self.channel_sample(ch, early);
            }
        }
    }

    /// Clamps the controls and refreshes filter coefficients if they moved.
    fn begin_block(&mut self, params: &ReverbParams) -> BlockParams {
        let defaults = ReverbParams::default();
        let highpass = if params.highpass_hz.is_nan() {
            defaults.highpass_hz
        } else {
            params.highpass_hz
        };
        let lowpass = if params.lowpass_hz.is_nan() {
            defaults.lowpass_hz
        } else {
            params.lowpass_hz
        };
        self.update_filters(highpass, lowpass);

        let decay = clamp_or(params.decay, &DECAY_RANGE, 0.0);
        let diffusion = clamp_or(params.diffusion, &DIFFUSION_RANGE, 0.0);
        let predelay_ms = if params.predelay_ms.is_nan() {
            0.0
        } else {
            params.predelay_ms.max(0.0)
        };

        BlockParams {
            predelay_samples: libm::roundf(ms_to_samples(predelay_ms, self.sample_rate)) as usize,
            decay,
            coeff_a: 0.4 + 0.1 * diffusion,
            coeff_b: 0.6 * diffusion,
            modulated_coeff: (diffusion > MODULATION_THRESHOLD)
                .then_some((diffusion - MODULATION_THRESHOLD) * 1.5),
        }
    }

    fn update_filters(&mut self, highpass: f32, lowpass: f32) {
        if self.filter_cache == Some((highpass, lowpass)) {
            return;
        }
        for (i, line) in self.lines.iter_mut().enumerate() {
            line.lowpass
                .set_lowpass(lowpass * lowpass_spread(i, N), BUTTERWORTH_Q, self.sample_rate);
            line.highpass.set_cutoff(highpass, self.sample_rate);
        }
        self.filter_cache = Some((highpass, lowpass));
    }

    /// Advances the network by one sample. Returns the weighted early reflections.
    #[inline]
    fn tick(&mut self, mono: f32, frame: &[f32; N], active: usize, block: &BlockParams) -> f32 {
        let early = self.early.process(mono) * self.early_level;

        let mut inputs = [0.0; N];
        for (i, line) in self.lines.iter_mut().enumerate().take(active) {
            let x = self.guard.apply(line.input_dc.process(frame[i]));
            inputs[i] = line.predelay.process(x, block.predelay_samples);
        }
        let mixed = self.input_mix.mul_vec(&inputs);

        let mut delayed = [0.0; N];
        for (i, line) in self.lines.iter_mut().enumerate() {
            // Odd lines take the inverted input
            let spread = if i & 1 == 1 { -mixed[i] } else { mixed[i] };
            let fed = spread + FEEDBACK_SCALE * self.feedback[i];
            delayed[i] = line.delay.process(line.lowpass.process(fed));
        }
        let recirculated = self.feedback_mix.mul_vec(&delayed);

        for (i, line) in self.lines.iter_mut().enumerate() {
            let mut s = line.dc.process(recirculated[i]);
            s = line.diffuser_a.process(s, block.coeff_a);
            s = line.diffuser_b.process(s, block.coeff_b);
            if let Some(coeff) = block.modulated_coeff {
                s = line.modulated.process(s, coeff);
            }
            s = line.highpass.process(s);

            let tap = soft_limit(s);
            self.taps[i] = tap;
            self.feedback[i] = self.guard.apply(tap * block.decay * line.decay_trim);
        }

        early
    }

    #[inline]
    fn channel_sample(&self, channel: usize, early: f32) -> f32 {
        let late: f32 = (0..N)
            .step_by(2)
            .map(|k| self.taps[(k + channel) % N])
            .sum();
        soft_limit(early + late * self.late_gain)
    }
}
