//! Shared CLI helpers used across multiple commands.

use crate::config::RenderConfig;
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use sala_reverb::{FdnReverb, FilterSlope, ReverbProcessor};
use std::path::PathBuf;

/// High-pass slope for CLI
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CliSlope {
    /// One biquad section (12 dB/oct)
    #[value(name = "12")]
    Db12,
    /// Two cascaded sections (24 dB/oct)
    #[value(name = "24")]
    Db24,
}

impl From<CliSlope> for FilterSlope {
    fn from(s: CliSlope) -> Self {
        match s {
            CliSlope::Db12 => FilterSlope::Db12,
            CliSlope::Db24 => FilterSlope::Db24,
        }
    }
}

/// Reverb settings shared by `render` and `impulse`. Flags override the
/// config file, which overrides the defaults.
#[derive(Args, Debug, Default)]
pub struct ReverbArgs {
    /// Render configuration (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Predelay in milliseconds
    #[arg(long)]
    pub predelay: Option<f32>,

    /// Decay (feedback gain, 0..0.98)
    #[arg(long)]
    pub decay: Option<f32>,

    /// Diffusion (0..0.9)
    #[arg(long)]
    pub diffusion: Option<f32>,

    /// High-pass cutoff in Hz
    #[arg(long)]
    pub highpass: Option<f32>,

    /// Low-pass cutoff in Hz
    #[arg(long)]
    pub lowpass: Option<f32>,

    /// Early-reflection level (0..1)
    #[arg(long)]
    pub early_level: Option<f32>,

    /// High-pass slope in dB/oct
    #[arg(long, value_enum)]
    pub slope: Option<CliSlope>,

    /// Number of delay lines (4, 8 or 16)
    #[arg(long, value_name = "N")]
    pub size: Option<usize>,

    /// Seed of the denormal guard noise, for reproducible renders
    #[arg(long)]
    pub seed: Option<u32>,
}

impl ReverbArgs {
    /// Loads the config file (if any), applies the flags and validates.
    pub fn resolve(&self) -> anyhow::Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => RenderConfig::load(path)?,
            None => RenderConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;

        if let Some(clamped) = config.clamp_notice() {
            tracing::warn!(
                requested = ?config.reverb,
                effective = ?clamped,
                "reverb controls outside their ranges will be clamped"
            );
        }
        Ok(config)
    }

    fn apply(&self, config: &mut RenderConfig) {
        let reverb = &mut config.reverb;
        let render = &mut config.render;
        if let Some(v) = self.predelay {
            reverb.predelay_ms = v;
        }
        if let Some(v) = self.decay {
            reverb.decay = v;
        }
        if let Some(v) = self.diffusion {
            reverb.diffusion = v;
        }
        if let Some(v) = self.highpass {
            reverb.highpass_hz = v;
        }
        if let Some(v) = self.lowpass {
            reverb.lowpass_hz = v;
        }
        if let Some(v) = self.early_level {
            render.early_level = v;
        }
        if let Some(v) = self.slope {
            render.slope = v.into();
        }
        if let Some(v) = self.size {
            render.network_size = v;
        }
        if self.seed.is_some() {
            render.seed = self.seed;
        }
    }
}

/// A processor whose network size is chosen at run time.
pub enum Reverb {
    /// Four lines.
    Four(Box<ReverbProcessor<4>>),
    /// Eight lines.
    Eight(Box<ReverbProcessor<8>>),
    /// Sixteen lines.
    Sixteen(Box<ReverbProcessor<16>>),
}

macro_rules! dispatch {
    ($self:expr, $p:ident => $body:expr) => {
        match $self {
            Reverb::Four($p) => $body,
            Reverb::Eight($p) => $body,
            Reverb::Sixteen($p) => $body,
        }
    };
}

impl Reverb {
    /// Builds and prepares a processor from a validated config.
    pub fn from_config(
        config: &RenderConfig,
        sample_rate: f32,
        max_channels: usize,
    ) -> anyhow::Result<Self> {
        let mut reverb = match config.render.network_size {
            4 => Self::Four(Box::new(build(config))),
            8 => Self::Eight(Box::new(build(config))),
            16 => Self::Sixteen(Box::new(build(config))),
            other => anyhow::bail!("unsupported network size {other}"),
        };
        dispatch!(&mut reverb, p => p.prepare(sample_rate, config.render.block_size, max_channels));
        Ok(reverb)
    }

    /// Processes one block in place.
    pub fn process(&mut self, block: &mut [&mut [f32]]) {
        dispatch!(self, p => p.process(block));
    }

    /// Delay-line lengths at the prepared rate.
    pub fn delay_lengths(&self) -> Vec<usize> {
        dispatch!(self, p => p.engine().delay_lengths().to_vec())
    }
}

fn build<const N: usize>(config: &RenderConfig) -> ReverbProcessor<N> {
    let engine = match config.render.seed {
        Some(seed) => FdnReverb::new().with_seed(seed),
        None => FdnReverb::new(),
    };
    let mut processor = ReverbProcessor::with_engine(engine);
    processor.set_params(config.reverb);
    processor.set_mix(config.render.mix);
    processor.set_early_level(config.render.early_level);
    processor.set_highpass_slope(config.render.slope);
    processor.set_enabled(config.render.enabled);
    processor
}

/// Runs `reverb` over planar `channels` in `block_size` chunks, with a
/// progress bar on stderr.
pub fn render_blocks(reverb: &mut Reverb, channels: &mut [Vec<f32>], block_size: usize) {
    let frames = channels.first().map_or(0, Vec::len);
    let pb = progress_bar(frames as u64);

    let mut start = 0;
    while start < frames {
        let end = (start + block_size).min(frames);
        let mut block: Vec<&mut [f32]> = channels.iter_mut().map(|c| &mut c[start..end]).collect();
        reverb.process(&mut block);
        start = end;
        pb.set_position(start as u64);
    }

    pb.finish_and_clear();
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
    {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}

/// Peak absolute sample across all channels.
pub fn peak(channels: &[Vec<f32>]) -> f32 {
    channels
        .iter()
        .flatten()
        .map(|s| s.abs())
        .fold(0.0, f32::max)
}

/// RMS across all channels.
pub fn rms(channels: &[Vec<f32>]) -> f32 {
    let count: usize = channels.iter().map(Vec::len).sum();
    if count == 0 {
        return 0.0;
    }
    let sum: f32 = channels.iter().flatten().map(|s| s * s).sum();
    (sum / count as f32).sqrt()
}
