//! Impulse-response rendering command.

use super::common::{Reverb, ReverbArgs, render_blocks};
use crate::wav::{WavSpec, write_wav};
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct ImpulseArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    #[command(flatten)]
    reverb: ReverbArgs,

    /// Sample rate
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Length of the response in seconds
    #[arg(long, default_value = "3.0")]
    seconds: f32,

    /// Output channels (1 or 2)
    #[arg(long, default_value = "2", value_parser = clap::value_parser!(u16).range(1..=2))]
    channels: u16,

    /// Output bit depth (16, 24, or 32)
    #[arg(long)]
    bit_depth: Option<u16>,
}

pub fn run(args: ImpulseArgs) -> anyhow::Result<()> {
    let mut config = args.reverb.resolve()?;
    config.render.mix = 1.0;
    config.render.enabled = true;
    if let Some(v) = args.bit_depth {
        config.render.bit_depth = v;
    }
    config.validate()?;

    if !(args.seconds.is_finite() && args.seconds > 0.0) {
        anyhow::bail!("--seconds must be positive, got {}", args.seconds);
    }
    let sample_rate = args.sample_rate as f32;
    let frames = ((args.seconds * sample_rate).round() as usize).max(1);

    let mut channels = vec![vec![0.0f32; frames]; args.channels as usize];
    for channel in &mut channels {
        channel[0] = 1.0;
    }

    tracing::info!(
        lines = config.render.network_size,
        sample_rate = args.sample_rate,
        frames,
        params = ?config.reverb,
        "rendering impulse response"
    );
    let mut reverb = Reverb::from_config(&config, sample_rate, channels.len())?;
    render_blocks(&mut reverb, &mut channels, config.render.block_size);

    let spec = WavSpec {
        channels: args.channels,
        sample_rate: args.sample_rate,
        bits_per_sample: config.render.bit_depth,
    };
    write_wav(&args.output, &channels, spec)
        .with_context(|| format!("writing {}", args.output.display()))?;
    tracing::info!(path = %args.output.display(), "wrote impulse response");

    Ok(())
}
