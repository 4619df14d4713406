//! File-based reverb rendering command.

use super::common::{Reverb, ReverbArgs, peak, render_blocks, rms};
use crate::wav::{WavSpec, read_wav, write_wav};
use anyhow::Context;
use clap::Args;
use sala_core::linear_to_db;
use std::path::PathBuf;

#[derive(Args)]
pub struct RenderArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    #[command(flatten)]
    reverb: ReverbArgs,

    /// Dry/wet blend (0 = dry, 1 = wet)
    #[arg(long)]
    mix: Option<f32>,

    /// Seconds of silence appended to capture the tail
    #[arg(long)]
    tail: Option<f32>,

    /// Processing block size
    #[arg(long)]
    block_size: Option<usize>,

    /// Output bit depth (16, 24, or 32)
    #[arg(long)]
    bit_depth: Option<u16>,

    /// Copy the input through without reverb
    #[arg(long)]
    bypass: bool,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let mut config = args.reverb.resolve()?;
    let render = &mut config.render;
    if let Some(v) = args.mix {
        render.mix = v;
    }
    if let Some(v) = args.tail {
        render.tail_seconds = v;
    }
    if let Some(v) = args.block_size {
        render.block_size = v;
    }
    if let Some(v) = args.bit_depth {
        render.bit_depth = v;
    }
    if args.bypass {
        render.enabled = false;
    }
    config.validate()?;

    let (mut channels, spec) = read_wav(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let sample_rate = spec.sample_rate as f32;
    let input_frames = channels.first().map_or(0, Vec::len);
    tracing::info!(
        path = %args.input.display(),
        channels = channels.len(),
        sample_rate = spec.sample_rate,
        frames = input_frames,
        seconds = input_frames as f32 / sample_rate,
        "read input"
    );

    let input_rms = rms(&channels);
    let input_peak = peak(&channels);

    let tail_frames = (config.render.tail_seconds * sample_rate).round() as usize;
    for channel in &mut channels {
        channel.resize(input_frames + tail_frames, 0.0);
    }

    tracing::info!(
        lines = config.render.network_size,
        mix = config.render.mix,
        enabled = config.render.enabled,
        params = ?config.reverb,
        "rendering"
    );
    let mut reverb = Reverb::from_config(&config, sample_rate, channels.len())?;
    tracing::debug!(delays = ?reverb.delay_lengths(), "delay lines");
    render_blocks(&mut reverb, &mut channels, config.render.block_size);

    tracing::info!(
        input_rms_db = linear_to_db(input_rms),
        input_peak_db = linear_to_db(input_peak),
        output_rms_db = linear_to_db(rms(&channels)),
        output_peak_db = linear_to_db(peak(&channels)),
        "levels"
    );

    let out_spec = WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: config.render.bit_depth,
    };
    write_wav(&args.output, &channels, out_spec)
        .with_context(|| format!("writing {}", args.output.display()))?;
    tracing::info!(path = %args.output.display(), frames = input_frames + tail_frames, "wrote output");

    Ok(())
}
