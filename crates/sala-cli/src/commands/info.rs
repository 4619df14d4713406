//! Tuning tables and WAV metadata.

use crate::config::NETWORK_SIZES;
use crate::wav::{WavFormat, read_wav_info};
use clap::Args;
use sala_reverb::FdnReverb;
use std::path::PathBuf;

/// Display the engine's tuning at a sample rate.
#[derive(Args)]
pub struct InfoArgs {
    /// WAV file whose metadata and sample rate to use
    pub file: Option<PathBuf>,

    /// Sample rate (ignored when FILE is given)
    #[arg(long, default_value = "44100")]
    pub sample_rate: u32,

    /// Number of delay lines (4, 8 or 16)
    #[arg(long, default_value = "8", value_name = "N")]
    pub size: usize,
}

/// Run the info command.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let mut sample_rate = args.sample_rate;

    if let Some(file) = &args.file {
        let info = read_wav_info(file)?;
        let format_str = match info.format {
            WavFormat::Pcm => "PCM",
            WavFormat::IeeeFloat => "IEEE Float",
        };

        println!("File:        {}", file.display());
        println!("Format:      {} {}-bit", format_str, info.bits_per_sample);
        println!("Channels:    {}", info.channels);
        println!("Sample Rate: {} Hz", info.sample_rate);
        println!(
            "Duration:    {:.3}s ({} frames)",
            info.duration_secs, info.num_frames
        );
        println!();
        sample_rate = info.sample_rate;
    }

    match args.size {
        4 => print_tuning::<4>(sample_rate),
        8 => print_tuning::<8>(sample_rate),
        16 => print_tuning::<16>(sample_rate),
        other => anyhow::bail!("network size {other} is not one of {NETWORK_SIZES:?}"),
    }
    Ok(())
}

fn print_tuning<const N: usize>(sample_rate: u32) {
    let mut reverb = FdnReverb::<N>::new();
    reverb.prepare(sample_rate as f32);
    let rate = reverb.sample_rate();

    println!("{}-line network at {} Hz\n", N, rate);
    println!("  Line   Delay   Diffuser A   Diffuser B   Modulated");
    println!("  ----   -----   ----------   ----------   ---------");
    for (i, (delay, (a, b, m))) in reverb
        .delay_lengths()
        .iter()
        .zip(reverb.diffuser_sizes())
        .enumerate()
    {
        println!(
            "  {:>4}   {:>5}   {:>10}   {:>10}   {:>9}   ({:.1} ms)",
            i,
            delay,
            a,
            b,
            m,
            *delay as f32 * 1000.0 / rate
        );
    }

    println!("\nEarly reflections:");
    for (delay, gain) in reverb.early_reflections().taps() {
        println!(
            "  {:>5} samples ({:>5.1} ms)  gain {:.2}",
            delay,
            *delay as f32 * 1000.0 / rate,
            gain
        );
    }
}
