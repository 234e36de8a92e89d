//! `caudal play` - stream a WAV file into a named endpoint.

use std::path::PathBuf;

use anyhow::{Context, bail};
use caudal_core::{Access, Direction, Format};
use caudal_pcm::{HwParams, OpenMode};
use caudal_registry::{BackendRegistry, open_with};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Args)]
pub struct PlayArgs {
    /// WAV file to play (16-bit integer samples)
    pub file: PathBuf,

    /// Stream to play into (configured or literal)
    #[arg(long, default_value = "null")]
    pub device: String,

    /// Frames per write chunk
    #[arg(long, default_value_t = 1024)]
    pub chunk: usize,

    /// Configuration file with [pcm.*] and [pcmtype.*] tables
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let mut reader = hound::WavReader::open(&args.file)
        .with_context(|| format!("opening {}", args.file.display()))?;
    let spec = reader.spec();
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        bail!("only 16-bit integer WAV files are supported");
    }

    let samples: Vec<i16> = reader
        .samples::<i16>()
        .collect::<Result<_, _>>()
        .context("decoding samples")?;
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    let total_frames = samples.len() / spec.channels as usize;
    tracing::debug!(
        frames = total_frames,
        channels = spec.channels,
        rate = spec.sample_rate,
        "loaded wav file"
    );

    let config = super::load_config(args.config.as_ref())?;
    let registry = BackendRegistry::with_defaults();
    let mut pcm = open_with(
        &registry,
        &config,
        &args.device,
        Direction::Playback,
        OpenMode::empty(),
    )
    .with_context(|| format!("opening '{}'", args.device))?;

    let params = HwParams::new(
        Access::RwInterleaved,
        Format::S16Le,
        u32::from(spec.channels),
        spec.sample_rate,
    );
    pcm.hw_params(&params).context("negotiating parameters")?;
    pcm.prepare().context("preparing stream")?;

    let bar = ProgressBar::new(total_frames as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} frames ({eta})")
            .expect("valid progress template"),
    );

    let frame_bytes = pcm.frames_to_bytes(1);
    let mut written = 0usize;
    while written < total_frames {
        let frames = args.chunk.min(total_frames - written);
        let start = written * frame_bytes;
        let end = start + frames * frame_bytes;
        let moved = pcm
            .write_interleaved(&bytes[start..end], frames)
            .context("writing frames")?;
        written += moved;
        bar.set_position(written as u64);
    }
    bar.finish();

    pcm.drain().context("draining stream")?;
    pcm.close().context("closing stream")?;
    println!("played {} frames from {}", written, args.file.display());
    Ok(())
}
