//! `caudal dump` - open a stream, negotiate defaults, and print its setup.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use caudal_core::{Access, Direction, Format};
use caudal_pcm::{HwParams, OpenMode, dump_status};
use caudal_registry::{BackendRegistry, open_with};
use clap::Args;

#[derive(Args)]
pub struct DumpArgs {
    /// Stream name (configured or literal)
    #[arg(default_value = "null")]
    pub name: String,

    /// Open the capture side instead of playback
    #[arg(long)]
    pub capture: bool,

    /// Sample format to propose
    #[arg(long, default_value = "S16_LE")]
    pub format: String,

    /// Channel count to propose
    #[arg(long, default_value_t = 2)]
    pub channels: u32,

    /// Rate to propose in Hz
    #[arg(long, default_value_t = 48000)]
    pub rate: u32,

    /// Configuration file with [pcm.*] and [pcmtype.*] tables
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: DumpArgs) -> anyhow::Result<()> {
    let direction = if args.capture {
        Direction::Capture
    } else {
        Direction::Playback
    };
    let format = Format::from_name(&args.format)
        .with_context(|| format!("unknown format '{}'", args.format))?;
    let config = super::load_config(args.config.as_ref())?;

    let registry = BackendRegistry::with_defaults();
    let mut pcm = open_with(&registry, &config, &args.name, direction, OpenMode::empty())
        .with_context(|| format!("opening '{}'", args.name))?;

    let params = HwParams::new(Access::RwInterleaved, format, args.channels, args.rate);
    pcm.hw_params(&params)
        .with_context(|| format!("negotiating hardware parameters for '{}'", args.name))?;

    let mut out = std::io::stdout().lock();
    pcm.dump(&mut out)?;
    pcm.dump_setup(&mut out)?;
    let status = pcm.status().context("reading status")?;
    writeln!(out)?;
    dump_status(&status, &mut out)?;

    pcm.close().context("closing stream")?;
    Ok(())
}
