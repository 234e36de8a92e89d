//! PCM stream layer for the caudal framework.
//!
//! This crate provides:
//!
//! - **Stream handles**: [`Pcm`] with its two-table backend dispatch
//!   ([`ControlOps`] / [`FastOps`])
//! - **Parameter negotiation**: [`HwParams`] / [`HwSetup`] / [`SwParams`]
//!   with pinpointed failure masks
//! - **The transfer engine**: availability-driven blocking read/write with
//!   start-on-data, xrun surfacing, and short-I/O semantics
//! - **Built-in backends**: null, file capture, plug wrapper, and a
//!   deterministic mock for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use caudal_core::{Access, Direction, Format};
//! use caudal_pcm::{HwParams, NullPcm, OpenMode};
//!
//! let mut pcm = NullPcm::open(None, Direction::Playback, OpenMode::empty())?;
//! pcm.hw_params(&HwParams::new(Access::RwInterleaved, Format::S16Le, 2, 48000))?;
//! pcm.prepare()?;
//!
//! let silence = vec![0u8; 4096];
//! let frames = pcm.bytes_to_frames(silence.len());
//! pcm.write_interleaved(&silence, frames)?;
//! pcm.close()?;
//! # Ok::<(), caudal_pcm::Error>(())
//! ```

mod dump;
mod error;
mod ops;
mod params;
mod stream;
mod transfer;

pub mod backend;

pub use backend::{FileFormat, FilePcm, MockHandle, MockPcm, NullPcm, PlugPcm};
pub use dump::{dump_status, dump_sw_params_fail};
pub use error::{Error, Result};
pub use ops::{Backend, BackendKind, ChannelInfo, ControlOps, FastOps, Info, Status};
pub use params::{HwParams, HwSetup, OpenMode, SwParamMask, SwParams, SwPolicy};
pub use stream::Pcm;
