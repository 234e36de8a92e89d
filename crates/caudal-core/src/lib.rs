//! Caudal Core - PCM primitives for audio streaming
//!
//! This crate provides the foundational building blocks shared by every caudal
//! stream backend: sample-format metadata, the enumeration vocabulary of the
//! stream lifecycle, and the strided channel-area kernels that move or silence
//! audio without interpreting it.
//!
//! # Core Abstractions
//!
//! ## Formats
//!
//! - [`Format`] - Sample format codes with physical width and silence patterns
//! - [`Subformat`] - Sub-format qualifier (standard only)
//!
//! ## Stream Vocabulary
//!
//! - [`Direction`] - Playback or capture
//! - [`State`] - Stream lifecycle states, ordered like the lifecycle itself
//! - [`Access`] - Buffer layout negotiation (mmap/rw x interleaved/non-interleaved)
//! - [`StartMode`], [`ReadyMode`], [`XrunMode`] - Software transfer policy
//! - [`HwParam`], [`SwParam`] - Parameter identifiers for diagnostics
//!
//! ## Channel Areas
//!
//! - [`Layout`] / [`ChannelArea`] - Bit-strided descriptors of channel storage
//! - [`area_silence`] / [`area_copy`] - Single-channel kernels
//! - [`areas_silence`] / [`areas_copy`] - Multi-channel kernels with
//!   adjacency collapse for fully-interleaved buffers
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! caudal-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod area;
pub mod enums;
pub mod format;

pub use area::{ChannelArea, Layout, area_copy, area_silence, areas_copy, areas_silence};
pub use enums::{
    Access, Direction, HwParam, ReadyMode, StartMode, State, Subformat, SwParam, XrunMode,
};
pub use format::Format;
