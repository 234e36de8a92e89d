//! The two backend dispatch tables.
//!
//! Every stream binds one backend object exposing two capability surfaces: a
//! slow [`ControlOps`] table for lifecycle and negotiation, and a
//! [`FastOps`] table for the data path. Keeping the surfaces separate lets a
//! wrapping backend (plug, file) forward the fast path straight to its inner
//! stream while intercepting control calls.

use std::io;
use std::os::fd::BorrowedFd;
use std::time::Duration;

use caudal_core::{ChannelArea, Direction, State};

use crate::error::{Error, Result};
use crate::params::{HwParams, HwSetup, SwParams};

/// Backend kind a stream was opened as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Direct hardware transport.
    Hw,
    /// Conversion wrapper over another stream.
    Plug,
    /// Shared-memory client.
    Shm,
    /// File capture wrapper over another stream.
    File,
    /// Discarding sink / silent source.
    Null,
    /// Deterministic scripted backend for tests.
    Mock,
}

impl BackendKind {
    /// Every backend kind, in code order.
    pub const ALL: [BackendKind; 6] = [
        BackendKind::Hw,
        BackendKind::Plug,
        BackendKind::Shm,
        BackendKind::File,
        BackendKind::Null,
        BackendKind::Mock,
    ];

    /// Short name.
    pub const fn name(self) -> &'static str {
        match self {
            BackendKind::Hw => "HW",
            BackendKind::Plug => "PLUG",
            BackendKind::Shm => "SHM",
            BackendKind::File => "FILE",
            BackendKind::Null => "NULL",
            BackendKind::Mock => "MOCK",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity and binding of a stream.
///
/// Valid any time after open; fields a backend cannot fill before hardware
/// parameters are negotiated stay `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Info {
    /// Backend kind.
    pub kind: BackendKind,
    /// Stream direction.
    pub direction: Direction,
    /// Backend-reported identifier, if any.
    pub id: Option<String>,
    /// Card index for hardware-bound streams.
    pub card: Option<u32>,
    /// Device index for hardware-bound streams.
    pub device: Option<u32>,
    /// Subdevice index for hardware-bound streams.
    pub subdevice: Option<u32>,
}

/// Placement of one channel inside the mapped ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelInfo {
    /// Channel index.
    pub channel: u32,
    /// Area descriptor within the backend's plane set.
    pub area: ChannelArea,
}

/// Snapshot of the stream's driver-side accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    /// Lifecycle state at snapshot time.
    pub state: State,
    /// Time of the last trigger (start/stop), since the epoch.
    pub trigger_time: Duration,
    /// Snapshot timestamp, since the epoch.
    pub tstamp: Duration,
    /// Frames of delay between the application and the transducer.
    pub delay: i64,
    /// Frames currently available for transfer.
    pub avail: usize,
    /// High-water mark of available frames since the last status read.
    pub avail_max: usize,
}

/// Slow control surface of a backend.
pub trait ControlOps {
    /// Release backend resources. Called exactly once by the facade.
    fn close(&mut self) -> Result<()>;

    /// Switch the backend between blocking and non-blocking transfers.
    fn nonblock(&mut self, enable: bool) -> Result<()>;

    /// Request signal-driven notification.
    fn set_async(&mut self, _sig: i32, _pid: i32) -> Result<()> {
        Err(Error::NotSupported("async notification"))
    }

    /// Identity of the stream.
    fn info(&self) -> Result<Info>;

    /// Adjust a parameter proposal toward something the backend accepts,
    /// without binding it.
    fn hw_refine(&self, params: &mut HwParams) -> Result<()>;

    /// Accept hardware parameters and return the resulting setup.
    fn hw_params(&mut self, params: &HwParams) -> Result<HwSetup>;

    /// Negotiate software parameters. On failure the backend marks the
    /// offending fields in `params.fail_mask`.
    fn sw_params(&mut self, params: &mut SwParams) -> Result<()>;

    /// Placement of one channel inside the mapped ring.
    fn channel_info(&self, channel: u32) -> Result<ChannelInfo>;

    /// Write a human-readable description of the backend chain.
    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()>;

    /// Establish the memory mapping.
    fn mmap(&mut self) -> Result<()> {
        Err(Error::NotSupported("mmap"))
    }

    /// Tear down the memory mapping.
    fn munmap(&mut self) -> Result<()> {
        Err(Error::NotSupported("mmap"))
    }

    /// Card index, for hardware-bound backends.
    fn card(&self) -> Option<u32> {
        None
    }

    /// The descriptor the transfer engine polls on.
    fn poll_descriptor(&self) -> Option<BorrowedFd<'_>>;

    /// Wire this stream to another one for synchronized start/stop, using
    /// the other stream's link descriptor.
    fn link(&mut self, _other: BorrowedFd<'_>) -> Result<()> {
        Err(Error::NotSupported("link"))
    }

    /// Detach this stream from its link group.
    fn unlink(&mut self) -> Result<()> {
        Err(Error::NotSupported("link"))
    }
}

/// Fast data-path surface of a backend.
pub trait FastOps {
    /// Full accounting snapshot.
    fn status(&mut self) -> Result<Status>;

    /// Current lifecycle state.
    fn state(&self) -> State;

    /// Frames of delay between the application and the transducer.
    fn delay(&mut self) -> Result<i64>;

    /// Make the stream ready to start.
    fn prepare(&mut self) -> Result<()>;

    /// Reset ring pointers, returning to the prepared state.
    fn reset(&mut self) -> Result<()>;

    /// Start the transfer clock.
    fn start(&mut self) -> Result<()>;

    /// Stop immediately, dropping pending frames.
    fn stop(&mut self) -> Result<()>;

    /// Stop after pending frames have played out.
    fn drain(&mut self) -> Result<()>;

    /// Pause or resume a running stream.
    fn pause(&mut self, enable: bool) -> Result<()>;

    /// Move the application pointer backwards by up to `frames`, returning
    /// the distance actually rewound.
    fn rewind(&mut self, frames: usize) -> Result<usize>;

    /// Update the availability threshold.
    fn set_avail_min(&mut self, frames: usize) -> Result<()>;

    /// Refresh and return the number of frames available for transfer.
    fn avail_update(&mut self) -> Result<usize>;

    /// Advance the application pointer over frames the caller filled or
    /// consumed directly in the mapping.
    fn mmap_forward(&mut self, frames: usize) -> Result<usize>;

    /// Hardware position counter for mapped streams.
    fn hw_ptr(&self) -> Result<u64> {
        Err(Error::NotSupported("mmap position"))
    }

    /// Move `frames` frames out of the caller's areas into the backend.
    /// Returns the frames actually moved.
    fn transfer_write(
        &mut self,
        planes: &[&[u8]],
        areas: &[ChannelArea],
        offset: usize,
        frames: usize,
    ) -> Result<usize>;

    /// Move `frames` frames out of the backend into the caller's areas.
    /// Returns the frames actually moved.
    fn transfer_read(
        &mut self,
        planes: &mut [&mut [u8]],
        areas: &[ChannelArea],
        offset: usize,
        frames: usize,
    ) -> Result<usize>;
}

/// Full backend contract: both dispatch tables on one object.
pub trait Backend: ControlOps + FastOps + Send {}

impl<T: ControlOps + FastOps + Send> Backend for T {}
