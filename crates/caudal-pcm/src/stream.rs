//! The stream handle and its dispatch facade.
//!
//! [`Pcm`] owns one boxed backend and routes every operation through the
//! backend's control or fast table. The facade asserts call preconditions
//! (setup negotiated, matching access mode), caches accepted parameters so
//! transfer decisions need no backend round-trip, and guarantees that close
//! releases every owned resource on every exit path.

use std::io;
use std::os::fd::BorrowedFd;

use nix::poll::{PollFd, PollFlags, PollTimeout, poll};

use caudal_core::{Access, ChannelArea, Direction, State};

use crate::error::{Error, Result};
use crate::ops::{Backend, BackendKind, ChannelInfo, Info, Status};
use crate::params::{HwParams, HwSetup, OpenMode, SwParams, SwPolicy};

/// A PCM stream handle.
///
/// Created by a backend factory (usually through the opener); destroyed by
/// [`Pcm::close`] or drop. One handle is meant to be driven from one logical
/// thread at a time; the only suspension point is the poll wait inside the
/// blocking transfer loop.
pub struct Pcm {
    pub(crate) name: Option<String>,
    pub(crate) kind: BackendKind,
    pub(crate) direction: Direction,
    pub(crate) mode: OpenMode,
    pub(crate) setup: Option<HwSetup>,
    pub(crate) policy: Option<SwPolicy>,
    pub(crate) mapped: bool,
    pub(crate) closed: bool,
    pub(crate) backend: Box<dyn Backend>,
}

impl Pcm {
    /// Bind a fully-initialized backend into a stream handle.
    ///
    /// Backend factories call this once both op tables are ready and the
    /// poll descriptor is populated.
    pub fn from_backend(
        kind: BackendKind,
        name: Option<String>,
        direction: Direction,
        mode: OpenMode,
        backend: Box<dyn Backend>,
    ) -> Pcm {
        Pcm {
            name,
            kind,
            direction,
            mode,
            setup: None,
            policy: None,
            mapped: false,
            closed: false,
            backend,
        }
    }

    /// Backend kind.
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Stream direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Human-readable stream name, if one was given at open.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Current open-mode bits.
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Accepted hardware setup, once negotiated.
    pub fn setup(&self) -> Option<&HwSetup> {
        self.setup.as_ref()
    }

    /// Cached software policy, once hardware parameters are accepted.
    pub fn sw_policy(&self) -> Option<&SwPolicy> {
        self.policy.as_ref()
    }

    pub(crate) fn setup_ref(&self) -> &HwSetup {
        self.setup.as_ref().expect("stream is not configured")
    }

    pub(crate) fn policy_ref(&self) -> &SwPolicy {
        self.policy.as_ref().expect("stream is not configured")
    }

    /// Release the stream, draining pending frames in blocking mode and
    /// dropping them in non-blocking mode, then unmapping and closing the
    /// backend.
    ///
    /// Every owned resource is released even when a sub-operation fails; the
    /// first failure is returned.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    pub(crate) fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let mut first_err = None;
        if self.setup.is_some() {
            let res = if self.mode.contains(OpenMode::NONBLOCK) {
                self.backend.stop()
            } else {
                self.backend.drain()
            };
            if let Err(e) = res {
                first_err.get_or_insert(e);
            }
        }
        if self.mapped {
            if let Err(e) = self.backend.munmap() {
                first_err.get_or_insert(e);
            }
            self.mapped = false;
        }
        if let Err(e) = self.backend.close() {
            first_err.get_or_insert(e);
        }
        self.setup = None;
        self.policy = None;
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Switch between blocking and non-blocking data transfers. The mode bit
    /// is mirrored only after the backend accepts.
    pub fn set_nonblock(&mut self, enable: bool) -> Result<()> {
        self.backend.nonblock(enable)?;
        self.mode.set(OpenMode::NONBLOCK, enable);
        Ok(())
    }

    /// Request signal-driven notification from the backend.
    pub fn set_async(&mut self, sig: i32, pid: i32) -> Result<()> {
        self.backend.set_async(sig, pid)
    }

    /// Stream identity.
    ///
    /// Valid any time after open; before `hw_params` a backend may leave
    /// fields it cannot know yet unset.
    pub fn info(&self) -> Result<Info> {
        self.backend.info()
    }

    /// Adjust a parameter proposal toward something acceptable without
    /// binding it.
    pub fn hw_refine(&self, params: &mut HwParams) -> Result<()> {
        self.backend.hw_refine(params)
    }

    /// Negotiate hardware parameters. On success the accepted setup and a
    /// default software policy are cached on the handle.
    pub fn hw_params(&mut self, params: &HwParams) -> Result<()> {
        let setup = self.backend.hw_params(params)?;
        self.policy = Some(SwPolicy::defaults_for(&setup));
        self.setup = Some(setup);
        Ok(())
    }

    /// Negotiate software parameters. Accepted values are cached so
    /// subsequent start-on-data and availability decisions need no backend
    /// call; on failure `params.fail_mask` names the rejected fields.
    pub fn sw_params(&mut self, params: &mut SwParams) -> Result<()> {
        assert!(self.setup.is_some(), "stream is not configured");
        self.backend.sw_params(params)?;
        self.policy = Some(SwPolicy {
            start_mode: params.start_mode,
            ready_mode: params.ready_mode,
            xrun_mode: params.xrun_mode,
            avail_min: params.avail_min,
            xfer_min: params.xfer_min,
            xfer_align: params.xfer_align,
            time: params.time,
            boundary: params.boundary,
        });
        Ok(())
    }

    /// Placement of one channel inside the mapped ring.
    pub fn channel_info(&self, channel: u32) -> Result<ChannelInfo> {
        assert!(self.setup.is_some(), "stream is not configured");
        self.backend.channel_info(channel)
    }

    /// Full accounting snapshot.
    pub fn status(&mut self) -> Result<Status> {
        self.backend.status()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.backend.state()
    }

    /// Frames of delay between the application and the transducer.
    pub fn delay(&mut self) -> Result<i64> {
        assert!(self.setup.is_some(), "stream is not configured");
        self.backend.delay()
    }

    /// Make the stream ready to start.
    pub fn prepare(&mut self) -> Result<()> {
        assert!(self.setup.is_some(), "stream is not configured");
        self.backend.prepare()
    }

    /// Reset ring pointers, returning to the prepared state.
    pub fn reset(&mut self) -> Result<()> {
        assert!(self.setup.is_some(), "stream is not configured");
        self.backend.reset()
    }

    /// Start the transfer clock explicitly.
    pub fn start(&mut self) -> Result<()> {
        assert!(self.setup.is_some(), "stream is not configured");
        self.backend.start()
    }

    /// Stop immediately, dropping pending frames.
    pub fn stop(&mut self) -> Result<()> {
        assert!(self.setup.is_some(), "stream is not configured");
        self.backend.stop()
    }

    /// Stop after pending frames have played out. Blocks on blocking
    /// streams.
    pub fn drain(&mut self) -> Result<()> {
        assert!(self.setup.is_some(), "stream is not configured");
        self.backend.drain()
    }

    /// Pause or resume a running stream.
    pub fn pause(&mut self, enable: bool) -> Result<()> {
        assert!(self.setup.is_some(), "stream is not configured");
        self.backend.pause(enable)
    }

    /// Move the application pointer backwards by up to `frames`.
    pub fn rewind(&mut self, frames: usize) -> Result<usize> {
        assert!(self.setup.is_some(), "stream is not configured");
        assert!(frames > 0, "zero-length rewind");
        self.backend.rewind(frames)
    }

    /// Update the availability threshold; the accepted value is cached.
    pub fn set_avail_min(&mut self, frames: usize) -> Result<()> {
        assert!(self.setup.is_some(), "stream is not configured");
        assert!(frames > 0, "zero availability threshold");
        self.backend.set_avail_min(frames)?;
        if let Some(policy) = self.policy.as_mut() {
            policy.avail_min = frames;
        }
        Ok(())
    }

    /// Refresh and return the number of frames available for transfer.
    pub fn avail_update(&mut self) -> Result<usize> {
        self.backend.avail_update()
    }

    /// Advance the application pointer over frames handled directly in the
    /// mapping.
    pub fn mmap_forward(&mut self, frames: usize) -> Result<usize> {
        assert!(frames > 0, "zero-length forward");
        self.backend.mmap_forward(frames)
    }

    /// Hardware position counter for mapped streams.
    pub fn hw_pointer(&self) -> Result<u64> {
        self.backend.hw_ptr()
    }

    /// Establish the memory mapping.
    pub fn mmap(&mut self) -> Result<()> {
        assert!(self.setup.is_some(), "stream is not configured");
        self.backend.mmap()?;
        self.mapped = true;
        Ok(())
    }

    /// Tear down the memory mapping.
    pub fn munmap(&mut self) -> Result<()> {
        self.backend.munmap()?;
        self.mapped = false;
        Ok(())
    }

    /// Card index for hardware-bound streams.
    pub fn card(&self) -> Option<u32> {
        self.backend.card()
    }

    /// The descriptor the transfer engine polls on.
    pub fn poll_descriptor(&self) -> Option<BorrowedFd<'_>> {
        self.backend.poll_descriptor()
    }

    /// Wait until the stream is ready for transfer: write-ready for
    /// playback, read-ready for capture.
    ///
    /// `timeout_ms` bounds the wait in milliseconds; negative waits forever.
    /// Returns without distinguishing readiness from timeout, matching the
    /// poll contract the transfer loop relies on.
    pub fn wait(&mut self, timeout_ms: i32) -> Result<()> {
        let events = match self.direction {
            Direction::Playback => PollFlags::POLLOUT,
            Direction::Capture => PollFlags::POLLIN,
        };
        let timeout = if timeout_ms < 0 {
            PollTimeout::NONE
        } else {
            PollTimeout::try_from(timeout_ms).unwrap_or(PollTimeout::MAX)
        };
        let fd = self
            .backend
            .poll_descriptor()
            .ok_or(Error::NotSupported("poll descriptor"))?;
        let mut fds = [PollFd::new(fd, events)];
        poll(&mut fds, timeout)
            .map_err(|errno| Error::System(io::Error::from_raw_os_error(errno as i32)))?;
        Ok(())
    }

    /// Wire two streams into synchronized start/stop through the driver-side
    /// link mechanism. Backends without one fail with
    /// [`Error::NotSupported`].
    pub fn link(&mut self, other: &Pcm) -> Result<()> {
        let other_fd = other
            .poll_descriptor()
            .ok_or(Error::NotSupported("link descriptor"))?;
        self.backend.link(other_fd)
    }

    /// Detach this stream from its link group.
    pub fn unlink(&mut self) -> Result<()> {
        self.backend.unlink()
    }

    /// Convert a byte count to frames. Requires a negotiated setup.
    pub fn bytes_to_frames(&self, bytes: usize) -> usize {
        bytes * 8 / self.setup_ref().bits_per_frame as usize
    }

    /// Convert a frame count to bytes. Requires a negotiated setup.
    pub fn frames_to_bytes(&self, frames: usize) -> usize {
        frames * self.setup_ref().bits_per_frame as usize / 8
    }

    /// Convert a byte count to samples. Requires a negotiated setup.
    pub fn bytes_to_samples(&self, bytes: usize) -> usize {
        bytes * 8 / self.setup_ref().bits_per_sample as usize
    }

    /// Convert a sample count to bytes. Requires a negotiated setup.
    pub fn samples_to_bytes(&self, samples: usize) -> usize {
        samples * self.setup_ref().bits_per_sample as usize / 8
    }

    /// Channel areas describing one flat interleaved buffer: every channel
    /// shares plane 0, offset by one sample width, strided by the frame
    /// width.
    pub(crate) fn areas_from_buf(&self) -> Vec<ChannelArea> {
        let setup = self.setup_ref();
        (0..setup.channels as usize)
            .map(|ch| {
                ChannelArea::new(
                    0,
                    ch * setup.bits_per_sample as usize,
                    setup.bits_per_frame as usize,
                )
            })
            .collect()
    }

    /// Channel areas describing one plane per channel, each contiguous.
    pub(crate) fn areas_from_bufs(&self, count: usize) -> Vec<ChannelArea> {
        let setup = self.setup_ref();
        (0..count)
            .map(|ch| ChannelArea::new(ch, 0, setup.bits_per_sample as usize))
            .collect()
    }

    pub(crate) fn assert_access(&self, access: Access) {
        assert_eq!(
            self.setup_ref().access,
            access,
            "stream access mode does not match the entry point"
        );
    }
}

impl Drop for Pcm {
    fn drop(&mut self) {
        // Best-effort shutdown for handles never explicitly closed.
        let _ = self.shutdown();
    }
}

impl std::fmt::Debug for Pcm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pcm")
            .field("kind", &self.kind)
            .field("direction", &self.direction)
            .field("name", &self.name)
            .field("setup", &self.setup.is_some())
            .finish_non_exhaustive()
    }
}
