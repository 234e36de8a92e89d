//! The availability-driven transfer engine.
//!
//! [`Pcm::write_areas`] and [`Pcm::read_areas`] drive all blocking I/O: an
//! availability/wait loop that hands contiguous sub-ranges to a
//! backend-supplied transfer function and applies the start-on-data policy.
//! The interleaved, non-interleaved, and vectored entry points synthesize
//! channel-area views over the caller's flat buffers and run the same loop.
//!
//! Return rule: if any frames moved, the partial count is returned and the
//! next call re-encounters the error; a terminal error with nothing moved is
//! returned as the error itself.

use caudal_core::{Access, ChannelArea, StartMode, State};

use crate::error::{Error, Result};
use crate::params::OpenMode;
use crate::stream::Pcm;

impl Pcm {
    /// Write `size` frames from the given channel-area view, starting
    /// `offset` frames in.
    ///
    /// `func` moves one contiguous sub-range into the backend and returns
    /// the frames actually moved. An implicit start (policy permitting)
    /// happens after the first successful chunk, so playback never starts an
    /// empty ring.
    pub fn write_areas<F>(
        &mut self,
        planes: &[&[u8]],
        areas: &[ChannelArea],
        offset: usize,
        size: usize,
        mut func: F,
    ) -> Result<usize>
    where
        F: FnMut(&mut Pcm, &[&[u8]], &[ChannelArea], usize, usize) -> Result<usize>,
    {
        assert!(size > 0, "zero-length transfer");
        let mut state = self.state();
        assert!(state >= State::Prepared, "stream is not prepared");
        let mut offset = offset;
        let mut xfer = 0;
        let mut fail = None;
        while xfer < size {
            if state == State::Xrun {
                fail = Some(Error::Xrun);
                break;
            }
            let avail = match self.avail_update() {
                Ok(avail) => avail,
                Err(e) => {
                    fail = Some(e);
                    break;
                }
            };
            if avail < self.policy_ref().avail_min {
                if state != State::Running {
                    fail = Some(Error::Xrun);
                    break;
                }
                if self.mode().contains(OpenMode::NONBLOCK) {
                    fail = Some(Error::WouldBlock);
                    break;
                }
                if let Err(e) = self.wait(-1) {
                    fail = Some(e);
                    break;
                }
                state = self.state();
                continue;
            }
            let frames = (size - xfer).min(avail);
            let moved = match func(self, planes, areas, offset, frames) {
                Ok(moved) => moved,
                Err(e) => {
                    fail = Some(e);
                    break;
                }
            };
            assert_eq!(moved, frames, "transfer function moved a short chunk");
            xfer += moved;
            offset += moved;
            if state == State::Prepared && self.policy_ref().start_mode != StartMode::Explicit {
                if let Err(e) = self.start() {
                    fail = Some(e);
                    break;
                }
                state = State::Running;
            }
        }
        if xfer > 0 {
            Ok(xfer)
        } else {
            Err(fail.expect("loop cannot end without progress or error"))
        }
    }

    /// Read `size` frames into the given channel-area view, starting
    /// `offset` frames in.
    ///
    /// Unlike the write loop, an implicit start happens *before* the loop so
    /// capture never drops its first chunk, and there is no explicit xrun
    /// test inside the loop: a short availability in a non-running state
    /// reports the broken pipe.
    pub fn read_areas<F>(
        &mut self,
        planes: &mut [&mut [u8]],
        areas: &[ChannelArea],
        offset: usize,
        size: usize,
        mut func: F,
    ) -> Result<usize>
    where
        F: FnMut(&mut Pcm, &mut [&mut [u8]], &[ChannelArea], usize, usize) -> Result<usize>,
    {
        assert!(size > 0, "zero-length transfer");
        let mut state = self.state();
        assert!(state >= State::Prepared, "stream is not prepared");
        if state == State::Prepared && self.policy_ref().start_mode != StartMode::Explicit {
            self.start()?;
            state = State::Running;
        }
        let mut offset = offset;
        let mut xfer = 0;
        let mut fail = None;
        while xfer < size {
            let avail = match self.avail_update() {
                Ok(avail) => avail,
                Err(e) => {
                    fail = Some(e);
                    break;
                }
            };
            if avail < self.policy_ref().avail_min {
                if state != State::Running {
                    fail = Some(Error::Xrun);
                    break;
                }
                if self.mode().contains(OpenMode::NONBLOCK) {
                    fail = Some(Error::WouldBlock);
                    break;
                }
                if let Err(e) = self.wait(-1) {
                    fail = Some(e);
                    break;
                }
                state = self.state();
                continue;
            }
            let frames = (size - xfer).min(avail);
            let moved = match func(self, &mut *planes, areas, offset, frames) {
                Ok(moved) => moved,
                Err(e) => {
                    fail = Some(e);
                    break;
                }
            };
            assert_eq!(moved, frames, "transfer function moved a short chunk");
            xfer += moved;
            offset += moved;
        }
        if xfer > 0 {
            Ok(xfer)
        } else {
            Err(fail.expect("loop cannot end without progress or error"))
        }
    }

    /// Write `frames` frames from one flat interleaved buffer.
    pub fn write_interleaved(&mut self, buf: &[u8], frames: usize) -> Result<usize> {
        assert!(self.setup().is_some(), "stream is not configured");
        self.assert_access(Access::RwInterleaved);
        assert!(
            self.frames_to_bytes(frames) <= buf.len(),
            "buffer shorter than the requested frame count"
        );
        let areas = self.areas_from_buf();
        let planes: [&[u8]; 1] = [buf];
        self.write_areas(&planes, &areas, 0, frames, |pcm, planes, areas, off, n| {
            pcm.backend.transfer_write(planes, areas, off, n)
        })
    }

    /// Read `frames` frames into one flat interleaved buffer.
    pub fn read_interleaved(&mut self, buf: &mut [u8], frames: usize) -> Result<usize> {
        assert!(self.setup().is_some(), "stream is not configured");
        self.assert_access(Access::RwInterleaved);
        assert!(
            self.frames_to_bytes(frames) <= buf.len(),
            "buffer shorter than the requested frame count"
        );
        let areas = self.areas_from_buf();
        let mut planes: [&mut [u8]; 1] = [buf];
        self.read_areas(
            &mut planes,
            &areas,
            0,
            frames,
            |pcm, planes, areas, off, n| pcm.backend.transfer_read(planes, areas, off, n),
        )
    }

    /// Write `frames` frames from per-channel buffers.
    pub fn write_noninterleaved(&mut self, bufs: &[&[u8]], frames: usize) -> Result<usize> {
        assert!(self.setup().is_some(), "stream is not configured");
        self.assert_access(Access::RwNoninterleaved);
        assert_eq!(
            bufs.len(),
            self.setup_ref().channels as usize,
            "one buffer per channel required"
        );
        let areas = self.areas_from_bufs(bufs.len());
        self.write_areas(bufs, &areas, 0, frames, |pcm, planes, areas, off, n| {
            pcm.backend.transfer_write(planes, areas, off, n)
        })
    }

    /// Read `frames` frames into per-channel buffers.
    pub fn read_noninterleaved(&mut self, bufs: &mut [&mut [u8]], frames: usize) -> Result<usize> {
        assert!(self.setup().is_some(), "stream is not configured");
        self.assert_access(Access::RwNoninterleaved);
        assert_eq!(
            bufs.len(),
            self.setup_ref().channels as usize,
            "one buffer per channel required"
        );
        let areas = self.areas_from_bufs(bufs.len());
        self.read_areas(bufs, &areas, 0, frames, |pcm, planes, areas, off, n| {
            pcm.backend.transfer_read(planes, areas, off, n)
        })
    }

    /// Vectored write: one equally-sized buffer per channel; the frame count
    /// follows from the first buffer's length.
    pub fn write_vectored(&mut self, bufs: &[&[u8]]) -> Result<usize> {
        assert!(self.setup().is_some(), "stream is not configured");
        let first_len = bufs.first().map_or(0, |b| b.len());
        assert!(
            bufs.iter().all(|b| b.len() == first_len),
            "vectored buffers must share one length"
        );
        let frames = self.bytes_to_samples(first_len);
        self.write_noninterleaved(bufs, frames)
    }

    /// Vectored read: one equally-sized buffer per channel; the frame count
    /// follows from the first buffer's length.
    pub fn read_vectored(&mut self, bufs: &mut [&mut [u8]]) -> Result<usize> {
        assert!(self.setup().is_some(), "stream is not configured");
        let first_len = bufs.first().map_or(0, |b| b.len());
        assert!(
            bufs.iter().all(|b| b.len() == first_len),
            "vectored buffers must share one length"
        );
        let frames = self.bytes_to_samples(first_len);
        self.read_noninterleaved(bufs, frames)
    }
}
