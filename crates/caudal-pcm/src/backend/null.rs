//! The null backend: a discarding sink and silent source.
//!
//! Playback consumes frames instantly (the whole ring is always free);
//! capture delivers silence instantly. The state machine is fully local, so
//! the backend doubles as the bottom of every wrapper chain and as the
//! slave for literal `file:` streams. The poll descriptor is `/dev/null`,
//! which is always ready in both directions.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsFd, BorrowedFd};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use caudal_core::{ChannelArea, Direction, State, areas_silence};

use crate::error::{Error, Result};
use crate::ops::{BackendKind, ChannelInfo, ControlOps, FastOps, Info, Status};
use crate::params::{HwParams, HwSetup, OpenMode, SwParamMask, SwParams};
use crate::stream::Pcm;

fn now() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// Backend state for a null stream.
pub struct NullPcm {
    direction: Direction,
    state: State,
    setup: Option<HwSetup>,
    appl_ptr: u64,
    trigger_time: Duration,
    fd: File,
}

impl NullPcm {
    /// Open a null stream.
    pub fn open(name: Option<&str>, direction: Direction, mode: OpenMode) -> Result<Pcm> {
        let fd = OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/null")?;
        tracing::debug!(?direction, "opened null stream");
        let backend = NullPcm {
            direction,
            state: State::Open,
            setup: None,
            appl_ptr: 0,
            trigger_time: Duration::ZERO,
            fd,
        };
        Ok(Pcm::from_backend(
            BackendKind::Null,
            name.map(str::to_owned),
            direction,
            mode,
            Box::new(backend),
        ))
    }

    fn buffer_size(&self) -> usize {
        self.setup.map_or(0, |s| s.buffer_size())
    }
}

impl ControlOps for NullPcm {
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn nonblock(&mut self, _enable: bool) -> Result<()> {
        // Nothing ever blocks here.
        Ok(())
    }

    fn info(&self) -> Result<Info> {
        Ok(Info {
            kind: BackendKind::Null,
            direction: self.direction,
            id: Some("null".to_owned()),
            card: None,
            device: None,
            subdevice: None,
        })
    }

    fn hw_refine(&self, params: &mut HwParams) -> Result<()> {
        // Anything with a fixed-width format is acceptable as proposed.
        HwSetup::from_params(params).map(|_| ())
    }

    fn hw_params(&mut self, params: &HwParams) -> Result<HwSetup> {
        let setup = HwSetup::from_params(params)?;
        self.setup = Some(setup);
        self.state = State::Setup;
        self.appl_ptr = 0;
        Ok(setup)
    }

    fn sw_params(&mut self, params: &mut SwParams) -> Result<()> {
        let mut fail = SwParamMask::empty();
        if params.avail_min == 0 {
            fail |= SwParamMask::AVAIL_MIN;
        }
        if params.xfer_min == 0 {
            fail |= SwParamMask::XFER_MIN;
        }
        if params.xfer_align == 0 {
            fail |= SwParamMask::XFER_ALIGN;
        }
        if !fail.is_empty() {
            params.fail_mask = fail;
            return Err(Error::InvalidArgument("software parameters rejected"));
        }
        Ok(())
    }

    fn channel_info(&self, _channel: u32) -> Result<ChannelInfo> {
        Err(Error::NotSupported("channel mapping"))
    }

    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()> {
        writeln!(w, "NULL PCM")?;
        if let Some(setup) = &self.setup {
            crate::dump::write_hw_setup(w, self.direction, setup)?;
        }
        Ok(())
    }

    fn poll_descriptor(&self) -> Option<BorrowedFd<'_>> {
        Some(self.fd.as_fd())
    }
}

impl FastOps for NullPcm {
    fn status(&mut self) -> Result<Status> {
        Ok(Status {
            state: self.state,
            trigger_time: self.trigger_time,
            tstamp: now(),
            delay: 0,
            avail: self.buffer_size(),
            avail_max: self.buffer_size(),
        })
    }

    fn state(&self) -> State {
        self.state
    }

    fn delay(&mut self) -> Result<i64> {
        Ok(0)
    }

    fn prepare(&mut self) -> Result<()> {
        self.state = State::Prepared;
        self.appl_ptr = 0;
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.state = State::Prepared;
        self.appl_ptr = 0;
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        if self.state != State::Prepared {
            return Err(Error::NotReady("start requires a prepared stream"));
        }
        self.state = State::Running;
        self.trigger_time = now();
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.setup.is_none() {
            return Err(Error::NotReady("stream is not configured"));
        }
        self.state = State::Setup;
        self.trigger_time = now();
        Ok(())
    }

    fn drain(&mut self) -> Result<()> {
        // Frames are consumed the moment they arrive, so drain is stop.
        self.stop()
    }

    fn pause(&mut self, enable: bool) -> Result<()> {
        match (enable, self.state) {
            (true, State::Running) => {
                self.state = State::Paused;
                Ok(())
            }
            (false, State::Paused) => {
                self.state = State::Running;
                Ok(())
            }
            _ => Err(Error::NotReady("pause toggle does not match state")),
        }
    }

    fn rewind(&mut self, frames: usize) -> Result<usize> {
        let rewound = (frames as u64).min(self.appl_ptr);
        self.appl_ptr -= rewound;
        Ok(rewound as usize)
    }

    fn set_avail_min(&mut self, _frames: usize) -> Result<()> {
        Ok(())
    }

    fn avail_update(&mut self) -> Result<usize> {
        // Instant progress: the whole ring is free for playback and a full
        // ring of silence is ready for capture.
        Ok(self.buffer_size())
    }

    fn mmap_forward(&mut self, _frames: usize) -> Result<usize> {
        Err(Error::NotSupported("mmap"))
    }

    fn transfer_write(
        &mut self,
        _planes: &[&[u8]],
        _areas: &[ChannelArea],
        _offset: usize,
        frames: usize,
    ) -> Result<usize> {
        self.appl_ptr += frames as u64;
        Ok(frames)
    }

    fn transfer_read(
        &mut self,
        planes: &mut [&mut [u8]],
        areas: &[ChannelArea],
        offset: usize,
        frames: usize,
    ) -> Result<usize> {
        let format = self
            .setup
            .as_ref()
            .ok_or(Error::NotReady("stream is not configured"))?
            .format;
        areas_silence(planes, areas, offset, frames, format);
        self.appl_ptr += frames as u64;
        Ok(frames)
    }
}
