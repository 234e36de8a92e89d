//! Deterministic scripted backend for exercising the transfer engine.
//!
//! The mock shares its state with the test through a [`MockHandle`], so a
//! test can script availability returns, inject an xrun after a given number
//! of transfers, reject software parameters, and inspect what the engine
//! actually transferred.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsFd, BorrowedFd};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use caudal_core::{ChannelArea, Direction, State, areas_copy};

use crate::error::{Error, Result};
use crate::ops::{BackendKind, ChannelInfo, ControlOps, FastOps, Info, Status};
use crate::params::{HwParams, HwSetup, OpenMode, SwParamMask, SwParams};
use crate::stream::Pcm;

/// Scripted state shared between a [`MockPcm`] and its test.
pub struct MockState {
    /// Current lifecycle state; tests may override it directly.
    pub state: State,
    /// Accepted setup, once `hw_params` ran.
    pub setup: Option<HwSetup>,
    /// Availability values consumed front-to-back by `avail_update`.
    pub avail_script: VecDeque<usize>,
    /// Availability reported once the script is exhausted.
    pub avail_default: usize,
    /// Frame counts of every transfer the engine performed.
    pub transfers: Vec<usize>,
    /// Interleaved wire bytes of everything written through the stream.
    pub written: Vec<u8>,
    /// Byte stamped into every frame delivered by `transfer_read`.
    pub read_fill: u8,
    /// Number of successful start calls.
    pub starts: usize,
    /// Switch the state to [`State::Xrun`] after this many transfers.
    pub xrun_after_transfers: Option<usize>,
    /// Software parameters the backend pretends to reject.
    pub reject_sw: SwParamMask,
    /// Frames acknowledged through `mmap_forward`.
    pub forwards: Vec<usize>,
    /// Scripted hardware position counter.
    pub hw_ptr: u64,
}

impl MockState {
    fn new() -> MockState {
        MockState {
            state: State::Open,
            setup: None,
            avail_script: VecDeque::new(),
            avail_default: usize::MAX,
            transfers: Vec::new(),
            written: Vec::new(),
            read_fill: 0,
            starts: 0,
            xrun_after_transfers: None,
            reject_sw: SwParamMask::empty(),
            forwards: Vec::new(),
            hw_ptr: 0,
        }
    }
}

/// Test-side handle to a mock backend's shared state.
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    /// Lock the shared state.
    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state poisoned")
    }
}

/// The mock backend proper.
pub struct MockPcm {
    direction: Direction,
    shared: Arc<Mutex<MockState>>,
    fd: File,
}

impl MockPcm {
    /// Open a mock stream, returning the handle its test scripts it with.
    pub fn open(direction: Direction, mode: OpenMode) -> Result<(Pcm, MockHandle)> {
        MockPcm::open_as(BackendKind::Mock, direction, mode)
    }

    /// Open a mock stream advertising another backend kind, so driver-less
    /// tests can stand in for an external transport.
    pub fn open_as(
        kind: BackendKind,
        direction: Direction,
        mode: OpenMode,
    ) -> Result<(Pcm, MockHandle)> {
        let fd = OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/null")?;
        let shared = Arc::new(Mutex::new(MockState::new()));
        let handle = MockHandle {
            state: Arc::clone(&shared),
        };
        let backend = MockPcm {
            direction,
            shared,
            fd,
        };
        let pcm = Pcm::from_backend(kind, None, direction, mode, Box::new(backend));
        Ok((pcm, handle))
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.shared.lock().expect("mock state poisoned")
    }
}

fn now() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

fn interleaved_areas(setup: &HwSetup) -> Vec<ChannelArea> {
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

impl ControlOps for MockPcm {
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn nonblock(&mut self, _enable: bool) -> Result<()> {
        Ok(())
    }

    fn info(&self) -> Result<Info> {
        Ok(Info {
            kind: BackendKind::Mock,
            direction: self.direction,
            id: None,
            card: None,
            device: None,
            subdevice: None,
        })
    }

    fn hw_refine(&self, params: &mut HwParams) -> Result<()> {
        HwSetup::from_params(params).map(|_| ())
    }

    fn hw_params(&mut self, params: &HwParams) -> Result<HwSetup> {
        let setup = HwSetup::from_params(params)?;
        let mut state = self.lock();
        state.setup = Some(setup);
        state.state = State::Setup;
        Ok(setup)
    }

    fn sw_params(&mut self, params: &mut SwParams) -> Result<()> {
        let state = self.lock();
        if !state.reject_sw.is_empty() {
            params.fail_mask = state.reject_sw;
            return Err(Error::InvalidArgument("software parameters rejected"));
        }
        Ok(())
    }

    fn channel_info(&self, channel: u32) -> Result<ChannelInfo> {
        let state = self.lock();
        let setup = state
            .setup
            .as_ref()
            .ok_or(Error::NotReady("stream is not configured"))?;
        Ok(ChannelInfo {
            channel,
            area: ChannelArea::new(
                0,
                channel as usize * setup.bits_per_sample as usize,
                setup.bits_per_frame as usize,
            ),
        })
    }

    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()> {
        writeln!(w, "MOCK PCM")
    }

    fn mmap(&mut self) -> Result<()> {
        Ok(())
    }

    fn munmap(&mut self) -> Result<()> {
        Ok(())
    }

    fn poll_descriptor(&self) -> Option<BorrowedFd<'_>> {
        Some(self.fd.as_fd())
    }
}

impl FastOps for MockPcm {
    fn status(&mut self) -> Result<Status> {
        let state = self.lock();
        Ok(Status {
            state: state.state,
            trigger_time: Duration::ZERO,
            tstamp: now(),
            delay: 0,
            avail: state.avail_default,
            avail_max: state.avail_default,
        })
    }

    fn state(&self) -> State {
        self.lock().state
    }

    fn delay(&mut self) -> Result<i64> {
        Ok(0)
    }

    fn prepare(&mut self) -> Result<()> {
        self.lock().state = State::Prepared;
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.lock().state = State::Prepared;
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        let mut state = self.lock();
        if state.state != State::Prepared {
            return Err(Error::NotReady("start requires a prepared stream"));
        }
        state.state = State::Running;
        state.starts += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.lock().state = State::Setup;
        Ok(())
    }

    fn drain(&mut self) -> Result<()> {
        self.lock().state = State::Setup;
        Ok(())
    }

    fn pause(&mut self, enable: bool) -> Result<()> {
        let mut state = self.lock();
        match (enable, state.state) {
            (true, State::Running) => {
                state.state = State::Paused;
                Ok(())
            }
            (false, State::Paused) => {
                state.state = State::Running;
                Ok(())
            }
            _ => Err(Error::NotReady("pause toggle does not match state")),
        }
    }

    fn rewind(&mut self, frames: usize) -> Result<usize> {
        Ok(frames)
    }

    fn set_avail_min(&mut self, _frames: usize) -> Result<()> {
        Ok(())
    }

    fn avail_update(&mut self) -> Result<usize> {
        let mut state = self.lock();
        let avail = state
            .avail_script
            .pop_front()
            .unwrap_or(state.avail_default);
        Ok(avail)
    }

    fn mmap_forward(&mut self, frames: usize) -> Result<usize> {
        let mut state = self.lock();
        state.forwards.push(frames);
        state.hw_ptr += frames as u64;
        Ok(frames)
    }

    fn hw_ptr(&self) -> Result<u64> {
        Ok(self.lock().hw_ptr)
    }

    fn transfer_write(
        &mut self,
        planes: &[&[u8]],
        areas: &[ChannelArea],
        offset: usize,
        frames: usize,
    ) -> Result<usize> {
        let mut state = self.lock();
        let setup = *state
            .setup
            .as_ref()
            .ok_or(Error::NotReady("stream is not configured"))?;
        let bytes = frames * setup.bits_per_frame as usize / 8;
        let mut scratch = vec![0u8; bytes];
        let dst_areas = interleaved_areas(&setup);
        {
            let mut dst_planes: [&mut [u8]; 1] = [&mut scratch];
            areas_copy(
                planes,
                areas,
                offset,
                &mut dst_planes,
                &dst_areas,
                0,
                frames,
                setup.format,
            );
        }
        state.written.extend_from_slice(&scratch);
        state.transfers.push(frames);
        if state.xrun_after_transfers == Some(state.transfers.len()) {
            state.state = State::Xrun;
        }
        Ok(frames)
    }

    fn transfer_read(
        &mut self,
        planes: &mut [&mut [u8]],
        areas: &[ChannelArea],
        offset: usize,
        frames: usize,
    ) -> Result<usize> {
        let mut state = self.lock();
        let setup = *state
            .setup
            .as_ref()
            .ok_or(Error::NotReady("stream is not configured"))?;
        let bytes = frames * setup.bits_per_frame as usize / 8;
        let scratch = vec![state.read_fill; bytes];
        let src_areas = interleaved_areas(&setup);
        let src_planes: [&[u8]; 1] = [&scratch];
        areas_copy(
            &src_planes,
            &src_areas,
            0,
            planes,
            areas,
            offset,
            frames,
            setup.format,
        );
        state.transfers.push(frames);
        if state.xrun_after_transfers == Some(state.transfers.len()) {
            state.state = State::Xrun;
        }
        Ok(frames)
    }
}
