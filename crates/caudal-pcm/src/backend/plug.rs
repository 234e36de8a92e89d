//! The plug backend: a conversion-capable wrapper skeleton.
//!
//! A plug stream owns its control table but routes the entire fast table to
//! its slave, so the data path pays no wrapper cost once parameters are
//! settled. Sample-rate and format conversion plugins would slot into the
//! control path here; with none configured, parameters pass straight
//! through.

use std::io;
use std::os::fd::BorrowedFd;

use caudal_core::{ChannelArea, State};

use crate::error::Result;
use crate::ops::{BackendKind, ChannelInfo, ControlOps, FastOps, Info, Status};
use crate::params::{HwParams, HwSetup, SwParams};
use crate::stream::Pcm;

/// Backend state for a plug stream.
pub struct PlugPcm {
    slave: Pcm,
}

impl PlugPcm {
    /// Wrap `slave` behind a plug stream.
    pub fn open(name: Option<&str>, slave: Pcm) -> Result<Pcm> {
        let direction = slave.direction();
        let mode = slave.mode();
        tracing::debug!(slave = %slave.kind(), "opened plug stream");
        let backend = PlugPcm { slave };
        Ok(Pcm::from_backend(
            BackendKind::Plug,
            name.map(str::to_owned),
            direction,
            mode,
            Box::new(backend),
        ))
    }
}

impl ControlOps for PlugPcm {
    fn close(&mut self) -> Result<()> {
        self.slave.shutdown()
    }

    fn nonblock(&mut self, enable: bool) -> Result<()> {
        self.slave.set_nonblock(enable)
    }

    fn set_async(&mut self, sig: i32, pid: i32) -> Result<()> {
        self.slave.set_async(sig, pid)
    }

    fn info(&self) -> Result<Info> {
        let mut info = self.slave.info()?;
        info.kind = BackendKind::Plug;
        Ok(info)
    }

    fn hw_refine(&self, params: &mut HwParams) -> Result<()> {
        self.slave.hw_refine(params)
    }

    fn hw_params(&mut self, params: &HwParams) -> Result<HwSetup> {
        // No conversion plugins configured: the slave's acceptance is ours.
        self.slave.hw_params(params)?;
        Ok(*self.slave.setup_ref())
    }

    fn sw_params(&mut self, params: &mut SwParams) -> Result<()> {
        self.slave.sw_params(params)
    }

    fn channel_info(&self, channel: u32) -> Result<ChannelInfo> {
        self.slave.channel_info(channel)
    }

    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()> {
        writeln!(w, "PLUG PCM")?;
        self.slave.dump(w)
    }

    fn mmap(&mut self) -> Result<()> {
        self.slave.mmap()
    }

    fn munmap(&mut self) -> Result<()> {
        self.slave.munmap()
    }

    fn card(&self) -> Option<u32> {
        self.slave.card()
    }

    fn poll_descriptor(&self) -> Option<BorrowedFd<'_>> {
        self.slave.poll_descriptor()
    }
}

impl FastOps for PlugPcm {
    fn status(&mut self) -> Result<Status> {
        self.slave.status()
    }

    fn state(&self) -> State {
        self.slave.state()
    }

    fn delay(&mut self) -> Result<i64> {
        self.slave.delay()
    }

    fn prepare(&mut self) -> Result<()> {
        self.slave.prepare()
    }

    fn reset(&mut self) -> Result<()> {
        self.slave.reset()
    }

    fn start(&mut self) -> Result<()> {
        self.slave.start()
    }

    fn stop(&mut self) -> Result<()> {
        self.slave.stop()
    }

    fn drain(&mut self) -> Result<()> {
        self.slave.drain()
    }

    fn pause(&mut self, enable: bool) -> Result<()> {
        self.slave.pause(enable)
    }

    fn rewind(&mut self, frames: usize) -> Result<usize> {
        self.slave.rewind(frames)
    }

    fn set_avail_min(&mut self, frames: usize) -> Result<()> {
        self.slave.set_avail_min(frames)
    }

    fn avail_update(&mut self) -> Result<usize> {
        self.slave.avail_update()
    }

    fn mmap_forward(&mut self, frames: usize) -> Result<usize> {
        self.slave.mmap_forward(frames)
    }

    fn hw_ptr(&self) -> Result<u64> {
        self.slave.hw_pointer()
    }

    fn transfer_write(
        &mut self,
        planes: &[&[u8]],
        areas: &[ChannelArea],
        offset: usize,
        frames: usize,
    ) -> Result<usize> {
        self.slave.backend.transfer_write(planes, areas, offset, frames)
    }

    fn transfer_read(
        &mut self,
        planes: &mut [&mut [u8]],
        areas: &[ChannelArea],
        offset: usize,
        frames: usize,
    ) -> Result<usize> {
        self.slave.backend.transfer_read(planes, areas, offset, frames)
    }
}
