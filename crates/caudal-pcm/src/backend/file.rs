//! The file backend: captures the frames passing through a slave stream.
//!
//! Every frame written to (or read from) the wrapped slave is linearized
//! into an interleaved scratch buffer via the channel-area copy kernel and
//! appended to a file. `raw` mode writes the bytes as they are on the wire;
//! `wav` mode wraps them in a RIFF container and is restricted to `S16_LE`
//! streams.
//!
//! The control table belongs to the wrapper; data-path calls run the slave's
//! own transfer machinery, so a `file:` stream behaves exactly like its
//! slave with a tap attached.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::os::fd::BorrowedFd;
use std::path::{Path, PathBuf};

use caudal_core::{ChannelArea, Format, StartMode, State, areas_copy};

use crate::error::{Error, Result};
use crate::ops::{BackendKind, ChannelInfo, ControlOps, FastOps, Info, Status};
use crate::params::{HwParams, HwSetup, SwParams};
use crate::stream::Pcm;

/// On-disk encoding of the captured frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Wire bytes, no container.
    Raw,
    /// RIFF/WAVE container; S16_LE streams only.
    Wav,
}

impl FileFormat {
    /// Parse a format name, case-insensitively.
    pub fn from_name(name: &str) -> Option<FileFormat> {
        if name.eq_ignore_ascii_case("raw") {
            Some(FileFormat::Raw)
        } else if name.eq_ignore_ascii_case("wav") {
            Some(FileFormat::Wav)
        } else {
            None
        }
    }

    /// Short name.
    pub const fn name(self) -> &'static str {
        match self {
            FileFormat::Raw => "raw",
            FileFormat::Wav => "wav",
        }
    }
}

enum Sink {
    Raw(BufWriter<File>),
    Wav(hound::WavWriter<BufWriter<File>>),
}

impl Sink {
    fn write_frames(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            Sink::Raw(w) => {
                w.write_all(bytes)?;
                Ok(())
            }
            Sink::Wav(w) => {
                for pair in bytes.chunks_exact(2) {
                    w.write_sample(i16::from_le_bytes([pair[0], pair[1]]))?;
                }
                Ok(())
            }
        }
    }

    fn finish(self) -> Result<()> {
        match self {
            Sink::Raw(mut w) => {
                w.flush()?;
                Ok(())
            }
            Sink::Wav(w) => {
                w.finalize()?;
                Ok(())
            }
        }
    }
}

/// Backend state for a file-capture stream.
pub struct FilePcm {
    slave: Pcm,
    path: PathBuf,
    format: FileFormat,
    sink: Option<Sink>,
    scratch: Vec<u8>,
}

impl FilePcm {
    /// Wrap `slave`, capturing its data path into `path`.
    pub fn open(
        name: Option<&str>,
        path: impl AsRef<Path>,
        format: FileFormat,
        slave: Pcm,
    ) -> Result<Pcm> {
        let direction = slave.direction();
        let mode = slave.mode();
        tracing::debug!(path = %path.as_ref().display(), ?format, "opened file stream");
        let backend = FilePcm {
            slave,
            path: path.as_ref().to_owned(),
            format,
            sink: None,
            scratch: Vec::new(),
        };
        Ok(Pcm::from_backend(
            BackendKind::File,
            name.map(str::to_owned),
            direction,
            mode,
            Box::new(backend),
        ))
    }

    fn open_sink(&mut self, setup: &HwSetup) -> Result<()> {
        let sink = match self.format {
            FileFormat::Raw => Sink::Raw(BufWriter::new(File::create(&self.path)?)),
            FileFormat::Wav => {
                if setup.format != Format::S16Le {
                    return Err(Error::NotSupported("wav capture requires S16_LE"));
                }
                let spec = hound::WavSpec {
                    channels: setup.channels as u16,
                    sample_rate: setup.rate,
                    bits_per_sample: 16,
                    sample_format: hound::SampleFormat::Int,
                };
                Sink::Wav(hound::WavWriter::create(&self.path, spec)?)
            }
        };
        self.sink = Some(sink);
        Ok(())
    }

    /// Linearize `frames` frames of the caller's areas into the scratch
    /// buffer as interleaved wire bytes.
    fn linearize(&mut self, planes: &[&[u8]], areas: &[ChannelArea], offset: usize, frames: usize) {
        let setup = *self.slave.setup_ref();
        let bytes = frames * setup.bits_per_frame as usize / 8;
        self.scratch.clear();
        self.scratch.resize(bytes, 0);
        let dst_areas: Vec<ChannelArea> = (0..setup.channels as usize)
            .map(|ch| {
                ChannelArea::new(
                    0,
                    ch * setup.bits_per_sample as usize,
                    setup.bits_per_frame as usize,
                )
            })
            .collect();
        let mut dst_planes: [&mut [u8]; 1] = [&mut self.scratch];
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

    /// Scatter the interleaved scratch buffer back into the caller's areas.
    fn scatter(
        &mut self,
        planes: &mut [&mut [u8]],
        areas: &[ChannelArea],
        offset: usize,
        frames: usize,
    ) {
        let setup = *self.slave.setup_ref();
        let src_areas: Vec<ChannelArea> = (0..setup.channels as usize)
            .map(|ch| {
                ChannelArea::new(
                    0,
                    ch * setup.bits_per_sample as usize,
                    setup.bits_per_frame as usize,
                )
            })
            .collect();
        let src_planes: [&[u8]; 1] = [&self.scratch];
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
    }

    fn tap(&mut self, frames: usize) -> Result<()> {
        let bytes = frames * self.slave.setup_ref().bits_per_frame as usize / 8;
        let Some(sink) = self.sink.as_mut() else {
            return Ok(());
        };
        sink.write_frames(&self.scratch[..bytes])
    }
}

impl ControlOps for FilePcm {
    fn close(&mut self) -> Result<()> {
        let mut first_err = None;
        if let Some(sink) = self.sink.take() {
            if let Err(e) = sink.finish() {
                first_err.get_or_insert(e);
            }
        }
        if let Err(e) = self.slave.shutdown() {
            first_err.get_or_insert(e);
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn nonblock(&mut self, enable: bool) -> Result<()> {
        self.slave.set_nonblock(enable)
    }

    fn info(&self) -> Result<Info> {
        let mut info = self.slave.info()?;
        info.kind = BackendKind::File;
        Ok(info)
    }

    fn hw_refine(&self, params: &mut HwParams) -> Result<()> {
        self.slave.hw_refine(params)
    }

    fn hw_params(&mut self, params: &HwParams) -> Result<HwSetup> {
        if params.access.is_mmap() {
            return Err(Error::NotSupported("file capture over mapped access"));
        }
        // The slave always runs interleaved: the tap linearizes the caller's
        // layout before forwarding.
        let mut slave_params = *params;
        slave_params.access = caudal_core::Access::RwInterleaved;
        self.slave.hw_params(&slave_params)?;
        // The wrapper owns start-on-data; the slave starts when told to.
        let mut sw = SwParams::from_policy(self.slave.policy_ref());
        sw.start_mode = StartMode::Explicit;
        self.slave.sw_params(&mut sw)?;
        let setup = HwSetup {
            access: params.access,
            ..*self.slave.setup_ref()
        };
        self.open_sink(&setup)?;
        Ok(setup)
    }

    fn sw_params(&mut self, params: &mut SwParams) -> Result<()> {
        let start_mode = params.start_mode;
        let mut slave_params = *params;
        slave_params.start_mode = StartMode::Explicit;
        self.slave.sw_params(&mut slave_params)?;
        params.fail_mask = slave_params.fail_mask;
        params.start_mode = start_mode;
        Ok(())
    }

    fn channel_info(&self, channel: u32) -> Result<ChannelInfo> {
        self.slave.channel_info(channel)
    }

    fn dump(&self, w: &mut dyn io::Write) -> io::Result<()> {
        writeln!(w, "FILE PCM")?;
        writeln!(w, "{:<13}: {}", "file", self.path.display())?;
        writeln!(w, "{:<13}: {}", "file format", self.format.name())?;
        self.slave.dump(w)
    }

    fn card(&self) -> Option<u32> {
        self.slave.card()
    }

    fn poll_descriptor(&self) -> Option<BorrowedFd<'_>> {
        self.slave.poll_descriptor()
    }
}

impl FastOps for FilePcm {
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

    fn transfer_write(
        &mut self,
        planes: &[&[u8]],
        areas: &[ChannelArea],
        offset: usize,
        frames: usize,
    ) -> Result<usize> {
        self.linearize(planes, areas, offset, frames);
        let frame_bytes = self.slave.setup_ref().bits_per_frame as usize / 8;
        let scratch_len = frames * frame_bytes;
        let moved = {
            let (slave, scratch) = (&mut self.slave, &self.scratch);
            slave.write_interleaved(&scratch[..scratch_len], frames)?
        };
        self.tap(moved)?;
        Ok(moved)
    }

    fn transfer_read(
        &mut self,
        planes: &mut [&mut [u8]],
        areas: &[ChannelArea],
        offset: usize,
        frames: usize,
    ) -> Result<usize> {
        let frame_bytes = self.slave.setup_ref().bits_per_frame as usize / 8;
        self.scratch.clear();
        self.scratch.resize(frames * frame_bytes, 0);
        let moved = {
            let (slave, scratch) = (&mut self.slave, &mut self.scratch);
            slave.read_interleaved(&mut scratch[..frames * frame_bytes], frames)?
        };
        self.scatter(planes, areas, offset, moved);
        self.tap(moved)?;
        Ok(moved)
    }
}
