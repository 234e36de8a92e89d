//! Integration tests for the stream facade, the transfer engine, and the
//! built-in backends.

use caudal_core::{Access, Direction, Format, StartMode, State};
use caudal_pcm::{
    BackendKind, Error, FileFormat, FilePcm, HwParams, MockPcm, NullPcm, OpenMode, PlugPcm,
    SwParamMask, SwParams, dump_sw_params_fail,
};

fn hw_s16_stereo(access: Access) -> HwParams {
    HwParams::new(access, Format::S16Le, 2, 48000)
}

// ---------------------------------------------------------------------------
// Null backend lifecycle
// ---------------------------------------------------------------------------

#[test]
fn null_playback_lifecycle() {
    let mut pcm = NullPcm::open(Some("null"), Direction::Playback, OpenMode::empty()).unwrap();
    assert_eq!(pcm.kind(), BackendKind::Null);
    assert_eq!(pcm.state(), State::Open);
    assert!(pcm.setup().is_none());

    pcm.hw_params(&hw_s16_stereo(Access::RwInterleaved)).unwrap();
    assert_eq!(pcm.state(), State::Setup);
    assert_eq!(pcm.setup().unwrap().bits_per_frame, 32);

    pcm.prepare().unwrap();
    assert_eq!(pcm.state(), State::Prepared);

    // Start-on-data is the default policy: the first write runs the clock.
    let buf = vec![0u8; 4096];
    let frames = pcm.bytes_to_frames(buf.len());
    assert_eq!(frames, 1024);
    assert_eq!(pcm.write_interleaved(&buf, frames).unwrap(), 1024);
    assert_eq!(pcm.state(), State::Running);

    pcm.pause(true).unwrap();
    assert_eq!(pcm.state(), State::Paused);
    pcm.pause(false).unwrap();
    assert_eq!(pcm.state(), State::Running);

    pcm.drain().unwrap();
    assert_eq!(pcm.state(), State::Setup);
    pcm.close().unwrap();
}

#[test]
fn null_capture_delivers_silence() {
    let mut pcm = NullPcm::open(None, Direction::Capture, OpenMode::empty()).unwrap();
    pcm.hw_params(&hw_s16_stereo(Access::RwInterleaved)).unwrap();
    pcm.prepare().unwrap();

    let mut buf = vec![0xffu8; 1024];
    let frames = pcm.bytes_to_frames(buf.len());
    assert_eq!(pcm.read_interleaved(&mut buf, frames).unwrap(), frames);
    assert!(buf.iter().all(|&b| b == 0), "S16_LE silence is all zero");
    assert_eq!(pcm.state(), State::Running);
}

#[test]
fn conversions_use_frame_geometry() {
    let mut pcm = NullPcm::open(None, Direction::Playback, OpenMode::empty()).unwrap();
    pcm.hw_params(&hw_s16_stereo(Access::RwInterleaved)).unwrap();
    assert_eq!(pcm.bytes_to_frames(4096), 1024);
    assert_eq!(pcm.frames_to_bytes(1024), 4096);
    assert_eq!(pcm.bytes_to_samples(4096), 2048);
    assert_eq!(pcm.samples_to_bytes(2048), 4096);
}

#[test]
fn null_status_and_dump() {
    let mut pcm = NullPcm::open(None, Direction::Playback, OpenMode::empty()).unwrap();
    pcm.hw_params(&hw_s16_stereo(Access::RwInterleaved)).unwrap();
    let status = pcm.status().unwrap();
    assert_eq!(status.state, State::Setup);
    assert_eq!(status.avail, 2048);

    let mut out = Vec::new();
    pcm.dump_setup(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("access       : RW_INTERLEAVED"));
    assert!(text.contains("start_mode   : DATA"));
    assert!(text.contains("avail_min    : 1024"));

    let mut out = Vec::new();
    pcm.dump(&mut out).unwrap();
    assert!(String::from_utf8(out).unwrap().starts_with("NULL PCM"));
}

#[test]
fn wait_returns_on_ready_descriptor() {
    let mut pcm = NullPcm::open(None, Direction::Playback, OpenMode::empty()).unwrap();
    pcm.wait(0).unwrap();
    pcm.wait(10).unwrap();
    assert!(pcm.poll_descriptor().is_some());
}

#[test]
fn link_unsupported_on_null() {
    let mut a = NullPcm::open(None, Direction::Playback, OpenMode::empty()).unwrap();
    let b = NullPcm::open(None, Direction::Playback, OpenMode::empty()).unwrap();
    assert!(matches!(a.link(&b), Err(Error::NotSupported(_))));
    assert!(matches!(a.unlink(), Err(Error::NotSupported(_))));
}

#[test]
fn nonblock_bit_mirrors_backend_acceptance() {
    let mut pcm = NullPcm::open(None, Direction::Playback, OpenMode::empty()).unwrap();
    assert!(!pcm.mode().contains(OpenMode::NONBLOCK));
    pcm.set_nonblock(true).unwrap();
    assert!(pcm.mode().contains(OpenMode::NONBLOCK));
    pcm.set_nonblock(false).unwrap();
    assert!(!pcm.mode().contains(OpenMode::NONBLOCK));
}

#[test]
fn dropping_an_open_stream_shuts_it_down() {
    let mut pcm = NullPcm::open(None, Direction::Playback, OpenMode::empty()).unwrap();
    pcm.hw_params(&hw_s16_stereo(Access::RwInterleaved)).unwrap();
    drop(pcm);
}

// ---------------------------------------------------------------------------
// Transfer engine against the mock backend
// ---------------------------------------------------------------------------

#[test]
fn xrun_surfaces_partial_count_then_error() {
    let (mut pcm, handle) = MockPcm::open(Direction::Playback, OpenMode::empty()).unwrap();
    pcm.hw_params(&hw_s16_stereo(Access::RwInterleaved)).unwrap();
    pcm.prepare().unwrap();
    pcm.start().unwrap();
    pcm.set_avail_min(1).unwrap();
    {
        let mut state = handle.state();
        state.avail_script.extend([300, 0]);
        state.xrun_after_transfers = Some(1);
    }

    let buf = vec![0u8; 4096];
    // 300 frames move before the xrun: the partial count is the result.
    assert_eq!(pcm.write_interleaved(&buf, 1024).unwrap(), 300);
    assert_eq!(handle.state().transfers, vec![300]);

    // The next call of any size surfaces the broken pipe.
    assert!(matches!(
        pcm.write_interleaved(&buf, 1),
        Err(Error::Xrun)
    ));
    assert_eq!(handle.state().transfers, vec![300]);
}

#[test]
fn nonblocking_read_reports_would_block_without_transferring() {
    let (mut pcm, handle) = MockPcm::open(Direction::Capture, OpenMode::NONBLOCK).unwrap();
    pcm.hw_params(&hw_s16_stereo(Access::RwInterleaved)).unwrap();
    pcm.prepare().unwrap();
    pcm.set_avail_min(64).unwrap();
    handle.state().avail_script.push_back(32);

    let mut buf = vec![0u8; 512];
    assert!(matches!(
        pcm.read_interleaved(&mut buf, 128),
        Err(Error::WouldBlock)
    ));
    assert!(handle.state().transfers.is_empty());
}

#[test]
fn write_starts_stream_after_first_chunk() {
    let (mut pcm, handle) = MockPcm::open(Direction::Playback, OpenMode::empty()).unwrap();
    pcm.hw_params(&hw_s16_stereo(Access::RwInterleaved)).unwrap();
    pcm.prepare().unwrap();

    let buf = vec![0u8; 400];
    let frames = pcm.bytes_to_frames(buf.len());
    assert_eq!(pcm.write_interleaved(&buf, frames).unwrap(), frames);
    let state = handle.state();
    assert_eq!(state.starts, 1);
    assert_eq!(state.state, State::Running);
}

#[test]
fn read_starts_stream_before_first_chunk() {
    let (mut pcm, handle) = MockPcm::open(Direction::Capture, OpenMode::empty()).unwrap();
    pcm.hw_params(&hw_s16_stereo(Access::RwInterleaved)).unwrap();
    pcm.prepare().unwrap();

    let mut buf = vec![0u8; 400];
    let frames = pcm.bytes_to_frames(buf.len());
    assert_eq!(pcm.read_interleaved(&mut buf, frames).unwrap(), frames);
    let state = handle.state();
    assert_eq!(state.starts, 1);
    assert_eq!(state.transfers, vec![frames]);
}

#[test]
fn explicit_start_mode_suppresses_implicit_start() {
    let (mut pcm, handle) = MockPcm::open(Direction::Playback, OpenMode::empty()).unwrap();
    pcm.hw_params(&hw_s16_stereo(Access::RwInterleaved)).unwrap();
    let mut sw = SwParams::from_policy(pcm.sw_policy().unwrap());
    sw.start_mode = StartMode::Explicit;
    pcm.sw_params(&mut sw).unwrap();
    pcm.prepare().unwrap();

    let buf = vec![0u8; 4096];
    assert_eq!(pcm.write_interleaved(&buf, 1024).unwrap(), 1024);
    let state = handle.state();
    assert_eq!(state.starts, 0, "explicit mode must not start the stream");
    assert_eq!(state.state, State::Prepared);
}

#[test]
fn blocking_write_converges_over_small_avail_chunks() {
    let (mut pcm, handle) = MockPcm::open(Direction::Playback, OpenMode::empty()).unwrap();
    pcm.hw_params(&hw_s16_stereo(Access::RwInterleaved)).unwrap();
    pcm.prepare().unwrap();
    pcm.start().unwrap();
    pcm.set_avail_min(1).unwrap();
    // Availability trickles in; the loop must keep going until everything
    // has been written.
    handle
        .state()
        .avail_script
        .extend([100, 200, 300, 424, 1000]);

    let buf = vec![0u8; 4096];
    assert_eq!(pcm.write_interleaved(&buf, 1024).unwrap(), 1024);
    assert_eq!(handle.state().transfers, vec![100, 200, 300, 424]);
}

#[test]
fn noninterleaved_write_interleaves_on_the_wire() {
    let (mut pcm, handle) = MockPcm::open(Direction::Playback, OpenMode::empty()).unwrap();
    pcm.hw_params(&hw_s16_stereo(Access::RwNoninterleaved))
        .unwrap();
    pcm.prepare().unwrap();

    let left: [u8; 4] = [0x01, 0x02, 0x03, 0x04];
    let right: [u8; 4] = [0x11, 0x12, 0x13, 0x14];
    let bufs: [&[u8]; 2] = [&left, &right];
    assert_eq!(pcm.write_noninterleaved(&bufs, 2).unwrap(), 2);
    assert_eq!(
        handle.state().written,
        vec![0x01, 0x02, 0x11, 0x12, 0x03, 0x04, 0x13, 0x14]
    );
}

#[test]
fn vectored_write_derives_frames_from_length() {
    let (mut pcm, handle) = MockPcm::open(Direction::Playback, OpenMode::empty()).unwrap();
    pcm.hw_params(&hw_s16_stereo(Access::RwNoninterleaved))
        .unwrap();
    pcm.prepare().unwrap();

    let left = [0u8; 64];
    let right = [0u8; 64];
    let bufs: [&[u8]; 2] = [&left, &right];
    // 64 bytes of S16 samples per channel = 32 frames.
    assert_eq!(pcm.write_vectored(&bufs).unwrap(), 32);
    assert_eq!(handle.state().transfers, vec![32]);
}

#[test]
fn mock_read_fills_requested_byte() {
    let (mut pcm, handle) = MockPcm::open(Direction::Capture, OpenMode::empty()).unwrap();
    pcm.hw_params(&hw_s16_stereo(Access::RwInterleaved)).unwrap();
    pcm.prepare().unwrap();
    handle.state().read_fill = 0x7e;

    let mut buf = vec![0u8; 128];
    let frames = pcm.bytes_to_frames(buf.len());
    assert_eq!(pcm.read_interleaved(&mut buf, frames).unwrap(), frames);
    assert!(buf.iter().all(|&b| b == 0x7e));
}

#[test]
fn sw_params_failure_populates_mask() {
    let (mut pcm, handle) = MockPcm::open(Direction::Playback, OpenMode::empty()).unwrap();
    pcm.hw_params(&hw_s16_stereo(Access::RwInterleaved)).unwrap();
    handle.state().reject_sw = SwParamMask::AVAIL_MIN | SwParamMask::XFER_ALIGN;

    let mut sw = SwParams::from_policy(pcm.sw_policy().unwrap());
    assert!(matches!(
        pcm.sw_params(&mut sw),
        Err(Error::InvalidArgument(_))
    ));
    assert_eq!(sw.fail_mask, SwParamMask::AVAIL_MIN | SwParamMask::XFER_ALIGN);

    let mut out = Vec::new();
    dump_sw_params_fail(&sw, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("avail_min"));
    assert!(text.contains("xfer_align"));
    assert!(!text.contains("start_mode:"));
}

#[test]
fn mmap_forward_and_hw_pointer() {
    let (mut pcm, handle) = MockPcm::open(Direction::Playback, OpenMode::empty()).unwrap();
    pcm.hw_params(&hw_s16_stereo(Access::MmapInterleaved)).unwrap();
    pcm.mmap().unwrap();
    assert_eq!(pcm.mmap_forward(64).unwrap(), 64);
    assert_eq!(pcm.mmap_forward(32).unwrap(), 32);
    assert_eq!(pcm.hw_pointer().unwrap(), 96);
    assert_eq!(handle.state().forwards, vec![64, 32]);
    pcm.munmap().unwrap();
}

// ---------------------------------------------------------------------------
// File backend
// ---------------------------------------------------------------------------

#[test]
fn file_backend_captures_raw_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.raw");

    let slave = NullPcm::open(None, Direction::Playback, OpenMode::empty()).unwrap();
    let mut pcm = FilePcm::open(Some("file:capture"), &path, FileFormat::Raw, slave).unwrap();
    assert_eq!(pcm.kind(), BackendKind::File);

    pcm.hw_params(&hw_s16_stereo(Access::RwInterleaved)).unwrap();
    pcm.prepare().unwrap();

    let buf: Vec<u8> = (0..4096u32).map(|i| i as u8).collect();
    let frames = pcm.bytes_to_frames(buf.len());
    assert_eq!(pcm.write_interleaved(&buf, frames).unwrap(), frames);
    pcm.close().unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), buf);
}

#[test]
fn file_backend_writes_wav_container() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.wav");

    let slave = NullPcm::open(None, Direction::Playback, OpenMode::empty()).unwrap();
    let mut pcm = FilePcm::open(None, &path, FileFormat::Wav, slave).unwrap();
    pcm.hw_params(&hw_s16_stereo(Access::RwInterleaved)).unwrap();
    pcm.prepare().unwrap();

    let samples: Vec<i16> = vec![100, -100, 2000, -2000, 30000, -30000, 0, 1];
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    assert_eq!(pcm.write_interleaved(&bytes, 4).unwrap(), 4);
    pcm.close().unwrap();

    let mut reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 48000);
    assert_eq!(spec.bits_per_sample, 16);
    let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read, samples);
}

#[test]
fn wav_mode_rejects_non_s16_formats() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.wav");

    let slave = NullPcm::open(None, Direction::Playback, OpenMode::empty()).unwrap();
    let mut pcm = FilePcm::open(None, &path, FileFormat::Wav, slave).unwrap();
    let params = HwParams::new(Access::RwInterleaved, Format::S32Le, 2, 48000);
    assert!(matches!(
        pcm.hw_params(&params),
        Err(Error::NotSupported(_))
    ));
}

#[test]
fn file_backend_taps_noninterleaved_writes_interleaved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.raw");

    let slave = NullPcm::open(None, Direction::Playback, OpenMode::empty()).unwrap();
    let mut pcm = FilePcm::open(None, &path, FileFormat::Raw, slave).unwrap();
    pcm.hw_params(&hw_s16_stereo(Access::RwNoninterleaved))
        .unwrap();
    pcm.prepare().unwrap();

    let left: [u8; 4] = [0x01, 0x02, 0x03, 0x04];
    let right: [u8; 4] = [0x11, 0x12, 0x13, 0x14];
    let bufs: [&[u8]; 2] = [&left, &right];
    assert_eq!(pcm.write_noninterleaved(&bufs, 2).unwrap(), 2);
    pcm.close().unwrap();

    assert_eq!(
        std::fs::read(&path).unwrap(),
        vec![0x01, 0x02, 0x11, 0x12, 0x03, 0x04, 0x13, 0x14]
    );
}

// ---------------------------------------------------------------------------
// Plug wrapper
// ---------------------------------------------------------------------------

#[test]
fn plug_forwards_fast_path_to_slave() {
    let slave = NullPcm::open(None, Direction::Playback, OpenMode::empty()).unwrap();
    let mut pcm = PlugPcm::open(Some("plug:null"), slave).unwrap();
    assert_eq!(pcm.kind(), BackendKind::Plug);
    assert_eq!(pcm.info().unwrap().kind, BackendKind::Plug);

    pcm.hw_params(&hw_s16_stereo(Access::RwInterleaved)).unwrap();
    pcm.prepare().unwrap();
    assert_eq!(pcm.state(), State::Prepared);

    let buf = vec![0u8; 1024];
    let frames = pcm.bytes_to_frames(buf.len());
    assert_eq!(pcm.write_interleaved(&buf, frames).unwrap(), frames);
    assert_eq!(pcm.state(), State::Running);
    pcm.close().unwrap();
}
