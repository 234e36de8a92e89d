//! Hardware and software parameter blocks.
//!
//! [`HwParams`] is what the application proposes; [`HwSetup`] is what the
//! backend accepted, with the derived frame geometry the facade caches.
//! [`SwParams`] carries the transfer policy plus a [`SwParamMask`] fail mask
//! the backend populates when negotiation fails, so the caller can pinpoint
//! the rejected field.

use bitflags::bitflags;
use caudal_core::{Access, Format, ReadyMode, StartMode, Subformat, SwParam, XrunMode};

use crate::error::{Error, Result};

bitflags! {
    /// Stream open-mode bit set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenMode: u32 {
        /// Data-path calls return [`Error::WouldBlock`](crate::Error::WouldBlock)
        /// instead of waiting.
        const NONBLOCK = 1 << 0;
        /// Signal-driven notification requested.
        const ASYNC = 1 << 1;
    }
}

bitflags! {
    /// Software parameters rejected during negotiation, one bit per
    /// [`SwParam`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SwParamMask: u32 {
        /// [`SwParam::StartMode`] was rejected.
        const START_MODE = 1 << 0;
        /// [`SwParam::ReadyMode`] was rejected.
        const READY_MODE = 1 << 1;
        /// [`SwParam::AvailMin`] was rejected.
        const AVAIL_MIN = 1 << 2;
        /// [`SwParam::XferMin`] was rejected.
        const XFER_MIN = 1 << 3;
        /// [`SwParam::XferAlign`] was rejected.
        const XFER_ALIGN = 1 << 4;
        /// [`SwParam::XrunMode`] was rejected.
        const XRUN_MODE = 1 << 5;
        /// [`SwParam::Time`] was rejected.
        const TIME = 1 << 6;
    }
}

impl SwParamMask {
    /// The bit for one software parameter.
    pub const fn of(param: SwParam) -> SwParamMask {
        match param {
            SwParam::StartMode => SwParamMask::START_MODE,
            SwParam::ReadyMode => SwParamMask::READY_MODE,
            SwParam::AvailMin => SwParamMask::AVAIL_MIN,
            SwParam::XferMin => SwParamMask::XFER_MIN,
            SwParam::XferAlign => SwParamMask::XFER_ALIGN,
            SwParam::XrunMode => SwParamMask::XRUN_MODE,
            SwParam::Time => SwParamMask::TIME,
        }
    }
}

/// Hardware parameters proposed to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwParams {
    /// Requested buffer access layout.
    pub access: Access,
    /// Requested sample format.
    pub format: Format,
    /// Requested sub-format.
    pub subformat: Subformat,
    /// Number of channels.
    pub channels: u32,
    /// Rate in frames per second.
    pub rate: u32,
    /// Fragment size in frames.
    pub fragment_size: usize,
    /// Number of fragments in the ring.
    pub fragments: u32,
}

impl HwParams {
    /// Proposal with the default ring geometry (1024-frame fragments, two
    /// fragments).
    pub const fn new(access: Access, format: Format, channels: u32, rate: u32) -> Self {
        HwParams {
            access,
            format,
            subformat: Subformat::Std,
            channels,
            rate,
            fragment_size: 1024,
            fragments: 2,
        }
    }
}

/// Accepted hardware configuration with derived frame geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwSetup {
    /// Accepted access layout.
    pub access: Access,
    /// Accepted sample format.
    pub format: Format,
    /// Accepted sub-format.
    pub subformat: Subformat,
    /// Number of channels.
    pub channels: u32,
    /// Nominal rate in frames per second.
    pub rate: u32,
    /// Exact rate numerator.
    pub rate_num: u32,
    /// Exact rate denominator.
    pub rate_den: u32,
    /// Significant bits per sample.
    pub msbits: u32,
    /// Fragment size in frames.
    pub fragment_size: usize,
    /// Number of fragments in the ring.
    pub fragments: u32,
    /// Physical bits of one sample.
    pub bits_per_sample: u32,
    /// Physical bits of one frame.
    pub bits_per_frame: u32,
}

impl HwSetup {
    /// Derive a setup from accepted parameters.
    ///
    /// Fails with [`Error::InvalidArgument`] for widthless formats or
    /// degenerate geometry; backends call this after validating the rest of
    /// the proposal.
    pub fn from_params(params: &HwParams) -> Result<HwSetup> {
        let Some(width) = params.format.physical_width() else {
            return Err(Error::InvalidArgument("format has no physical width"));
        };
        if params.channels == 0 {
            return Err(Error::InvalidArgument("channel count is zero"));
        }
        if params.rate == 0 {
            return Err(Error::InvalidArgument("rate is zero"));
        }
        if params.fragment_size == 0 || params.fragments == 0 {
            return Err(Error::InvalidArgument("empty ring geometry"));
        }
        let msbits = match params.format {
            Format::S24Le | Format::S24Be | Format::U24Le | Format::U24Be => 24,
            _ => width,
        };
        Ok(HwSetup {
            access: params.access,
            format: params.format,
            subformat: params.subformat,
            channels: params.channels,
            rate: params.rate,
            rate_num: params.rate,
            rate_den: 1,
            msbits,
            fragment_size: params.fragment_size,
            fragments: params.fragments,
            bits_per_sample: width,
            bits_per_frame: width * params.channels,
        })
    }

    /// Ring size in frames.
    pub const fn buffer_size(&self) -> usize {
        self.fragment_size * self.fragments as usize
    }
}

/// Pointer modulus: the ring size doubled into a power-of-two multiple, so
/// wrap-around arithmetic on application and hardware pointers is
/// unambiguous.
pub(crate) fn boundary_for(buffer_size: usize) -> u64 {
    let mut boundary = buffer_size.max(1) as u64;
    while boundary < 1 << 62 {
        boundary *= 2;
    }
    boundary
}

/// Software transfer policy, cached on the stream once accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwPolicy {
    /// When a prepared stream starts running.
    pub start_mode: StartMode,
    /// When the poll descriptor reports readiness.
    pub ready_mode: ReadyMode,
    /// When the driver declares an xrun.
    pub xrun_mode: XrunMode,
    /// Minimum available frames before a transfer proceeds.
    pub avail_min: usize,
    /// Minimum transfer chunk in frames.
    pub xfer_min: usize,
    /// Transfer alignment in frames.
    pub xfer_align: usize,
    /// Timestamping enabled.
    pub time: bool,
    /// Pointer modulus in frames.
    pub boundary: u64,
}

impl SwPolicy {
    /// Policy applied when hardware parameters are accepted, before any
    /// explicit software negotiation.
    pub fn defaults_for(setup: &HwSetup) -> SwPolicy {
        SwPolicy {
            start_mode: StartMode::Data,
            ready_mode: ReadyMode::Fragment,
            xrun_mode: XrunMode::Fragment,
            avail_min: setup.fragment_size,
            xfer_min: 1,
            xfer_align: 1,
            time: false,
            boundary: boundary_for(setup.buffer_size()),
        }
    }
}

/// Software parameter block exchanged with the backend.
///
/// On a failed negotiation the backend sets the offending bits in
/// `fail_mask` before returning the error, so
/// [`dump_sw_params_fail`](crate::dump_sw_params_fail) can name the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwParams {
    /// Requested start mode.
    pub start_mode: StartMode,
    /// Requested ready mode.
    pub ready_mode: ReadyMode,
    /// Requested xrun mode.
    pub xrun_mode: XrunMode,
    /// Requested availability threshold in frames.
    pub avail_min: usize,
    /// Requested minimum transfer chunk in frames.
    pub xfer_min: usize,
    /// Requested transfer alignment in frames.
    pub xfer_align: usize,
    /// Request timestamping.
    pub time: bool,
    /// Requested pointer modulus in frames.
    pub boundary: u64,
    /// Populated by the backend when negotiation fails.
    pub fail_mask: SwParamMask,
}

impl SwParams {
    /// Parameter block seeded from a cached policy, with an empty fail mask.
    pub fn from_policy(policy: &SwPolicy) -> SwParams {
        SwParams {
            start_mode: policy.start_mode,
            ready_mode: policy.ready_mode,
            xrun_mode: policy.xrun_mode,
            avail_min: policy.avail_min,
            xfer_min: policy.xfer_min,
            xfer_align: policy.xfer_align,
            time: policy.time,
            boundary: policy.boundary,
            fail_mask: SwParamMask::empty(),
        }
    }
}
