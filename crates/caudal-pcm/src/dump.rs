//! Human-readable setup and status printing.
//!
//! Line-oriented `key : value` text with keys padded to a fixed column,
//! written to a caller-provided sink. Enum values render as their short
//! names; rates render both as a decimal and as a numerator/denominator
//! pair.

use std::io;

use crate::ops::Status;
use crate::params::{HwSetup, SwParamMask, SwParams, SwPolicy};
use crate::stream::Pcm;
use caudal_core::{Direction, SwParam};

const KEY_WIDTH: usize = 13;

fn onoff(value: bool) -> &'static str {
    if value { "ON" } else { "OFF" }
}

pub(crate) fn write_hw_setup(
    w: &mut dyn io::Write,
    direction: Direction,
    setup: &HwSetup,
) -> io::Result<()> {
    writeln!(w, "{:<KEY_WIDTH$}: {}", "stream", direction)?;
    writeln!(w, "{:<KEY_WIDTH$}: {}", "access", setup.access)?;
    writeln!(w, "{:<KEY_WIDTH$}: {}", "format", setup.format)?;
    writeln!(w, "{:<KEY_WIDTH$}: {}", "subformat", setup.subformat)?;
    writeln!(w, "{:<KEY_WIDTH$}: {}", "channels", setup.channels)?;
    writeln!(w, "{:<KEY_WIDTH$}: {}", "rate", setup.rate)?;
    writeln!(
        w,
        "{:<KEY_WIDTH$}: {} ({}/{})",
        "exact rate",
        f64::from(setup.rate_num) / f64::from(setup.rate_den),
        setup.rate_num,
        setup.rate_den
    )?;
    writeln!(w, "{:<KEY_WIDTH$}: {}", "msbits", setup.msbits)?;
    writeln!(w, "{:<KEY_WIDTH$}: {}", "fragment_size", setup.fragment_size)?;
    writeln!(w, "{:<KEY_WIDTH$}: {}", "fragments", setup.fragments)?;
    Ok(())
}

pub(crate) fn write_sw_setup(w: &mut dyn io::Write, policy: &SwPolicy) -> io::Result<()> {
    writeln!(w, "{:<KEY_WIDTH$}: {}", "start_mode", policy.start_mode)?;
    writeln!(w, "{:<KEY_WIDTH$}: {}", "ready_mode", policy.ready_mode)?;
    writeln!(w, "{:<KEY_WIDTH$}: {}", "xrun_mode", policy.xrun_mode)?;
    writeln!(w, "{:<KEY_WIDTH$}: {}", "avail_min", policy.avail_min)?;
    writeln!(w, "{:<KEY_WIDTH$}: {}", "xfer_min", policy.xfer_min)?;
    writeln!(w, "{:<KEY_WIDTH$}: {}", "xfer_align", policy.xfer_align)?;
    writeln!(w, "{:<KEY_WIDTH$}: {}", "time", onoff(policy.time))?;
    writeln!(w, "{:<KEY_WIDTH$}: {}", "boundary", policy.boundary)?;
    Ok(())
}

impl Pcm {
    /// Print the negotiated hardware setup.
    pub fn dump_hw_setup(&self, w: &mut dyn io::Write) -> io::Result<()> {
        write_hw_setup(w, self.direction(), self.setup_ref())
    }

    /// Print the cached software policy.
    pub fn dump_sw_setup(&self, w: &mut dyn io::Write) -> io::Result<()> {
        write_sw_setup(w, self.policy_ref())
    }

    /// Print both setups.
    pub fn dump_setup(&self, w: &mut dyn io::Write) -> io::Result<()> {
        self.dump_hw_setup(w)?;
        self.dump_sw_setup(w)
    }

    /// Ask the backend chain to describe itself.
    pub fn dump(&self, w: &mut dyn io::Write) -> io::Result<()> {
        self.backend.dump(w)
    }
}

/// Print an accounting snapshot.
pub fn dump_status(status: &Status, w: &mut dyn io::Write) -> io::Result<()> {
    writeln!(w, "{:<KEY_WIDTH$}: {}", "state", status.state)?;
    writeln!(
        w,
        "{:<KEY_WIDTH$}: {}.{:06}",
        "trigger_time",
        status.trigger_time.as_secs(),
        status.trigger_time.subsec_micros()
    )?;
    writeln!(
        w,
        "{:<KEY_WIDTH$}: {}.{:06}",
        "tstamp",
        status.tstamp.as_secs(),
        status.tstamp.subsec_micros()
    )?;
    writeln!(w, "{:<KEY_WIDTH$}: {}", "delay", status.delay)?;
    writeln!(w, "{:<KEY_WIDTH$}: {}", "avail", status.avail)?;
    writeln!(w, "{:<KEY_WIDTH$}: {}", "avail_max", status.avail_max)?;
    Ok(())
}

/// Walk a failed negotiation's mask and print each offending field with the
/// value that was rejected.
pub fn dump_sw_params_fail(params: &SwParams, w: &mut dyn io::Write) -> io::Result<()> {
    if params.fail_mask.is_empty() {
        writeln!(w, "unknown sw_params failure reason")?;
        return Ok(());
    }
    writeln!(w, "sw_params failed on the following field value(s):")?;
    for param in SwParam::ALL {
        if !params.fail_mask.contains(SwParamMask::of(param)) {
            continue;
        }
        match param {
            SwParam::StartMode => writeln!(w, "start_mode: {}", params.start_mode)?,
            SwParam::ReadyMode => writeln!(w, "ready_mode: {}", params.ready_mode)?,
            SwParam::XrunMode => writeln!(w, "xrun_mode: {}", params.xrun_mode)?,
            SwParam::AvailMin => writeln!(w, "avail_min: {}", params.avail_min)?,
            SwParam::XferMin => writeln!(w, "xfer_min: {}", params.xfer_min)?,
            SwParam::XferAlign => writeln!(w, "xfer_align: {}", params.xfer_align)?,
            SwParam::Time => writeln!(w, "time: {}", onoff(params.time))?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use caudal_core::{Access, Format, StartMode};
    use crate::params::HwParams;

    #[test]
    fn hw_setup_dump_pads_keys() {
        let params = HwParams::new(Access::RwInterleaved, Format::S16Le, 2, 48000);
        let setup = crate::params::HwSetup::from_params(&params).unwrap();
        let mut out = Vec::new();
        write_hw_setup(&mut out, Direction::Playback, &setup).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("stream       : PLAYBACK"));
        assert!(text.contains("format       : S16_LE"));
        assert!(text.contains("exact rate   : 48000 (48000/1)"));
    }

    #[test]
    fn sw_fail_dump_names_offending_fields() {
        let params = HwParams::new(Access::RwInterleaved, Format::S16Le, 2, 48000);
        let setup = crate::params::HwSetup::from_params(&params).unwrap();
        let mut sw = SwParams::from_policy(&SwPolicy::defaults_for(&setup));
        sw.start_mode = StartMode::Explicit;
        sw.fail_mask = SwParamMask::START_MODE | SwParamMask::AVAIL_MIN;
        let mut out = Vec::new();
        dump_sw_params_fail(&sw, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("start_mode: EXPLICIT"));
        assert!(text.contains("avail_min: 1024"));
        assert!(!text.contains("xfer_min"));
    }

    #[test]
    fn empty_fail_mask_reports_unknown_reason() {
        let params = HwParams::new(Access::RwInterleaved, Format::S16Le, 2, 48000);
        let setup = crate::params::HwSetup::from_params(&params).unwrap();
        let sw = SwParams::from_policy(&SwPolicy::defaults_for(&setup));
        let mut out = Vec::new();
        dump_sw_params_fail(&sw, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "unknown sw_params failure reason\n"
        );
    }
}
