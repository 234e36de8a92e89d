//! Stream lifecycle and negotiation vocabulary.
//!
//! Every enum here carries a dense `ALL` table and a short `name()` used by
//! the dump printers and by reverse lookups in configuration handling.

/// Stream transfer direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Application produces frames, hardware consumes them.
    Playback,
    /// Hardware produces frames, application consumes them.
    Capture,
}

impl Direction {
    /// Both directions, in code order.
    pub const ALL: [Direction; 2] = [Direction::Playback, Direction::Capture];

    /// Short name.
    pub const fn name(self) -> &'static str {
        match self {
            Direction::Playback => "PLAYBACK",
            Direction::Capture => "CAPTURE",
        }
    }
}

/// Stream lifecycle state.
///
/// The declaration order follows the lifecycle, and the derived ordering is
/// part of the contract: the transfer engine admits any state
/// `>= State::Prepared` to the data path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum State {
    /// Handle exists, no hardware parameters accepted yet.
    Open,
    /// Hardware parameters accepted.
    Setup,
    /// Ready to start.
    Prepared,
    /// Transferring frames.
    Running,
    /// Underrun (playback) or overrun (capture).
    Xrun,
    /// Paused by the application.
    Paused,
}

impl State {
    /// Every state, in lifecycle order.
    pub const ALL: [State; 6] = [
        State::Open,
        State::Setup,
        State::Prepared,
        State::Running,
        State::Xrun,
        State::Paused,
    ];

    /// Short name.
    pub const fn name(self) -> &'static str {
        match self {
            State::Open => "OPEN",
            State::Setup => "SETUP",
            State::Prepared => "PREPARED",
            State::Running => "RUNNING",
            State::Xrun => "XRUN",
            State::Paused => "PAUSED",
        }
    }
}

/// Negotiated buffer access layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// Memory-mapped, channels interleaved in one ring.
    MmapInterleaved,
    /// Memory-mapped, one ring per channel.
    MmapNoninterleaved,
    /// Memory-mapped with per-channel placement described individually.
    MmapComplex,
    /// Read/write calls on one interleaved buffer.
    RwInterleaved,
    /// Read/write calls on per-channel buffers.
    RwNoninterleaved,
}

impl Access {
    /// Every access mode, in code order.
    pub const ALL: [Access; 5] = [
        Access::MmapInterleaved,
        Access::MmapNoninterleaved,
        Access::MmapComplex,
        Access::RwInterleaved,
        Access::RwNoninterleaved,
    ];

    /// Short name.
    pub const fn name(self) -> &'static str {
        match self {
            Access::MmapInterleaved => "MMAP_INTERLEAVED",
            Access::MmapNoninterleaved => "MMAP_NONINTERLEAVED",
            Access::MmapComplex => "MMAP_COMPLEX",
            Access::RwInterleaved => "RW_INTERLEAVED",
            Access::RwNoninterleaved => "RW_NONINTERLEAVED",
        }
    }

    /// True for the memory-mapped layouts.
    pub const fn is_mmap(self) -> bool {
        matches!(
            self,
            Access::MmapInterleaved | Access::MmapNoninterleaved | Access::MmapComplex
        )
    }
}

/// Sub-format qualifier. Only the standard encoding is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subformat {
    /// Standard encoding for the containing format.
    Std,
}

impl Subformat {
    /// Every subformat.
    pub const ALL: [Subformat; 1] = [Subformat::Std];

    /// Short name.
    pub const fn name(self) -> &'static str {
        match self {
            Subformat::Std => "STD",
        }
    }

    /// Human-readable description.
    pub const fn description(self) -> &'static str {
        match self {
            Subformat::Std => "Standard",
        }
    }
}

/// When a prepared stream starts running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartMode {
    /// Only an explicit start call starts the stream.
    Explicit,
    /// The first data transfer starts the stream.
    Data,
}

impl StartMode {
    /// Both start modes.
    pub const ALL: [StartMode; 2] = [StartMode::Explicit, StartMode::Data];

    /// Short name.
    pub const fn name(self) -> &'static str {
        match self {
            StartMode::Explicit => "EXPLICIT",
            StartMode::Data => "DATA",
        }
    }
}

/// When the poll descriptor reports readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadyMode {
    /// Ready when a whole fragment can be transferred.
    Fragment,
    /// Ready as soon as any frame can be transferred.
    Asap,
}

impl ReadyMode {
    /// Both ready modes.
    pub const ALL: [ReadyMode; 2] = [ReadyMode::Fragment, ReadyMode::Asap];

    /// Short name.
    pub const fn name(self) -> &'static str {
        match self {
            ReadyMode::Fragment => "FRAGMENT",
            ReadyMode::Asap => "ASAP",
        }
    }
}

/// When the driver declares an underrun/overrun.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XrunMode {
    /// Declare as soon as the ring empties/fills.
    Asap,
    /// Declare on the next fragment boundary.
    Fragment,
    /// Never declare; the pointers free-run.
    None,
}

impl XrunMode {
    /// Every xrun mode.
    pub const ALL: [XrunMode; 3] = [XrunMode::Asap, XrunMode::Fragment, XrunMode::None];

    /// Short name.
    pub const fn name(self) -> &'static str {
        match self {
            XrunMode::Asap => "ASAP",
            XrunMode::Fragment => "FRAGMENT",
            XrunMode::None => "NONE",
        }
    }
}

/// Hardware parameter identifier, for diagnostics and dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum HwParam {
    Access,
    Format,
    Subformat,
    Channels,
    Rate,
    FragmentLength,
    FragmentSize,
    Fragments,
    BufferLength,
    BufferSize,
    SampleBits,
    FrameBits,
    FragmentBytes,
    BufferBytes,
}

impl HwParam {
    /// Every hardware parameter id, in code order.
    pub const ALL: [HwParam; 14] = [
        HwParam::Access,
        HwParam::Format,
        HwParam::Subformat,
        HwParam::Channels,
        HwParam::Rate,
        HwParam::FragmentLength,
        HwParam::FragmentSize,
        HwParam::Fragments,
        HwParam::BufferLength,
        HwParam::BufferSize,
        HwParam::SampleBits,
        HwParam::FrameBits,
        HwParam::FragmentBytes,
        HwParam::BufferBytes,
    ];

    /// Short name.
    pub const fn name(self) -> &'static str {
        match self {
            HwParam::Access => "ACCESS",
            HwParam::Format => "FORMAT",
            HwParam::Subformat => "SUBFORMAT",
            HwParam::Channels => "CHANNELS",
            HwParam::Rate => "RATE",
            HwParam::FragmentLength => "FRAGMENT_LENGTH",
            HwParam::FragmentSize => "FRAGMENT_SIZE",
            HwParam::Fragments => "FRAGMENTS",
            HwParam::BufferLength => "BUFFER_LENGTH",
            HwParam::BufferSize => "BUFFER_SIZE",
            HwParam::SampleBits => "SAMPLE_BITS",
            HwParam::FrameBits => "FRAME_BITS",
            HwParam::FragmentBytes => "FRAGMENT_BYTES",
            HwParam::BufferBytes => "BUFFER_BYTES",
        }
    }
}

/// Software parameter identifier, indexing the negotiation fail mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum SwParam {
    StartMode,
    ReadyMode,
    AvailMin,
    XferMin,
    XferAlign,
    XrunMode,
    Time,
}

impl SwParam {
    /// Every software parameter id, in code order.
    pub const ALL: [SwParam; 7] = [
        SwParam::StartMode,
        SwParam::ReadyMode,
        SwParam::AvailMin,
        SwParam::XferMin,
        SwParam::XferAlign,
        SwParam::XrunMode,
        SwParam::Time,
    ];

    /// Short name.
    pub const fn name(self) -> &'static str {
        match self {
            SwParam::StartMode => "START_MODE",
            SwParam::ReadyMode => "READY_MODE",
            SwParam::AvailMin => "AVAIL_MIN",
            SwParam::XferMin => "XFER_MIN",
            SwParam::XferAlign => "XFER_ALIGN",
            SwParam::XrunMode => "XRUN_MODE",
            SwParam::Time => "TIME",
        }
    }
}

macro_rules! display_by_name {
    ($($ty:ty),* $(,)?) => {
        $(impl core::fmt::Display for $ty {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.name())
            }
        })*
    };
}

display_by_name!(
    Direction, State, Access, Subformat, StartMode, ReadyMode, XrunMode, HwParam, SwParam,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_ordering_follows_lifecycle() {
        assert!(State::Open < State::Setup);
        assert!(State::Setup < State::Prepared);
        assert!(State::Running >= State::Prepared);
        assert!(State::Xrun >= State::Prepared);
        assert!(State::Paused >= State::Prepared);
    }

    #[test]
    fn every_enum_value_has_a_name() {
        for v in Direction::ALL {
            assert!(!v.name().is_empty());
        }
        for v in State::ALL {
            assert!(!v.name().is_empty());
        }
        for v in Access::ALL {
            assert!(!v.name().is_empty());
        }
        for v in StartMode::ALL {
            assert!(!v.name().is_empty());
        }
        for v in ReadyMode::ALL {
            assert!(!v.name().is_empty());
        }
        for v in XrunMode::ALL {
            assert!(!v.name().is_empty());
        }
        for v in HwParam::ALL {
            assert!(!v.name().is_empty());
        }
        for v in SwParam::ALL {
            assert!(!v.name().is_empty());
        }
    }

    #[test]
    fn mmap_classification() {
        assert!(Access::MmapComplex.is_mmap());
        assert!(!Access::RwInterleaved.is_mmap());
    }
}
