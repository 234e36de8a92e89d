//! Sample format metadata.
//!
//! A [`Format`] names the wire encoding of one sample. The kernels in
//! [`crate::area`] only need two facts about a format: how many bits one
//! sample physically occupies, and what byte pattern represents silence.
//! Everything else about a format (decoding, conversion) belongs to the
//! backends plugged into the stream dispatch layer.

/// PCM sample format code.
///
/// Covers the linear signed/unsigned widths in both endiannesses plus the
/// compressed and pass-through encodings a driver can expose. Formats without
/// a fixed physical width ([`Format::Mpeg`], [`Format::Gsm`],
/// [`Format::Special`]) report `None` from [`Format::physical_width`] and are
/// rejected by the channel-area kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Format {
    S8,
    U8,
    S16Le,
    S16Be,
    U16Le,
    U16Be,
    S24Le,
    S24Be,
    U24Le,
    U24Be,
    S32Le,
    S32Be,
    U32Le,
    U32Be,
    FloatLe,
    FloatBe,
    Float64Le,
    Float64Be,
    Iec958SubframeLe,
    Iec958SubframeBe,
    MuLaw,
    ALaw,
    ImaAdpcm,
    Mpeg,
    Gsm,
    Special,
}

impl Format {
    /// Every defined format, in code order.
    pub const ALL: [Format; 26] = [
        Format::S8,
        Format::U8,
        Format::S16Le,
        Format::S16Be,
        Format::U16Le,
        Format::U16Be,
        Format::S24Le,
        Format::S24Be,
        Format::U24Le,
        Format::U24Be,
        Format::S32Le,
        Format::S32Be,
        Format::U32Le,
        Format::U32Be,
        Format::FloatLe,
        Format::FloatBe,
        Format::Float64Le,
        Format::Float64Be,
        Format::Iec958SubframeLe,
        Format::Iec958SubframeBe,
        Format::MuLaw,
        Format::ALaw,
        Format::ImaAdpcm,
        Format::Mpeg,
        Format::Gsm,
        Format::Special,
    ];

    /// Short name, as used in configuration files and dumps.
    pub const fn name(self) -> &'static str {
        match self {
            Format::S8 => "S8",
            Format::U8 => "U8",
            Format::S16Le => "S16_LE",
            Format::S16Be => "S16_BE",
            Format::U16Le => "U16_LE",
            Format::U16Be => "U16_BE",
            Format::S24Le => "S24_LE",
            Format::S24Be => "S24_BE",
            Format::U24Le => "U24_LE",
            Format::U24Be => "U24_BE",
            Format::S32Le => "S32_LE",
            Format::S32Be => "S32_BE",
            Format::U32Le => "U32_LE",
            Format::U32Be => "U32_BE",
            Format::FloatLe => "FLOAT_LE",
            Format::FloatBe => "FLOAT_BE",
            Format::Float64Le => "FLOAT64_LE",
            Format::Float64Be => "FLOAT64_BE",
            Format::Iec958SubframeLe => "IEC958_SUBFRAME_LE",
            Format::Iec958SubframeBe => "IEC958_SUBFRAME_BE",
            Format::MuLaw => "MU_LAW",
            Format::ALaw => "A_LAW",
            Format::ImaAdpcm => "IMA_ADPCM",
            Format::Mpeg => "MPEG",
            Format::Gsm => "GSM",
            Format::Special => "SPECIAL",
        }
    }

    /// Human-readable description.
    pub const fn description(self) -> &'static str {
        match self {
            Format::S8 => "Signed 8-bit",
            Format::U8 => "Unsigned 8-bit",
            Format::S16Le => "Signed 16-bit Little Endian",
            Format::S16Be => "Signed 16-bit Big Endian",
            Format::U16Le => "Unsigned 16-bit Little Endian",
            Format::U16Be => "Unsigned 16-bit Big Endian",
            Format::S24Le => "Signed 24-bit Little Endian",
            Format::S24Be => "Signed 24-bit Big Endian",
            Format::U24Le => "Unsigned 24-bit Little Endian",
            Format::U24Be => "Unsigned 24-bit Big Endian",
            Format::S32Le => "Signed 32-bit Little Endian",
            Format::S32Be => "Signed 32-bit Big Endian",
            Format::U32Le => "Unsigned 32-bit Little Endian",
            Format::U32Be => "Unsigned 32-bit Big Endian",
            Format::FloatLe => "Float Little Endian",
            Format::FloatBe => "Float Big Endian",
            Format::Float64Le => "Float64 Little Endian",
            Format::Float64Be => "Float64 Big Endian",
            Format::Iec958SubframeLe => "IEC-958 Little Endian",
            Format::Iec958SubframeBe => "IEC-958 Big Endian",
            Format::MuLaw => "Mu-Law",
            Format::ALaw => "A-Law",
            Format::ImaAdpcm => "Ima-ADPCM",
            Format::Mpeg => "MPEG",
            Format::Gsm => "GSM",
            Format::Special => "Special",
        }
    }

    /// Reverse lookup by short name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Format> {
        Format::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }

    /// Physical width of one sample in bits, or `None` for formats without a
    /// fixed per-sample size.
    pub const fn physical_width(self) -> Option<u32> {
        match self {
            Format::S8 | Format::U8 | Format::MuLaw | Format::ALaw => Some(8),
            Format::S16Le | Format::S16Be | Format::U16Le | Format::U16Be => Some(16),
            // 24-bit samples occupy a 32-bit word, LSB-justified.
            Format::S24Le
            | Format::S24Be
            | Format::U24Le
            | Format::U24Be
            | Format::S32Le
            | Format::S32Be
            | Format::U32Le
            | Format::U32Be
            | Format::FloatLe
            | Format::FloatBe
            | Format::Iec958SubframeLe
            | Format::Iec958SubframeBe => Some(32),
            Format::Float64Le | Format::Float64Be => Some(64),
            Format::ImaAdpcm => Some(4),
            Format::Mpeg | Format::Gsm | Format::Special => None,
        }
    }

    /// Silence byte pattern, packed into a `u64` in little-endian byte order.
    ///
    /// The pattern repeats with the sample width, so stamping the eight bytes
    /// of `silence_64().to_le_bytes()` cyclically over a contiguous span of
    /// samples yields canonical silence regardless of where in the pattern the
    /// span starts, as long as it starts on a sample boundary.
    pub const fn silence_64(self) -> u64 {
        match self {
            Format::U8 => 0x8080_8080_8080_8080,
            Format::U16Le => 0x8000_8000_8000_8000,
            Format::U16Be => 0x0080_0080_0080_0080,
            Format::U24Le => 0x0080_0000_0080_0000,
            Format::U24Be => 0x0000_8000_0000_8000,
            Format::U32Le => 0x8000_0000_8000_0000,
            Format::U32Be => 0x0000_0080_0000_0080,
            Format::MuLaw => 0x7f7f_7f7f_7f7f_7f7f,
            Format::ALaw => 0x5555_5555_5555_5555,
            _ => 0,
        }
    }
}

impl core::fmt::Display for Format {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_roundtrip_all_formats() {
        for format in Format::ALL {
            assert_eq!(
                Format::from_name(format.name()),
                Some(format),
                "round-trip failed for {format}"
            );
        }
    }

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(Format::from_name("s16_le"), Some(Format::S16Le));
        assert_eq!(Format::from_name("Mu_Law"), Some(Format::MuLaw));
        assert_eq!(Format::from_name("bogus"), None);
    }

    #[test]
    fn widths_match_encoding() {
        assert_eq!(Format::S8.physical_width(), Some(8));
        assert_eq!(Format::S16Be.physical_width(), Some(16));
        assert_eq!(Format::S24Le.physical_width(), Some(32));
        assert_eq!(Format::Float64Be.physical_width(), Some(64));
        assert_eq!(Format::ImaAdpcm.physical_width(), Some(4));
        assert_eq!(Format::Mpeg.physical_width(), None);
        assert_eq!(Format::Gsm.physical_width(), None);
        assert_eq!(Format::Special.physical_width(), None);
    }

    #[test]
    fn unsigned_silence_sets_sign_bit() {
        let bytes = Format::U16Le.silence_64().to_le_bytes();
        assert_eq!(&bytes[..2], &[0x00, 0x80]);
        let bytes = Format::U16Be.silence_64().to_le_bytes();
        assert_eq!(&bytes[..2], &[0x80, 0x00]);
        assert_eq!(Format::S16Le.silence_64(), 0);
    }
}
