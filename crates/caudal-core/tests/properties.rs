//! Property-based tests for the channel-area kernels.
//!
//! Exercises the round-trip, silence, collapse-equivalence, and null-address
//! laws over randomized layouts and offsets.

use proptest::prelude::*;

use caudal_core::{ChannelArea, Format, Layout, area_copy, area_silence, areas_copy};

/// Formats with byte-multiple widths, paired with the width in bits.
const BYTE_FORMATS: &[(Format, usize)] = &[
    (Format::U8, 8),
    (Format::S16Le, 16),
    (Format::U16Be, 16),
    (Format::S32Le, 32),
    (Format::U32Be, 32),
    (Format::Float64Le, 64),
];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Copying a strided channel out and back restores the original bytes and
    /// leaves every byte outside the affected range untouched.
    #[test]
    fn copy_roundtrip_restores_source(
        fmt_idx in 0usize..BYTE_FORMATS.len(),
        channels in 1usize..4,
        frames in 1usize..32,
        offset in 0usize..8,
        seed in prop::collection::vec(any::<u8>(), 2048),
    ) {
        let (format, width) = BYTE_FORMATS[fmt_idx];
        let step = channels * width;
        let total = (offset + frames) * step / 8;
        prop_assume!(total <= seed.len());

        let original = &seed[..total];
        // Channel 0 of an interleaved buffer, extracted to a contiguous
        // scratch plane and copied back.
        let mut scratch = vec![0u8; frames * width / 8];
        area_copy(
            Some(original),
            Layout::new(0, step),
            offset,
            Some(&mut scratch),
            Layout::new(0, width),
            0,
            frames,
            format,
        );

        let mut restored = original.to_vec();
        area_copy(
            Some(&scratch),
            Layout::new(0, width),
            0,
            Some(&mut restored),
            Layout::new(0, step),
            offset,
            frames,
            format,
        );
        prop_assert_eq!(&restored[..], original);
    }

    /// Silencing a range stamps the canonical zero of the format into exactly
    /// the addressed samples; everything else survives bit-exactly.
    #[test]
    fn silence_stamps_canonical_zero(
        fmt_idx in 0usize..BYTE_FORMATS.len(),
        channels in 1usize..4,
        frames in 1usize..32,
        offset in 0usize..8,
    ) {
        let (format, width) = BYTE_FORMATS[fmt_idx];
        let step = channels * width;
        let total = (offset + frames) * step / 8;
        let mut buf = vec![0xa5u8; total];
        area_silence(Some(&mut buf), Layout::new(0, step), offset, frames, format);

        let pattern = format.silence_64().to_le_bytes();
        let sample_bytes = width / 8;
        for frame in 0..offset + frames {
            let base = frame * step / 8;
            let silenced = frame >= offset;
            for b in 0..sample_bytes {
                let expected = if silenced { pattern[b % 8] } else { 0xa5 };
                prop_assert_eq!(buf[base + b], expected, "frame {} byte {}", frame, b);
            }
            // Other channels of the frame are untouched.
            for b in sample_bytes..step / 8 {
                prop_assert_eq!(buf[base + b], 0xa5);
            }
        }
    }

    /// The multi-channel copy over adjacent interleaved channels produces the
    /// same memory as independent per-channel copies.
    #[test]
    fn collapse_equivalence(
        fmt_idx in 0usize..BYTE_FORMATS.len(),
        channels in 2usize..4,
        frames in 1usize..32,
        seed in prop::collection::vec(any::<u8>(), 2048),
    ) {
        let (format, width) = BYTE_FORMATS[fmt_idx];
        let step = channels * width;
        let total = frames * step / 8;
        prop_assume!(total <= seed.len());

        let src = &seed[..total];
        let areas: Vec<ChannelArea> = (0..channels)
            .map(|ch| ChannelArea::new(0, ch * width, step))
            .collect();

        let mut collapsed = vec![0u8; total];
        {
            let src_planes: [&[u8]; 1] = [src];
            let mut dst_planes: [&mut [u8]; 1] = [&mut collapsed];
            areas_copy(&src_planes, &areas, 0, &mut dst_planes, &areas, 0, frames, format);
        }

        let mut individual = vec![0u8; total];
        for ch in 0..channels {
            area_copy(
                Some(src),
                Layout::new(ch * width, step),
                0,
                Some(&mut individual),
                Layout::new(ch * width, step),
                0,
                frames,
                format,
            );
        }
        prop_assert_eq!(collapsed, individual);
    }

    /// Null source silences; null destination leaves the world alone.
    #[test]
    fn null_address_contract(
        fmt_idx in 0usize..BYTE_FORMATS.len(),
        frames in 1usize..32,
    ) {
        let (format, width) = BYTE_FORMATS[fmt_idx];
        let total = frames * width / 8;

        let mut silenced = vec![0xffu8; total];
        area_copy(
            None,
            Layout::new(0, width),
            0,
            Some(&mut silenced),
            Layout::new(0, width),
            0,
            frames,
            format,
        );
        let mut reference = vec![0xffu8; total];
        area_silence(Some(&mut reference), Layout::new(0, width), 0, frames, format);
        prop_assert_eq!(silenced, reference);

        // Null destination: nothing observable happens (and nothing panics).
        let src = vec![0u8; total];
        area_copy(
            Some(&src),
            Layout::new(0, width),
            0,
            None,
            Layout::new(0, width),
            0,
            frames,
            format,
        );
    }
}
