//! Strided channel-area descriptors and the silence/copy kernels.
//!
//! A channel area describes where the consecutive frames of one channel live
//! inside a byte *plane*: a bit offset of the first sample ([`Layout::first`])
//! and a bit distance between frames ([`Layout::step`]). Fully-interleaved
//! buffers put every channel in the same plane with `step` equal to the frame
//! width; non-interleaved buffers use one plane per channel with `step` equal
//! to the sample width.
//!
//! The kernels are bit-exact across sample widths of 4, 8, 16, 32 and 64
//! bits. Width 4 addresses nibbles LSB-first: bit offset 0 within a byte is
//! the low nibble, bit offset 4 the high nibble. For all other widths `first`
//! and `step` must be byte multiples.
//!
//! The multi-channel variants collapse runs of adjacent channels (same plane,
//! same step, `first` advancing by exactly one sample width) into a single
//! kernel call over `frames * channels` samples, which turns a silence or
//! copy over a fully-interleaved buffer into one bulk pass.

use crate::format::Format;

/// Bit-strided placement of one channel inside its plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Bit offset of the first sample of frame zero.
    pub first: usize,
    /// Bit distance between consecutive frames.
    pub step: usize,
}

impl Layout {
    /// Construct a layout.
    pub const fn new(first: usize, step: usize) -> Self {
        Layout { first, step }
    }
}

/// One channel of a multi-channel buffer: a plane reference plus a layout.
///
/// `plane` is an index into the plane set handed to the multi-channel
/// kernels; `None` marks a channel without storage, for which silence is a
/// no-op and copies are skipped or silenced per the kernel contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelArea {
    /// Index into the plane set, or `None` when the channel has no storage.
    pub plane: Option<usize>,
    /// Placement within the plane.
    pub layout: Layout,
}

impl ChannelArea {
    /// Construct an area over the given plane.
    pub const fn new(plane: usize, first: usize, step: usize) -> Self {
        ChannelArea {
            plane: Some(plane),
            layout: Layout::new(first, step),
        }
    }

    /// Construct an area without storage.
    pub const fn unmapped(first: usize, step: usize) -> Self {
        ChannelArea {
            plane: None,
            layout: Layout::new(first, step),
        }
    }
}

fn width_of(format: Format) -> usize {
    let width = format
        .physical_width()
        .unwrap_or_else(|| panic!("format {format} has no physical width")) as usize;
    assert!(
        matches!(width, 4 | 8 | 16 | 32 | 64),
        "unsupported kernel width {width}"
    );
    width
}

/// Fill `samples` samples of one channel with the format's silence pattern.
///
/// `offset` counts frames from the start of the layout. A `None` destination
/// is a no-op. Panics if the format has no fixed width the kernels support.
pub fn area_silence(
    dst: Option<&mut [u8]>,
    layout: Layout,
    offset: usize,
    samples: usize,
    format: Format,
) {
    let Some(dst) = dst else { return };
    if samples == 0 {
        return;
    }
    let width = width_of(format);
    let pattern = format.silence_64().to_le_bytes();
    let mut samples = samples;
    let mut bit = layout.first + offset * layout.step;

    // Contiguous channel: stamp whole bytes in bulk. Sub-byte starts (width 4
    // only) take the nibble path for the whole run instead.
    if layout.step == width && bit % 8 == 0 {
        let start = bit / 8;
        let nbytes = samples * width / 8;
        for (i, b) in dst[start..start + nbytes].iter_mut().enumerate() {
            *b = pattern[i % 8];
        }
        let done = nbytes * 8 / width;
        samples -= done;
        bit += done * width;
        if samples == 0 {
            return;
        }
    }

    if width == 4 {
        let nib = (format.silence_64() & 0x0f) as u8;
        let byte_step = layout.step / 8;
        let bit_step = layout.step % 8;
        let mut pos = bit / 8;
        let mut dstbit = bit % 8;
        while samples > 0 {
            if dstbit != 0 {
                dst[pos] = (dst[pos] & 0x0f) | (nib << 4);
            } else {
                dst[pos] = (dst[pos] & 0xf0) | nib;
            }
            pos += byte_step;
            dstbit += bit_step;
            if dstbit == 8 {
                pos += 1;
                dstbit = 0;
            }
            samples -= 1;
        }
    } else {
        let bytes = width / 8;
        let byte_step = layout.step / 8;
        let mut pos = bit / 8;
        while samples > 0 {
            dst[pos..pos + bytes].copy_from_slice(&pattern[..bytes]);
            pos += byte_step;
            samples -= 1;
        }
    }
}

/// Copy `samples` samples of one channel between two strided areas.
///
/// A `None` source silences the destination; a `None` destination is a
/// no-op. Source and destination layouts may differ in stride, which is how
/// backends convert between interleaved and non-interleaved placements.
pub fn area_copy(
    src: Option<&[u8]>,
    src_layout: Layout,
    src_offset: usize,
    dst: Option<&mut [u8]>,
    dst_layout: Layout,
    dst_offset: usize,
    samples: usize,
    format: Format,
) {
    let Some(src) = src else {
        return area_silence(dst, dst_layout, dst_offset, samples, format);
    };
    let Some(dst) = dst else { return };
    if samples == 0 {
        return;
    }
    let width = width_of(format);
    let mut samples = samples;
    let mut sbit = src_layout.first + src_offset * src_layout.step;
    let mut dbit = dst_layout.first + dst_offset * dst_layout.step;

    // Both sides contiguous: one bulk byte copy, tail falls through.
    if src_layout.step == width && dst_layout.step == width && sbit % 8 == 0 && dbit % 8 == 0 {
        let nbytes = samples * width / 8;
        dst[dbit / 8..dbit / 8 + nbytes].copy_from_slice(&src[sbit / 8..sbit / 8 + nbytes]);
        let done = nbytes * 8 / width;
        samples -= done;
        sbit += done * width;
        dbit += done * width;
        if samples == 0 {
            return;
        }
    }

    if width == 4 {
        let s_byte_step = src_layout.step / 8;
        let s_bit_step = src_layout.step % 8;
        let d_byte_step = dst_layout.step / 8;
        let d_bit_step = dst_layout.step % 8;
        let mut spos = sbit / 8;
        let mut srcbit = sbit % 8;
        let mut dpos = dbit / 8;
        let mut dstbit = dbit % 8;
        while samples > 0 {
            let nib = if srcbit != 0 {
                (src[spos] >> 4) & 0x0f
            } else {
                src[spos] & 0x0f
            };
            if dstbit != 0 {
                dst[dpos] = (dst[dpos] & 0x0f) | (nib << 4);
            } else {
                dst[dpos] = (dst[dpos] & 0xf0) | nib;
            }
            spos += s_byte_step;
            srcbit += s_bit_step;
            if srcbit == 8 {
                spos += 1;
                srcbit = 0;
            }
            dpos += d_byte_step;
            dstbit += d_bit_step;
            if dstbit == 8 {
                dpos += 1;
                dstbit = 0;
            }
            samples -= 1;
        }
    } else {
        let bytes = width / 8;
        let s_byte_step = src_layout.step / 8;
        let d_byte_step = dst_layout.step / 8;
        let mut spos = sbit / 8;
        let mut dpos = dbit / 8;
        while samples > 0 {
            dst[dpos..dpos + bytes].copy_from_slice(&src[spos..spos + bytes]);
            spos += s_byte_step;
            dpos += d_byte_step;
            samples -= 1;
        }
    }
}

/// Length of the run of channels starting at `at` that are adjacent in
/// memory: same plane, same step, `first` advancing by exactly `width`.
fn adjacent_run(areas: &[ChannelArea], at: usize, width: usize) -> usize {
    let begin = areas[at];
    let mut run = 1;
    while at + run < areas.len() {
        let prev = areas[at + run - 1];
        let next = areas[at + run];
        if next.plane != begin.plane
            || next.layout.step != begin.layout.step
            || next.layout.first != prev.layout.first + width
        {
            break;
        }
        run += 1;
    }
    run
}

/// Silence `frames` frames across all channels.
///
/// Runs of adjacent interleaved channels are collapsed into a single kernel
/// call covering `frames * run` samples with an effective step of one sample
/// width. `offset` counts frames.
pub fn areas_silence(
    planes: &mut [&mut [u8]],
    areas: &[ChannelArea],
    offset: usize,
    frames: usize,
    format: Format,
) {
    let width = width_of(format);
    let mut ch = 0;
    while ch < areas.len() {
        let begin = areas[ch];
        let run = adjacent_run(areas, ch, width);
        if run > 1 && run * width == begin.layout.step {
            let dst = match begin.plane {
                Some(p) => Some(&mut *planes[p]),
                None => None,
            };
            area_silence(
                dst,
                Layout::new(begin.layout.first, width),
                offset * run,
                frames * run,
                format,
            );
            ch += run;
        } else {
            let dst = match begin.plane {
                Some(p) => Some(&mut *planes[p]),
                None => None,
            };
            area_silence(dst, begin.layout, offset, frames, format);
            ch += 1;
        }
    }
}

/// Copy `frames` frames across all channels between two area sets.
///
/// Adjacency collapse requires the run to match on *both* sides: same source
/// and destination planes and steps, with both `first` sequences advancing by
/// one sample width. Any mismatch falls back to per-channel copies.
pub fn areas_copy(
    src_planes: &[&[u8]],
    src_areas: &[ChannelArea],
    src_offset: usize,
    dst_planes: &mut [&mut [u8]],
    dst_areas: &[ChannelArea],
    dst_offset: usize,
    frames: usize,
    format: Format,
) {
    assert_eq!(
        src_areas.len(),
        dst_areas.len(),
        "source and destination channel counts differ"
    );
    let width = width_of(format);
    let mut ch = 0;
    while ch < src_areas.len() {
        let s0 = src_areas[ch];
        let d0 = dst_areas[ch];
        let mut run = 1;
        if d0.layout.step == s0.layout.step {
            let srun = adjacent_run(src_areas, ch, width);
            let drun = adjacent_run(dst_areas, ch, width);
            run = srun.min(drun);
        }
        let (count, s_layout, d_layout, s_off, d_off, n) =
            if run > 1 && run * width == s0.layout.step {
                (
                    run,
                    Layout::new(s0.layout.first, width),
                    Layout::new(d0.layout.first, width),
                    src_offset * run,
                    dst_offset * run,
                    frames * run,
                )
            } else {
                (1, s0.layout, d0.layout, src_offset, dst_offset, frames)
            };
        let src = s0.plane.map(|p| &*src_planes[p]);
        let dst = match d0.plane {
            Some(p) => Some(&mut *dst_planes[p]),
            None => None,
        };
        area_copy(src, s_layout, s_off, dst, d_layout, d_off, n, format);
        ch += count;
    }
}
