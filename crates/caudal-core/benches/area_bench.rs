//! Criterion benchmarks for the channel-area kernels
//!
//! Run with: cargo bench -p caudal-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use caudal_core::{ChannelArea, Format, Layout, area_silence, areas_copy, areas_silence};

const FRAME_COUNTS: &[usize] = &[256, 1024, 4096];
const CHANNELS: usize = 2;

fn interleaved_areas(width: usize) -> Vec<ChannelArea> {
    (0..CHANNELS)
        .map(|ch| ChannelArea::new(0, ch * width, CHANNELS * width))
        .collect()
}

fn bench_silence(c: &mut Criterion) {
    let mut group = c.benchmark_group("silence");

    for &frames in FRAME_COUNTS {
        let bytes = frames * CHANNELS * 2;
        group.bench_with_input(
            BenchmarkId::new("collapsed_s16", frames),
            &frames,
            |b, &frames| {
                let areas = interleaved_areas(16);
                let mut buf = vec![0u8; bytes];
                b.iter(|| {
                    let mut planes: [&mut [u8]; 1] = [&mut buf];
                    areas_silence(&mut planes, &areas, 0, black_box(frames), Format::S16Le);
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("strided_s16", frames),
            &frames,
            |b, &frames| {
                let mut buf = vec![0u8; bytes];
                b.iter(|| {
                    area_silence(
                        Some(&mut buf),
                        Layout::new(0, CHANNELS * 16),
                        0,
                        black_box(frames),
                        Format::S16Le,
                    );
                });
            },
        );
    }

    group.finish();
}

fn bench_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("copy");

    for &frames in FRAME_COUNTS {
        let bytes = frames * CHANNELS * 2;
        group.bench_with_input(
            BenchmarkId::new("collapsed_s16", frames),
            &frames,
            |b, &frames| {
                let areas = interleaved_areas(16);
                let src = vec![0x5au8; bytes];
                let mut dst = vec![0u8; bytes];
                b.iter(|| {
                    let src_planes: [&[u8]; 1] = [&src];
                    let mut dst_planes: [&mut [u8]; 1] = [&mut dst];
                    areas_copy(
                        &src_planes,
                        &areas,
                        0,
                        &mut dst_planes,
                        &areas,
                        0,
                        black_box(frames),
                        Format::S16Le,
                    );
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_silence, bench_copy);
criterion_main!(benches);
