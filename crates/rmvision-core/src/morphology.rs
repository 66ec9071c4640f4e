//! Binary-mask cleanup with square structuring elements.
//!
//! Square elements are separable, so every operation runs as a horizontal
//! pass into an arena buffer followed by a vertical pass. Pixels outside the
//! image never take part in a window.

use bumpalo::Bump;
use multiversion::multiversion;

#[derive(Clone, Copy)]
enum Extremum {
    Max,
    Min,
}

/// Window `[x - before, x + after]` for a `size`-wide element anchored at its center.
#[inline]
fn reach(size: usize) -> (usize, usize) {
    let before = size / 2;
    (before, size - 1 - before)
}

#[multiversion(targets(
    "x86_64+avx2+bmi1+bmi2+popcnt+lzcnt",
    "x86_64+avx512f+avx512bw+avx512dq+avx512vl",
    "aarch64+neon"
))]
fn extremum_row(src: &[u8], dst: &mut [u8], before: usize, after: usize, op: Extremum) {
    let w = src.len();
    for x in 0..w {
        let lo = x.saturating_sub(before);
        let hi = (x + after).min(w - 1);
        let window = &src[lo..=hi];
        dst[x] = match op {
            Extremum::Max => window.iter().copied().max().unwrap_or(0),
            Extremum::Min => window.iter().copied().min().unwrap_or(0),
        };
    }
}

fn separable_pass(arena: &Bump, buf: &mut [u8], width: usize, height: usize, size: usize, op: Extremum) {
    if size <= 1 || width == 0 || height == 0 {
        return;
    }
    let (before, after) = reach(size);
    let temp = arena.alloc_slice_fill_copy(width * height, 0u8);

    // Pass 1: Horizontal
    for (src, dst) in buf.chunks_exact(width).zip(temp.chunks_exact_mut(width)) {
        extremum_row(src, dst, before, after, op);
    }

    // Pass 2: Vertical, accumulated row by row
    for y in 0..height {
        let lo = y.saturating_sub(before);
        let hi = (y + after).min(height - 1);
        let dst = &mut buf[y * width..(y + 1) * width];
        dst.copy_from_slice(&temp[lo * width..(lo + 1) * width]);
        for ny in lo + 1..=hi {
            let row = &temp[ny * width..(ny + 1) * width];
            match op {
                Extremum::Max => dst.iter_mut().zip(row).for_each(|(d, &s)| *d = (*d).max(s)),
                Extremum::Min => dst.iter_mut().zip(row).for_each(|(d, &s)| *d = (*d).min(s)),
            }
        }
    }
}

/// Dilate a dense mask in place with a `size x size` square element.
pub fn dilate(arena: &Bump, buf: &mut [u8], width: usize, height: usize, size: usize) {
    separable_pass(arena, buf, width, height, size, Extremum::Max);
}

/// Erode a dense mask in place with a `size x size` square element.
pub fn erode(arena: &Bump, buf: &mut [u8], width: usize, height: usize, size: usize) {
    separable_pass(arena, buf, width, height, size, Extremum::Min);
}

/// Morphological closing (dilate, then erode) in place.
pub fn close(arena: &Bump, buf: &mut [u8], width: usize, height: usize, size: usize) {
    dilate(arena, buf, width, height, size);
    erode(arena, buf, width, height, size);
}

/// Merge fragmented blade regions: dilate with the small element, then close
/// with the large one.
pub fn clean_mask(
    arena: &Bump,
    buf: &mut [u8],
    width: usize,
    height: usize,
    dilate_size: usize,
    close_size: usize,
) {
    dilate(arena, buf, width, height, dilate_size);
    close(arena, buf, width, height, close_size);
}
