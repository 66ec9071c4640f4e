//! Channel isolation and fixed-level binarization.

use crate::color::Color;
use crate::image::{BgrImageView, ImageView};
use multiversion::multiversion;

/// Write `target - complement` (saturating) for every pixel of a BGR row.
#[multiversion(targets(
    "x86_64+avx2+bmi1+bmi2+popcnt+lzcnt",
    "x86_64+avx512f+avx512bw+avx512dq+avx512vl",
    "aarch64+neon"
))]
fn subtract_channels_row(src: &[u8], dst: &mut [u8], target: usize, complement: usize) {
    for (px, out) in src.chunks_exact(3).zip(dst.iter_mut()) {
        *out = px[target].saturating_sub(px[complement]);
    }
}

/// Thresholding for a full row: `src > thresh` becomes 255, everything else 0.
#[multiversion(targets(
    "x86_64+avx2+bmi1+bmi2+popcnt+lzcnt",
    "x86_64+avx512f+avx512bw+avx512dq+avx512vl",
    "aarch64+neon"
))]
fn binarize_row(src: &[u8], dst: &mut [u8], thresh: u8) {
    for (s, d) in src.iter().zip(dst.iter_mut()) {
        // Branchless: 0xFF if above, 0x00 otherwise
        *d = u8::from(*s > thresh).wrapping_neg();
    }
}

/// Isolate the target color into a dense single-channel buffer.
///
/// Red targets keep `R - B`, blue targets `B - R`; negative differences clamp to zero.
pub fn isolate_channel(img: &BgrImageView, color: Color, dst: &mut [u8]) {
    let (target, complement) = match color {
        Color::Red => (2, 0),
        Color::Blue => (0, 2),
    };
    let w = img.width;
    for y in 0..img.height {
        subtract_channels_row(img.get_row(y), &mut dst[y * w..(y + 1) * w], target, complement);
    }
}

/// Copy a gray image into a dense buffer and binarize it.
pub fn binarize(img: &ImageView, thresh: u8, dst: &mut [u8]) {
    let w = img.width;
    for y in 0..img.height {
        binarize_row(img.get_row(y), &mut dst[y * w..(y + 1) * w], thresh);
    }
}

/// Binarize a dense buffer in place.
pub fn binarize_in_place(buf: &mut [u8], thresh: u8) {
    for v in buf.iter_mut() {
        *v = u8::from(*v > thresh).wrapping_neg();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_isolate_red_and_blue() {
        // Two BGR pixels per row, one padding byte.
        let data = vec![
            10, 0, 200, 200, 0, 10, 0, //
            50, 0, 50, 0, 0, 255, 0,
        ];
        let img = BgrImageView::new(&data, 2, 2, 7).unwrap();

        let mut red = vec![0u8; 4];
        isolate_channel(&img, Color::Red, &mut red);
        assert_eq!(red, vec![190, 0, 0, 255]);

        let mut blue = vec![0u8; 4];
        isolate_channel(&img, Color::Blue, &mut blue);
        assert_eq!(blue, vec![0, 190, 0, 0]);
    }

    #[test]
    fn test_binarize_is_strict() {
        let data = vec![99, 100, 101, 0, 255, 0, 0, 0];
        let img = ImageView::new(&data, 3, 2, 4).unwrap();
        let mut out = vec![7u8; 6];
        binarize(&img, 100, &mut out);
        assert_eq!(out, vec![0, 0, 255, 255, 0, 0]);
    }

    proptest! {
        #[test]
        fn prop_binarize_in_place_matches_rows(data in prop::collection::vec(any::<u8>(), 1..256), thresh in any::<u8>()) {
            let img = ImageView::new(&data, data.len(), 1, data.len()).unwrap();
            let mut a = vec![0u8; data.len()];
            binarize(&img, thresh, &mut a);
            let mut b = data.clone();
            binarize_in_place(&mut b, thresh);
            prop_assert_eq!(&a, &b);
            prop_assert!(a.iter().all(|&v| v == 0 || v == 255));
        }
    }
}
