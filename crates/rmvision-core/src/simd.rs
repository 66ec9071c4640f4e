//! Batched trigonometry over 4-lane `f32` vectors.
//!
//! The lane kernels are branch-light Cephes-style polynomial approximations, so
//! the `multiversion` clones of the batch functions can be auto-vectorized for
//! AVX2/AVX-512/NEON. On targets without those instruction sets the default
//! clone runs the same kernels lane by lane, which is the scalar fallback.
//!
//! Results match the standard library within `f32` precision for arguments in
//! the range a gimbal or image-plane calculation produces (|x| < 8192).

use multiversion::multiversion;

/// Four packed `f32` lanes.
pub type F32x4 = [f32; 4];

const FOUR_OVER_PI: f32 = 1.273_239_5;
const DP1: f32 = 0.785_156_25;
const DP2: f32 = 2.418_756_5e-4;
const DP3: f32 = 3.774_895e-8;

const SIN_P0: f32 = -1.951_529_6e-4;
const SIN_P1: f32 = 8.332_161e-3;
const SIN_P2: f32 = -1.666_665_5e-1;

const COS_P0: f32 = 2.443_315_7e-5;
const COS_P1: f32 = -1.388_731_6e-3;
const COS_P2: f32 = 4.166_664_6e-2;

const TAN_3PI_8: f32 = 2.414_213_6;
const TAN_PI_8: f32 = 0.414_213_57;

const ATAN_P0: f32 = 8.053_744_5e-2;
const ATAN_P1: f32 = -1.387_768_5e-1;
const ATAN_P2: f32 = 1.997_771_1e-1;
const ATAN_P3: f32 = -3.333_295e-1;

#[inline(always)]
fn sin_cos_lane(x: f32) -> (f32, f32) {
    let negative = x < 0.0;
    let ax = x.abs();

    // Octant index, rounded up to even so the reduced argument lies in [-pi/4, pi/4].
    #[allow(clippy::cast_possible_truncation)]
    let mut j = (ax * FOUR_OVER_PI) as i32;
    j = (j + 1) & !1;
    #[allow(clippy::cast_precision_loss)]
    let y = j as f32;

    let flip_sin = (j & 4) != 0;
    let flip_cos = ((j - 2) & 4) == 0;
    let use_sin_poly = (j & 2) == 0;

    let r = ((ax - y * DP1) - y * DP2) - y * DP3;
    let z = r * r;

    let poly_cos = ((COS_P0 * z + COS_P1) * z + COS_P2) * z * z - 0.5 * z + 1.0;
    let poly_sin = ((SIN_P0 * z + SIN_P1) * z + SIN_P2) * z * r + r;

    let (mut s, mut c) = if use_sin_poly {
        (poly_sin, poly_cos)
    } else {
        (poly_cos, poly_sin)
    };
    if negative != flip_sin {
        s = -s;
    }
    if flip_cos {
        c = -c;
    }
    (s, c)
}

#[inline(always)]
fn atan_lane(x: f32) -> f32 {
    let negative = x < 0.0;
    let mut ax = x.abs();

    let base = if ax > TAN_3PI_8 {
        ax = -1.0 / ax;
        std::f32::consts::FRAC_PI_2
    } else if ax > TAN_PI_8 {
        ax = (ax - 1.0) / (ax + 1.0);
        std::f32::consts::FRAC_PI_4
    } else {
        0.0
    };

    let z = ax * ax;
    let y = base + (((ATAN_P0 * z + ATAN_P1) * z + ATAN_P2) * z + ATAN_P3) * z * ax + ax;
    if negative {
        -y
    } else {
        y
    }
}

#[inline(always)]
fn atan2_lane(y: f32, x: f32) -> f32 {
    if x == 0.0 {
        return if y > 0.0 {
            std::f32::consts::FRAC_PI_2
        } else if y < 0.0 {
            -std::f32::consts::FRAC_PI_2
        } else {
            0.0
        };
    }
    let offset = if x < 0.0 {
        if y < 0.0 {
            -std::f32::consts::PI
        } else {
            std::f32::consts::PI
        }
    } else {
        0.0
    };
    offset + atan_lane(y / x)
}

/// Sine and cosine of four angles (radians) at once.
#[multiversion(targets(
    "x86_64+avx2+bmi1+bmi2+popcnt+lzcnt",
    "x86_64+avx512f+avx512bw+avx512dq+avx512vl",
    "aarch64+neon"
))]
#[must_use]
pub fn sin_cos_x4(x: &F32x4) -> (F32x4, F32x4) {
    let mut s = [0.0f32; 4];
    let mut c = [0.0f32; 4];
    for i in 0..4 {
        let (si, ci) = sin_cos_lane(x[i]);
        s[i] = si;
        c[i] = ci;
    }
    (s, c)
}

/// Sine of four angles, in place.
#[multiversion(targets = "simd")]
pub fn sin_x4(x: &mut F32x4) {
    for v in x.iter_mut() {
        *v = sin_cos_lane(*v).0;
    }
}

/// Cosine of four angles, in place.
#[multiversion(targets = "simd")]
pub fn cos_x4(x: &mut F32x4) {
    for v in x.iter_mut() {
        *v = sin_cos_lane(*v).1;
    }
}

/// Tangent of four angles, in place.
#[multiversion(targets = "simd")]
pub fn tan_x4(x: &mut F32x4) {
    for v in x.iter_mut() {
        let (s, c) = sin_cos_lane(*v);
        *v = s / c;
    }
}

/// Cotangent of four angles, in place.
#[multiversion(targets = "simd")]
pub fn cot_x4(x: &mut F32x4) {
    for v in x.iter_mut() {
        let (s, c) = sin_cos_lane(*v);
        *v = c / s;
    }
}

/// Arc tangent of four values, in place.
#[multiversion(targets = "simd")]
pub fn atan_x4(x: &mut F32x4) {
    for v in x.iter_mut() {
        *v = atan_lane(*v);
    }
}

/// Four-quadrant arc tangent of `y / x`, lane by lane.
#[multiversion(targets = "simd")]
#[must_use]
pub fn atan2_x4(y: &F32x4, x: &F32x4) -> F32x4 {
    let mut out = [0.0f32; 4];
    for i in 0..4 {
        out[i] = atan2_lane(y[i], x[i]);
    }
    out
}

/// Square root of four values, in place.
#[multiversion(targets = "simd")]
pub fn sqrt_x4(x: &mut F32x4) {
    for v in x.iter_mut() {
        *v = v.sqrt();
    }
}

/// Reciprocal square root of four values, in place.
#[multiversion(targets = "simd")]
pub fn rsqrt_x4(x: &mut F32x4) {
    for v in x.iter_mut() {
        *v = 1.0 / v.sqrt();
    }
}

/// Single-value four-quadrant arc tangent using the batch kernel.
#[inline]
#[must_use]
pub fn atan2(y: f32, x: f32) -> f32 {
    atan2_lane(y, x)
}

/// Single-value square root.
#[inline]
#[must_use]
pub fn sqrt(x: f32) -> f32 {
    x.sqrt()
}

/// Single-value reciprocal square root.
#[inline]
#[must_use]
pub fn rsqrt(x: f32) -> f32 {
    1.0 / x.sqrt()
}
