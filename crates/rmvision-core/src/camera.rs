//! Pinhole camera intrinsics with Brown–Conrady distortion.

use nalgebra::{Matrix3, Vector3};

/// Camera intrinsics parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraIntrinsics {
    /// Focal length in x (pixels).
    pub fx: f64,
    /// Focal length in y (pixels).
    pub fy: f64,
    /// Principal point x (pixels).
    pub cx: f64,
    /// Principal point y (pixels).
    pub cy: f64,
}

impl CameraIntrinsics {
    /// Create new intrinsics.
    #[must_use]
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Read intrinsics from a 3x3 camera matrix `[[fx, 0, cx], [0, fy, cy], [0, 0, 1]]`.
    #[must_use]
    pub fn from_matrix(k: &Matrix3<f64>) -> Self {
        Self::new(k[(0, 0)], k[(1, 1)], k[(0, 2)], k[(1, 2)])
    }

    /// Returns `true` when all parameters are finite and focal lengths are non-zero.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.fx.is_finite()
            && self.fy.is_finite()
            && self.cx.is_finite()
            && self.cy.is_finite()
            && self.fx.abs() > 1e-12
            && self.fy.abs() > 1e-12
    }

    /// Convert to a 3x3 matrix.
    #[must_use]
    pub fn as_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(self.fx, 0.0, self.cx, 0.0, self.fy, self.cy, 0.0, 0.0, 1.0)
    }

    /// Get inverse matrix.
    #[must_use]
    pub fn inv_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            1.0 / self.fx,
            0.0,
            -self.cx / self.fx,
            0.0,
            1.0 / self.fy,
            -self.cy / self.fy,
            0.0,
            0.0,
            1.0,
        )
    }

    /// Pixel to normalized pinhole coordinates.
    #[must_use]
    pub fn pixel_to_normalized(&self, pixel: [f64; 2]) -> [f64; 2] {
        [(pixel[0] - self.cx) / self.fx, (pixel[1] - self.cy) / self.fy]
    }

    /// Normalized pinhole coordinates to pixels.
    #[must_use]
    pub fn normalized_to_pixel(&self, normalized: [f64; 2]) -> [f64; 2] {
        [
            self.fx * normalized[0] + self.cx,
            self.fy * normalized[1] + self.cy,
        ]
    }
}

/// Brown–Conrady radial-tangential distortion coefficients (OpenCV order).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Distortion {
    /// Radial coefficient k1.
    pub k1: f64,
    /// Radial coefficient k2.
    pub k2: f64,
    /// Tangential coefficient p1.
    pub p1: f64,
    /// Tangential coefficient p2.
    pub p2: f64,
    /// Radial coefficient k3.
    pub k3: f64,
}

impl Distortion {
    /// Read `[k1, k2, p1, p2, k3, ...]`; missing trailing entries are zero and
    /// higher-order rational/prism terms are ignored.
    #[must_use]
    pub fn from_coefficients(coeffs: &[f64]) -> Self {
        let at = |i: usize| coeffs.get(i).copied().unwrap_or(0.0);
        Self {
            k1: at(0),
            k2: at(1),
            p1: at(2),
            p2: at(3),
            k3: at(4),
        }
    }

    /// True when every coefficient is zero.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Apply distortion to normalized coordinates.
    #[must_use]
    pub fn distort_normalized(&self, xy: [f64; 2]) -> [f64; 2] {
        let [x, y] = xy;
        let r2 = x * x + y * y;
        let radial = 1.0 + r2 * (self.k1 + r2 * (self.k2 + r2 * self.k3));
        let x_tan = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let y_tan = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
        [x * radial + x_tan, y * radial + y_tan]
    }
}

const UNDISTORT_MAX_ITERS: usize = 15;
const UNDISTORT_EPS: f64 = 1e-12;

/// Complete camera model (intrinsics + distortion).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraModel {
    /// Camera intrinsics.
    pub intrinsics: CameraIntrinsics,
    /// Distortion coefficients.
    pub distortion: Distortion,
}

impl CameraModel {
    /// Create a camera model.
    #[must_use]
    pub fn new(intrinsics: CameraIntrinsics, distortion: Distortion) -> Self {
        Self {
            intrinsics,
            distortion,
        }
    }

    /// Build from a calibration file's camera matrix and coefficient row.
    #[must_use]
    pub fn from_calibration(k: &Matrix3<f64>, coeffs: &[f64]) -> Self {
        Self::new(
            CameraIntrinsics::from_matrix(k),
            Distortion::from_coefficients(coeffs),
        )
    }

    /// Map a distorted pixel to undistorted normalized coordinates by fixed-point iteration.
    ///
    /// Returns `None` when the intrinsics are invalid or the iteration diverges.
    #[must_use]
    pub fn undistort_to_normalized(&self, pixel: [f64; 2]) -> Option<[f64; 2]> {
        if !self.intrinsics.is_valid() {
            return None;
        }
        let xd = self.intrinsics.pixel_to_normalized(pixel);
        if self.distortion.is_identity() {
            return Some(xd);
        }

        let d = &self.distortion;
        let (mut x, mut y) = (xd[0], xd[1]);
        for _ in 0..UNDISTORT_MAX_ITERS {
            let r2 = x * x + y * y;
            let radial = 1.0 + r2 * (d.k1 + r2 * (d.k2 + r2 * d.k3));
            if !radial.is_finite() || radial.abs() < 1e-12 {
                return None;
            }
            let dx_tan = 2.0 * d.p1 * x * y + d.p2 * (r2 + 2.0 * x * x);
            let dy_tan = d.p1 * (r2 + 2.0 * y * y) + 2.0 * d.p2 * x * y;
            let x_next = (xd[0] - dx_tan) / radial;
            let y_next = (xd[1] - dy_tan) / radial;
            if !x_next.is_finite() || !y_next.is_finite() {
                return None;
            }
            let step = (x_next - x).hypot(y_next - y);
            x = x_next;
            y = y_next;
            if step <= UNDISTORT_EPS {
                break;
            }
        }
        Some([x, y])
    }

    /// Project a camera-frame point into distorted pixel coordinates.
    #[must_use]
    pub fn project(&self, p_cam: &Vector3<f64>) -> [f64; 2] {
        let xn = [p_cam.x / p_cam.z, p_cam.y / p_cam.z];
        self.intrinsics
            .normalized_to_pixel(self.distortion.distort_normalized(xn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_camera() -> CameraModel {
        CameraModel::new(
            CameraIntrinsics::new(1280.0, 1275.0, 640.0, 512.0),
            Distortion {
                k1: -0.11,
                k2: 0.08,
                p1: 0.0007,
                p2: -0.0011,
                k3: 0.0,
            },
        )
    }

    #[test]
    fn test_from_calibration() {
        let k = Matrix3::new(900.0, 0.0, 320.0, 0.0, 905.0, 240.0, 0.0, 0.0, 1.0);
        let cam = CameraModel::from_calibration(&k, &[0.1, -0.2, 0.001, 0.002]);
        assert_eq!(cam.intrinsics, CameraIntrinsics::new(900.0, 905.0, 320.0, 240.0));
        assert_eq!(cam.distortion.k3, 0.0);
        assert_eq!(cam.distortion.p2, 0.002);
        assert_eq!(cam.intrinsics.as_matrix(), k);
    }

    #[test]
    fn test_invalid_intrinsics_rejected() {
        let cam = CameraModel::new(CameraIntrinsics::new(0.0, 500.0, 0.0, 0.0), Distortion::default());
        assert!(cam.undistort_to_normalized([10.0, 10.0]).is_none());
    }

    #[test]
    fn test_project_undistort_roundtrip() {
        let cam = sample_camera();
        let p = Vector3::new(0.3, -0.2, 2.5);
        let pix = cam.project(&p);
        let n = cam.undistort_to_normalized(pix).unwrap();
        assert!((n[0] - 0.12).abs() < 1e-7, "x = {}", n[0]);
        assert!((n[1] + 0.08).abs() < 1e-7, "y = {}", n[1]);
    }

    proptest! {
        #[test]
        fn prop_intrinsics_inversion(
            fx in 100.0..2000.0f64,
            fy in 100.0..2000.0f64,
            cx in 0.0..1000.0f64,
            cy in 0.0..1000.0f64
        ) {
            let intrinsics = CameraIntrinsics::new(fx, fy, cx, cy);
            let identity = intrinsics.as_matrix() * intrinsics.inv_matrix();
            let expected = Matrix3::<f64>::identity();
            for i in 0..3 {
                for j in 0..3 {
                    prop_assert!((identity[(i, j)] - expected[(i, j)]).abs() < 1e-9);
                }
            }
        }

        #[test]
        fn prop_undistort_inverts_distort(x in -0.4..0.4f64, y in -0.3..0.3f64) {
            let cam = sample_camera();
            let d = cam.distortion.distort_normalized([x, y]);
            let pix = cam.intrinsics.normalized_to_pixel(d);
            let n = cam.undistort_to_normalized(pix).unwrap();
            prop_assert!((n[0] - x).abs() < 1e-6);
            prop_assert!((n[1] - y).abs() < 1e-6);
        }
    }
}
