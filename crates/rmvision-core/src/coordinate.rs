//! Frame transforms between the camera, the IMU and the world.
//!
//! Conventions: yaw is about the camera Y axis, roll about Z and pitch about X.
//! A world-frame rotation is composed as `R_yaw · R_pitch · R_roll`.

use crate::simd;
use nalgebra::{Matrix3, Quaternion, RealField, Vector3};

/// Translation in meters.
pub type TranslationVector = Vector3<f64>;
/// Axis-angle rotation (direction = axis, norm = angle in radians).
pub type RotationVector = Vector3<f64>;
/// 3x3 rotation matrix.
pub type RotationMatrix = Matrix3<f64>;

/// Fixed camera→IMU mounting transform.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImuExtrinsic {
    /// Rotation from camera axes to IMU axes.
    pub rotation: RotationMatrix,
    /// Camera origin expressed in the IMU frame (meters).
    pub translation: TranslationVector,
}

impl Default for ImuExtrinsic {
    /// Infantry gimbal mount: axes aligned, camera 26 mm above and 75 mm ahead of the IMU.
    fn default() -> Self {
        Self {
            rotation: RotationMatrix::identity(),
            translation: TranslationVector::new(0.0, -0.026, 0.075),
        }
    }
}

impl ImuExtrinsic {
    /// Camera-frame translation to world frame for the given IMU orientation.
    #[must_use]
    pub fn camera_to_world(&self, tv_cam: &TranslationVector, rm_imu: &RotationMatrix) -> TranslationVector {
        camera_to_world(tv_cam, rm_imu, &self.translation, &self.rotation)
    }

    /// World-frame translation back to the camera frame.
    #[must_use]
    pub fn world_to_camera(&self, tv_world: &TranslationVector, rm_imu: &RotationMatrix) -> TranslationVector {
        world_to_camera(tv_world, rm_imu, &self.translation, &self.rotation)
    }
}

/// Gimbal Euler angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    /// Rotation about Y.
    pub yaw: f64,
    /// Rotation about Z.
    pub roll: f64,
    /// Rotation about X.
    pub pitch: f64,
}

/// Decompose an IMU quaternion into yaw, roll and pitch.
#[must_use]
pub fn quaternion_to_euler(q: &Quaternion<f32>) -> EulerAngles {
    let (w, x, y, z) = (f64::from(q.w), f64::from(q.i), f64::from(q.j), f64::from(q.k));
    EulerAngles {
        yaw: (2.0 * (w * z + x * y)).atan2(2.0 * (w * w + x * x) - 1.0),
        // Clamped so a slightly non-unit quaternion cannot produce NaN.
        roll: (-2.0 * (x * z - w * y)).clamp(-1.0, 1.0).asin(),
        pitch: (2.0 * (w * x + y * z)).atan2(2.0 * (w * w + z * z) - 1.0),
    }
}

/// Compose `R_yaw · R_pitch · R_roll` with one batched sine/cosine evaluation.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn euler_to_rotation_matrix(e: &EulerAngles) -> RotationMatrix {
    let (s, c) = simd::sin_cos_x4(&[e.yaw as f32, e.roll as f32, e.pitch as f32, 0.0]);
    let (s, c) = (s.map(f64::from), c.map(f64::from));

    let r_yaw = Matrix3::new(c[0], 0.0, s[0], 0.0, 1.0, 0.0, -s[0], 0.0, c[0]);
    let r_roll = Matrix3::new(c[1], -s[1], 0.0, s[1], c[1], 0.0, 0.0, 0.0, 1.0);
    let r_pitch = Matrix3::new(1.0, 0.0, 0.0, 0.0, c[2], -s[2], 0.0, s[2], c[2]);

    r_yaw * r_pitch * r_roll
}

/// IMU orientation quaternion to the world rotation matrix.
#[must_use]
pub fn quaternion_to_rotation_matrix(q: &Quaternion<f32>) -> RotationMatrix {
    euler_to_rotation_matrix(&quaternion_to_euler(q))
}

/// `(R_cam→imu · R_imu)ᵀ · (tv_cam + t_cam→imu)`.
#[must_use]
pub fn camera_to_world(
    tv_cam: &TranslationVector,
    rm_imu: &RotationMatrix,
    tm_cam_to_imu: &TranslationVector,
    rm_cam_to_imu: &RotationMatrix,
) -> TranslationVector {
    (rm_cam_to_imu * rm_imu).transpose() * (tv_cam + tm_cam_to_imu)
}

/// `(R_cam→imu · R_imu→world) · tv_world − t_cam→imu`, the inverse of [`camera_to_world`]
/// for orthonormal rotations.
#[must_use]
pub fn world_to_camera(
    tv_world: &TranslationVector,
    rm_imu_to_world: &RotationMatrix,
    tm_cam_to_imu: &TranslationVector,
    rm_cam_to_imu: &RotationMatrix,
) -> TranslationVector {
    (rm_cam_to_imu * rm_imu_to_world) * tv_world - tm_cam_to_imu
}

/// `(x, y, z)` to `(yaw, pitch, distance)`: yaw = atan2(x, z), pitch = atan2(y, √(x²+z²)).
#[must_use]
pub fn rectangular_to_spherical<T: RealField + Copy>(rectangular: &Vector3<T>) -> Vector3<T> {
    let (x, y, z) = (rectangular.x, rectangular.y, rectangular.z);
    let horizontal = (x * x + z * z).sqrt();
    Vector3::new(x.atan2(z), y.atan2(horizontal), (x * x + y * y + z * z).sqrt())
}

/// `(yaw, pitch, distance)` back to `(x, y, z)`.
#[must_use]
pub fn spherical_to_rectangular<T: RealField + Copy>(spherical: &Vector3<T>) -> Vector3<T> {
    let (yaw, pitch, distance) = (spherical.x, spherical.y, spherical.z);
    let horizontal = distance * pitch.cos();
    Vector3::new(horizontal * yaw.sin(), distance * pitch.sin(), horizontal * yaw.cos())
}
