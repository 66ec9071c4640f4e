//! Planar 4-point pose recovery (PnP) for rectangular targets.
//!
//! The solve runs on undistorted normalized coordinates: a homography DLT gives
//! the initial pose, Orthogonal Iteration refines it.

use crate::camera::CameraModel;
use nalgebra::{Matrix3, Rotation3, SMatrix, SVector, Vector3};
use thiserror::Error;

/// Reasons a plate pose cannot be recovered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PoseError {
    /// The plate id has no known physical model.
    #[error("no plate model for id {0}")]
    UnknownPlateId(u32),
    /// Focal lengths are zero or parameters are not finite.
    #[error("camera intrinsics are invalid")]
    InvalidIntrinsics,
    /// A corner could not be undistorted.
    #[error("corner {0} could not be undistorted")]
    Undistortion(usize),
    /// The corners do not span a proper quadrilateral.
    #[error("plate corners are degenerate")]
    DegenerateCorners,
    /// The linear systems of the solver were singular.
    #[error("pose solver failed: {0}")]
    SolveFailed(&'static str),
}

/// A 3D pose representing rotation and translation (object → camera).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// 3x3 Rotation matrix.
    pub rotation: Matrix3<f64>,
    /// 3x1 Translation vector.
    pub translation: Vector3<f64>,
}

impl Pose {
    /// Create a new pose.
    #[must_use]
    pub fn new(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Axis-angle form of the rotation (Rodrigues vector).
    #[must_use]
    pub fn rotation_vector(&self) -> Vector3<f64> {
        Rotation3::from_matrix_unchecked(self.rotation).scaled_axis()
    }

    /// Project an object point into the image using this pose and the camera.
    #[must_use]
    pub fn project(&self, point: &Vector3<f64>, camera: &CameraModel) -> [f64; 2] {
        camera.project(&(self.rotation * point + self.translation))
    }

    /// RMS pixel distance between projected object points and observations.
    #[must_use]
    pub fn reprojection_error(&self, camera: &CameraModel, obj_pts: &[[f64; 2]; 4], img_pts: &[[f64; 2]; 4]) -> f64 {
        let mut sum = 0.0;
        for (o, i) in obj_pts.iter().zip(img_pts) {
            let p = self.project(&Vector3::new(o[0], o[1], 0.0), camera);
            sum += (p[0] - i[0]).powi(2) + (p[1] - i[1]).powi(2);
        }
        (sum / 4.0).sqrt()
    }
}

/// A 3x3 planar homography.
struct Homography {
    h: Matrix3<f64>,
}

impl Homography {
    /// Compute homography from 4 source points to 4 destination points using DLT.
    ///
    /// Fixes `h[8] = 1` and solves the remaining 8x8 system.
    fn from_pairs(src: &[[f64; 2]; 4], dst: &[[f64; 2]; 4]) -> Option<Self> {
        let mut m = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();

        for i in 0..4 {
            let [sx, sy] = src[i];
            let [dx, dy] = dst[i];

            m[(i * 2, 0)] = -sx;
            m[(i * 2, 1)] = -sy;
            m[(i * 2, 2)] = -1.0;
            m[(i * 2, 6)] = sx * dx;
            m[(i * 2, 7)] = sy * dx;
            b[i * 2] = -dx;

            m[(i * 2 + 1, 3)] = -sx;
            m[(i * 2 + 1, 4)] = -sy;
            m[(i * 2 + 1, 5)] = -1.0;
            m[(i * 2 + 1, 6)] = sx * dy;
            m[(i * 2 + 1, 7)] = sy * dy;
            b[i * 2 + 1] = -dy;
        }

        let h_vec = m.lu().solve(&b)?;
        let h = Matrix3::new(
            h_vec[0], h_vec[1], h_vec[2], h_vec[3], h_vec[4], h_vec[5], h_vec[6], h_vec[7], 1.0,
        );
        h.iter().all(|v| v.is_finite()).then_some(Self { h })
    }
}

const OI_ITERATIONS: usize = 20;

/// Nearest rotation to `m` in the Frobenius sense.
fn project_to_so3(m: &Matrix3<f64>) -> Result<Matrix3<f64>, PoseError> {
    let svd = m.svd(true, true);
    let u = svd.u.ok_or(PoseError::SolveFailed("svd"))?;
    let vt = svd.v_t.ok_or(PoseError::SolveFailed("svd"))?;
    let r = u * vt;
    if r.determinant() < 0.0 {
        let reflect_z = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, -1.0));
        return Ok(u * reflect_z * vt);
    }
    Ok(r)
}

/// Recover the pose of a planar object (model points on z = 0) from four
/// distorted pixel observations.
///
/// # Errors
/// Fails when the intrinsics are invalid, a corner cannot be undistorted or
/// the corners are degenerate.
pub fn solve_plate_pose(
    camera: &CameraModel,
    obj_pts: &[[f64; 2]; 4],
    img_pts: &[[f64; 2]; 4],
) -> Result<Pose, PoseError> {
    if !camera.intrinsics.is_valid() {
        return Err(PoseError::InvalidIntrinsics);
    }
    let mut normalized = [[0.0; 2]; 4];
    for (i, p) in img_pts.iter().enumerate() {
        normalized[i] = camera
            .undistort_to_normalized(*p)
            .ok_or(PoseError::Undistortion(i))?;
    }

    // 1. DLT initialization. With normalized coordinates K = I, so
    // H ~ [r1 r2 t] directly.
    let h = Homography::from_pairs(obj_pts, &normalized)
        .ok_or(PoseError::DegenerateCorners)?
        .h;

    let mut r1 = h.column(0).into_owned();
    let mut r2 = h.column(1).into_owned();

    let norms = r1.norm() * r2.norm();
    if norms < 1e-18 {
        return Err(PoseError::DegenerateCorners);
    }
    let mut scale = 1.0 / norms.sqrt();
    // The object must lie in front of the camera.
    if h[(2, 2)] < 0.0 {
        scale = -scale;
    }
    r1 *= scale;
    r2 *= scale;

    let rotation = project_to_so3(&Matrix3::from_columns(&[r1, r2, r1.cross(&r2)]))?;

    // 2. Refinement via Orthogonal Iteration.
    refine_pose_oi(&normalized, obj_pts, rotation)
}

/// Refine a rotation estimate using Orthogonal Iteration on normalized image
/// points. The translation is recovered from the rotation at every step.
fn refine_pose_oi(
    img_pts: &[[f64; 2]; 4],
    obj_pts: &[[f64; 2]; 4],
    initial_rotation: Matrix3<f64>,
) -> Result<Pose, PoseError> {
    let mut r = initial_rotation;

    // Line-of-sight projectors V_i = v v^T / (v^T v).
    let p_mats: Vec<Matrix3<f64>> = img_pts
        .iter()
        .map(|p| {
            let v = Vector3::new(p[0], p[1], 1.0).normalize();
            v * v.transpose()
        })
        .collect();
    let p: Vec<Vector3<f64>> = obj_pts.iter().map(|p| Vector3::new(p[0], p[1], 0.0)).collect();

    let n = p.len() as f64;
    let p_bar = p.iter().sum::<Vector3<f64>>() / n;
    let sum_p = p_mats.iter().sum::<Matrix3<f64>>();
    let m_inv = (Matrix3::identity() - (1.0 / n) * sum_p)
        .try_inverse()
        .ok_or(PoseError::SolveFailed("line-of-sight system is singular"))?;

    // Optimal translation given R.
    let translation_for = |r: &Matrix3<f64>| -> Vector3<f64> {
        let mut sum_tp = Vector3::zeros();
        for i in 0..p.len() {
            sum_tp += (p_mats[i] - Matrix3::identity()) * (r * p[i]);
        }
        m_inv * (1.0 / n) * sum_tp
    };

    for _ in 0..OI_ITERATIONS {
        let t = translation_for(&r);

        // Optimal R given t: absolute orientation against the projected points.
        let mut b = Matrix3::zeros();
        for i in 0..p.len() {
            let q = p_mats[i] * (r * p[i] + t);
            b += q * (p[i] - p_bar).transpose();
        }
        r = project_to_so3(&b)?;
    }

    let t = translation_for(&r);
    if !t.iter().all(|v| v.is_finite()) || t.z <= 0.0 {
        return Err(PoseError::SolveFailed("no solution in front of the camera"));
    }
    Ok(Pose::new(r, t))
}
