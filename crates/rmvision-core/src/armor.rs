//! Armor plates: model selection, pose solve and world mapping.

use crate::camera::CameraModel;
use crate::color::Color;
use crate::config::ArmorConfig;
use crate::coordinate::{self, RotationVector, TranslationVector};
use crate::geometry::{self, Point};
use crate::pose::{self, PoseError};
use nalgebra::{Quaternion, Rotation3};

/// Corner layout of the small plate in meters: bottom-left, top-left, top-right, bottom-right.
pub const SMALL_PLATE: [[f64; 2]; 4] = [[-0.066, 0.027], [-0.066, -0.027], [0.066, -0.027], [0.066, 0.027]];
/// Corner layout of the big plate in meters.
pub const BIG_PLATE: [[f64; 2]; 4] = [[-0.115, 0.029], [-0.115, -0.029], [0.115, -0.029], [0.115, 0.029]];

/// A plate as delivered by the upstream detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmorBox {
    /// Robot id printed on the plate.
    pub id: u32,
    /// Team color of the plate lights.
    pub color: Color,
    /// Corners in the plate model's order (bottom-left, top-left, top-right, bottom-right).
    pub corners: [Point; 4],
    /// Detector confidence.
    pub confidence: f32,
}

/// Physical plate model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlateModel {
    /// 135 x 55 mm plate.
    Small,
    /// 230 x 58 mm plate.
    Big,
}

impl PlateModel {
    /// Object-space corners on the z = 0 plane.
    #[must_use]
    pub fn object_points(self) -> &'static [[f64; 2]; 4] {
        match self {
            PlateModel::Small => &SMALL_PLATE,
            PlateModel::Big => &BIG_PLATE,
        }
    }
}

/// How a plate id maps onto a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlateClass {
    /// Always the given model.
    Fixed(PlateModel),
    /// Decided from the observed width/height ratio.
    ByRatio,
}

impl PlateClass {
    /// Sentry (0), hero (1) and base (6) carry big plates; the engineer (2)
    /// carries small ones; infantry (3, 4, 5) may mount either.
    #[must_use]
    pub fn of(id: u32) -> Option<Self> {
        match id {
            0 | 1 | 6 => Some(PlateClass::Fixed(PlateModel::Big)),
            2 => Some(PlateClass::Fixed(PlateModel::Small)),
            3..=5 => Some(PlateClass::ByRatio),
            _ => None,
        }
    }

    /// Resolve the model given the plate's pixel width/height ratio.
    #[must_use]
    pub fn resolve(self, ratio: f64, big_plate_ratio: f64) -> PlateModel {
        match self {
            PlateClass::Fixed(model) => model,
            PlateClass::ByRatio if ratio > big_plate_ratio => PlateModel::Big,
            PlateClass::ByRatio => PlateModel::Small,
        }
    }
}

/// Width over height of a plate quadrilateral, using the longer of each pair of opposite sides.
///
/// Zero height yields infinity, which resolves to the big model.
#[must_use]
pub fn pixel_aspect_ratio(corners: &[Point; 4]) -> f64 {
    let width = (corners[1] - corners[2]).norm().max((corners[3] - corners[0]).norm());
    let height = (corners[0] - corners[1]).norm().max((corners[2] - corners[3]).norm());
    if height <= 0.0 {
        return f64::INFINITY;
    }
    f64::from(width) / f64::from(height)
}

/// Select the plate model for an id and its observed corners.
///
/// # Errors
/// Returns [`PoseError::UnknownPlateId`] for ids outside 0..=6.
pub fn select_plate_model(id: u32, corners: &[Point; 4], big_plate_ratio: f64) -> Result<PlateModel, PoseError> {
    let class = PlateClass::of(id).ok_or(PoseError::UnknownPlateId(id))?;
    Ok(class.resolve(pixel_aspect_ratio(corners), big_plate_ratio))
}

/// A located armor plate with its camera- and world-frame pose.
#[derive(Debug, Clone, PartialEq)]
pub struct Armor {
    id: u32,
    color: Color,
    confidence: f32,
    corners: [Point; 4],
    center: Point,
    model: PlateModel,
    rotation_vector_cam: RotationVector,
    translation_vector_cam: TranslationVector,
    rotation_vector_world: RotationVector,
    translation_vector_world: TranslationVector,
    distance: f64,
}

impl Armor {
    /// Solve the plate pose and map it into the world frame.
    ///
    /// `orientation` is the IMU attitude quaternion at exposure time.
    ///
    /// # Errors
    /// Fails for unknown plate ids and when the pose solve fails.
    pub fn new(
        armor_box: &ArmorBox,
        camera: &CameraModel,
        orientation: &Quaternion<f32>,
        config: &ArmorConfig,
    ) -> Result<Self, PoseError> {
        let corners = armor_box.corners;
        let model = select_plate_model(armor_box.id, &corners, config.big_plate_ratio)?;

        let img_pts = corners.map(|p| [f64::from(p.x), f64::from(p.y)]);
        let pose = pose::solve_plate_pose(camera, model.object_points(), &img_pts)?;

        let rm_imu = coordinate::quaternion_to_rotation_matrix(orientation);
        let ext = &config.extrinsic;
        let translation_vector_world = ext.camera_to_world(&pose.translation, &rm_imu);
        let rm_world = (ext.rotation * rm_imu).transpose() * pose.rotation;
        let rotation_vector_world = Rotation3::from_matrix_unchecked(rm_world).scaled_axis();

        tracing::debug!(
            id = armor_box.id,
            ?model,
            distance = pose.translation.norm(),
            "armor pose solved"
        );

        Ok(Self {
            id: armor_box.id,
            color: armor_box.color,
            confidence: armor_box.confidence,
            corners,
            center: geometry::centroid(&corners),
            model,
            rotation_vector_cam: pose.rotation_vector(),
            translation_vector_cam: pose.translation,
            rotation_vector_world,
            translation_vector_world,
            distance: pose.translation.norm(),
        })
    }

    /// Robot id.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Team color.
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Detector confidence.
    #[must_use]
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Image corners as supplied.
    #[must_use]
    pub fn corners(&self) -> &[Point; 4] {
        &self.corners
    }

    /// Mean of the corners.
    #[must_use]
    pub fn center(&self) -> Point {
        self.center
    }

    /// Model used for the pose solve.
    #[must_use]
    pub fn model(&self) -> PlateModel {
        self.model
    }

    /// Plate rotation in the camera frame (axis-angle).
    #[must_use]
    pub fn rotation_vector_cam(&self) -> &RotationVector {
        &self.rotation_vector_cam
    }

    /// Plate center in the camera frame (meters).
    #[must_use]
    pub fn translation_vector_cam(&self) -> &TranslationVector {
        &self.translation_vector_cam
    }

    /// Plate rotation in the world frame (axis-angle).
    #[must_use]
    pub fn rotation_vector_world(&self) -> &RotationVector {
        &self.rotation_vector_world
    }

    /// Plate center in the world frame (meters).
    #[must_use]
    pub fn translation_vector_world(&self) -> &TranslationVector {
        &self.translation_vector_world
    }

    /// Camera-to-plate distance in meters.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Area of the image quadrilateral in square pixels.
    #[must_use]
    pub fn area(&self) -> f64 {
        geometry::polygon_area(&self.corners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(width: f32, height: f32) -> [Point; 4] {
        [
            Point::new(100.0, 100.0 + height),
            Point::new(100.0, 100.0),
            Point::new(100.0 + width, 100.0),
            Point::new(100.0 + width, 100.0 + height),
        ]
    }

    #[test]
    fn test_pixel_aspect_ratio() {
        assert!((pixel_aspect_ratio(&quad(140.0, 100.0)) - 1.4).abs() < 1e-6);
        assert_eq!(pixel_aspect_ratio(&quad(50.0, 0.0)), f64::INFINITY);
    }

    #[test]
    fn test_model_selection_fixed_ids() {
        for ratio in [0.5f32, 1.1, 1.4, 3.0] {
            let corners = quad(100.0 * ratio, 100.0);
            for id in [0, 1, 6] {
                assert_eq!(select_plate_model(id, &corners, 1.3), Ok(PlateModel::Big));
            }
            assert_eq!(select_plate_model(2, &corners, 1.3), Ok(PlateModel::Small));
        }
    }

    #[test]
    fn test_model_selection_by_ratio() {
        assert_eq!(select_plate_model(3, &quad(140.0, 100.0), 1.3), Ok(PlateModel::Big));
        assert_eq!(select_plate_model(4, &quad(110.0, 100.0), 1.3), Ok(PlateModel::Small));
        assert_eq!(select_plate_model(5, &quad(130.0, 100.0), 1.3), Ok(PlateModel::Small));
        assert_eq!(select_plate_model(5, &quad(130.0, 100.0), 1.2), Ok(PlateModel::Big));
        assert_eq!(
            select_plate_model(7, &quad(130.0, 100.0), 1.3),
            Err(PoseError::UnknownPlateId(7))
        );
    }

    #[test]
    fn test_plate_class_lookup() {
        assert_eq!(PlateClass::of(6), Some(PlateClass::Fixed(PlateModel::Big)));
        assert_eq!(PlateClass::of(4), Some(PlateClass::ByRatio));
        assert_eq!(PlateClass::of(42), None);
        assert_eq!(PlateModel::Big.object_points()[2], [0.115, -0.029]);
    }
}
