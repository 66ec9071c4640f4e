//! Armor construction from projected plate models.

use nalgebra::{Matrix3, Quaternion, Rotation3, Vector3};
use rmvision_core::armor::{select_plate_model, PlateModel};
use rmvision_core::camera::{CameraIntrinsics, Distortion};
use rmvision_core::coordinate::{self, ImuExtrinsic};
use rmvision_core::pose::{Pose, PoseError};
use rmvision_core::test_utils::{max_corner_error, project_plate};
use rmvision_core::{Armor, ArmorBox, ArmorConfig, CameraModel, Color, Point};

fn camera() -> CameraModel {
    CameraModel::new(
        CameraIntrinsics::new(1200.0, 1200.0, 640.0, 512.0),
        Distortion::default(),
    )
}

fn ground_truth() -> Pose {
    Pose::new(
        Rotation3::from_euler_angles(0.05, 0.3, -0.02).into_inner(),
        Vector3::new(0.12, -0.04, 2.5),
    )
}

fn armor_box(id: u32, corners: [Point; 4]) -> ArmorBox {
    ArmorBox {
        id,
        color: Color::Blue,
        corners,
        confidence: 0.9,
    }
}

#[test]
fn test_small_plate_pose_and_world_translation() {
    let camera = camera();
    let truth = ground_truth();
    let corners = project_plate(&camera, &truth, PlateModel::Small);
    let identity = Quaternion::new(1.0f32, 0.0, 0.0, 0.0);

    let armor = Armor::new(&armor_box(2, corners), &camera, &identity, &ArmorConfig::default()).unwrap();

    assert_eq!(armor.model(), PlateModel::Small);
    assert_eq!(armor.id(), 2);
    assert_eq!(armor.color(), Color::Blue);
    assert!((armor.translation_vector_cam() - truth.translation).norm() < 2e-3);
    assert!((armor.distance() - truth.translation.norm()).abs() < 2e-3);

    let rv_err = (armor.rotation_vector_cam() - truth.rotation_vector()).norm();
    assert!(rv_err < 2e-2, "rotation vector error {rv_err}");

    // Identity IMU: world = camera translation shifted by the mounting offset.
    let expected_world = armor.translation_vector_cam() + Vector3::new(0.0, -0.026, 0.075);
    assert!((armor.translation_vector_world() - expected_world).norm() < 1e-9);

    let center = armor.center();
    let mean = corners.iter().fold(Point::ORIGIN, |acc, &p| acc + p) / 4.0;
    assert!((center - mean).norm() < 1e-4);
    assert!(armor.area() > 0.0);
}

#[test]
fn test_big_plate_with_rotated_imu() {
    let camera = camera();
    let truth = ground_truth();
    let corners = project_plate(&camera, &truth, PlateModel::Big);
    let half = 0.2f32;
    // Yaw of 0.4 rad about the gimbal Y axis.
    let q = Quaternion::new(half.cos(), 0.0, 0.0, half.sin());

    let config = ArmorConfig::default().with_extrinsic(ImuExtrinsic::default());
    let armor = Armor::new(&armor_box(1, corners), &camera, &q, &config).unwrap();
    assert_eq!(armor.model(), PlateModel::Big);

    let rm_imu = coordinate::quaternion_to_rotation_matrix(&q);
    let back = config
        .extrinsic
        .world_to_camera(armor.translation_vector_world(), &rm_imu);
    assert!((back - armor.translation_vector_cam()).norm() < 1e-6);

    // The world-frame distance is not the camera-frame one once the offset applies.
    assert!((armor.translation_vector_world().norm() - armor.distance()).abs() > 1e-3);
}

#[test]
fn test_distorted_calibration() {
    let k = Matrix3::new(1100.0, 0.0, 620.0, 0.0, 1105.0, 500.0, 0.0, 0.0, 1.0);
    let camera = CameraModel::from_calibration(&k, &[-0.12, 0.08, 0.001, -0.0005, 0.0]);
    let truth = ground_truth();
    let corners = project_plate(&camera, &truth, PlateModel::Small);

    let armor = Armor::new(
        &armor_box(2, corners),
        &camera,
        &Quaternion::new(1.0, 0.0, 0.0, 0.0),
        &ArmorConfig::default(),
    )
    .unwrap();
    assert!((armor.translation_vector_cam() - truth.translation).norm() < 5e-3);

    let reprojected = project_plate(&camera, &Pose::new(
        Rotation3::from_scaled_axis(*armor.rotation_vector_cam()).into_inner(),
        *armor.translation_vector_cam(),
    ), PlateModel::Small);
    assert!(max_corner_error(&reprojected, &corners) < 0.05);
}

#[test]
fn test_unknown_id_is_an_error() {
    let camera = camera();
    let corners = project_plate(&camera, &ground_truth(), PlateModel::Small);
    let result = Armor::new(
        &armor_box(9, corners),
        &camera,
        &Quaternion::new(1.0, 0.0, 0.0, 0.0),
        &ArmorConfig::default(),
    );
    assert_eq!(result.err(), Some(PoseError::UnknownPlateId(9)));
}

#[test]
fn test_ambiguous_ids_follow_ratio_threshold() {
    let quad = |w: f32, h: f32| {
        [
            Point::new(0.0, h),
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
        ]
    };
    assert_eq!(select_plate_model(3, &quad(140.0, 100.0), 1.3), Ok(PlateModel::Big));
    assert_eq!(select_plate_model(4, &quad(110.0, 100.0), 1.3), Ok(PlateModel::Small));
    // Raising the provisional threshold flips the decision.
    assert_eq!(select_plate_model(3, &quad(140.0, 100.0), 1.5), Ok(PlateModel::Small));
    for id in [0, 1, 6] {
        assert_eq!(select_plate_model(id, &quad(100.0, 100.0), 1.3), Ok(PlateModel::Big));
    }
    assert_eq!(select_plate_model(2, &quad(300.0, 100.0), 1.3), Ok(PlateModel::Small));
}
