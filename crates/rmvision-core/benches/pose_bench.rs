#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use divan::bench;
use nalgebra::{Quaternion, Rotation3, Vector3};
use rmvision_core::armor::PlateModel;
use rmvision_core::camera::{CameraIntrinsics, Distortion};
use rmvision_core::pose::{solve_plate_pose, Pose};
use rmvision_core::test_utils::project_plate;
use rmvision_core::{Armor, ArmorBox, ArmorConfig, CameraModel, Color};

fn main() {
    divan::main();
}

fn setup() -> (CameraModel, [rmvision_core::Point; 4]) {
    let camera = CameraModel::new(
        CameraIntrinsics::new(1200.0, 1200.0, 640.0, 512.0),
        Distortion::from_coefficients(&[-0.1, 0.05, 0.0, 0.0, 0.0]),
    );
    let pose = Pose::new(
        Rotation3::from_euler_angles(0.1, 0.4, 0.0).into_inner(),
        Vector3::new(0.2, -0.1, 3.0),
    );
    let corners = project_plate(&camera, &pose, PlateModel::Small);
    (camera, corners)
}

#[bench]
fn bench_solve_plate_pose(bencher: divan::Bencher) {
    let (camera, corners) = setup();
    let img_pts = corners.map(|p| [f64::from(p.x), f64::from(p.y)]);

    bencher.bench_local(move || {
        divan::black_box(solve_plate_pose(
            divan::black_box(&camera),
            PlateModel::Small.object_points(),
            divan::black_box(&img_pts),
        ))
    });
}

#[bench]
fn bench_armor_new(bencher: divan::Bencher) {
    let (camera, corners) = setup();
    let armor_box = ArmorBox {
        id: 3,
        color: Color::Red,
        corners,
        confidence: 0.8,
    };
    let q = Quaternion::new(0.98f32, 0.0, 0.2, 0.0).normalize();
    let config = ArmorConfig::default();

    bencher.bench_local(move || {
        divan::black_box(Armor::new(divan::black_box(&armor_box), &camera, &q, &config).unwrap())
    });
}
