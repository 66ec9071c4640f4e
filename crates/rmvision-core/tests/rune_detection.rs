//! End-to-end rune detection on synthetic frames.
//!
//! These tests drive the public detector API with:
//! - Static reference runes as gray masks and colorized BGR frames
//! - Padded camera buffers
//! - Rotating scenes for the direction vote

use rand::prelude::*;
use rmvision_core::image::BgrImageView;
use rmvision_core::test_utils::scene::RuneScene;
use rmvision_core::test_utils::{
    colorize, reference_rune_mask, with_stride, REFERENCE_HEIGHT, REFERENCE_WIDTH,
};
use rmvision_core::{Color, Frame, ImageView, Point, Rotation, RuneConfig, RuneDetector};

const W: usize = REFERENCE_WIDTH;
const H: usize = REFERENCE_HEIGHT;

fn assert_near(a: Point, b: Point, tol: f32) {
    assert!((a - b).norm() < tol, "{a:?} is not within {tol} of {b:?}");
}

#[test]
fn test_reference_mask_finds_all_centers() {
    let mask = reference_rune_mask();
    let frame = Frame::Gray(ImageView::new(&mask, W, H, W).unwrap());
    let mut detector = RuneDetector::new(Color::Red, RuneConfig::default());
    let rune = detector.run(&frame);

    assert!(rune.found_armor && rune.found_r && rune.found_g);
    assert_eq!(rune.r_to_p, rune.center_p - rune.center_r);
    assert_eq!(rune.r_to_g, rune.center_g - rune.center_r);
    assert_near(rune.r_to_p, Point::new(177.0, 0.0), 1e-3);
    assert!((-1..=1).contains(&rune.rotation.as_i8()));
}

#[test]
fn test_bgr_frame_matches_gray_mask() {
    let mask = reference_rune_mask();
    let mut rng = StdRng::seed_from_u64(1);
    let bgr = colorize(&mask, Color::Red, 0.0, &mut rng);

    let mut gray_detector = RuneDetector::new(Color::Red, RuneConfig::default());
    let expected = gray_detector.run(&Frame::Gray(ImageView::new(&mask, W, H, W).unwrap()));

    let mut detector = RuneDetector::new(Color::Red, RuneConfig::default());
    let rune = detector.run(&Frame::Bgr(BgrImageView::new(&bgr, W, H, 3 * W).unwrap()));
    assert_eq!(rune, expected);
    assert_eq!(detector.mask().get_pixel(150, 150), 255);
}

#[test]
fn test_strided_bgr_buffer() {
    let mask = reference_rune_mask();
    let mut rng = StdRng::seed_from_u64(2);
    let bgr = colorize(&mask, Color::Blue, 0.0, &mut rng);
    // Padding bytes look like saturated blue pixels.
    let stride = 3 * W + 13;
    let padded = with_stride(&bgr, 3 * W, stride, 255);

    let mut detector = RuneDetector::new(Color::Blue, RuneConfig::default());
    let rune = detector.run(&Frame::Bgr(BgrImageView::new(&padded, W, H, stride).unwrap()));
    assert!(rune.is_complete());
    assert_near(rune.center_p, Point::new(224.5, 149.5), 1e-3);
    assert_near(rune.center_r, Point::new(47.5, 149.5), 1e-3);
}

#[test]
fn test_opposite_color_is_ignored() {
    let mask = reference_rune_mask();
    let mut rng = StdRng::seed_from_u64(3);
    let bgr = colorize(&mask, Color::Blue, 0.0, &mut rng);

    let mut detector = RuneDetector::new(Color::Red, RuneConfig::default());
    let rune = detector.run(&Frame::Bgr(BgrImageView::new(&bgr, W, H, 3 * W).unwrap()));
    assert!(!rune.found_armor && !rune.found_r && !rune.found_g);
    assert_eq!(rune.center_p, Point::ORIGIN);
    assert_eq!(rune.r_to_p, Point::ORIGIN);
    assert!(detector.contours().is_empty());
}

#[test]
fn test_noisy_frame_still_detected() {
    let mask = reference_rune_mask();
    let mut rng = StdRng::seed_from_u64(4);
    let bgr = colorize(&mask, Color::Red, 8.0, &mut rng);

    let mut detector = RuneDetector::new(Color::Red, RuneConfig::default());
    let rune = detector.run(&Frame::Bgr(BgrImageView::new(&bgr, W, H, 3 * W).unwrap()));
    assert!(rune.is_complete());
    assert_near(rune.center_p, Point::new(224.5, 149.5), 1.0);
    assert_near(rune.center_r, Point::new(47.5, 149.5), 1.0);
}

fn run_scene(detector: &mut RuneDetector, scene: &RuneScene, theta: f64) -> rmvision_core::PowerRune {
    let mask = scene.render(theta);
    let frame = Frame::Gray(ImageView::new(&mask, scene.width(), scene.height(), scene.width()).unwrap());
    detector.run(&frame)
}

#[test]
fn test_rotating_scene_tracks_centers() {
    let scene = RuneScene::new();
    let mut detector = RuneDetector::new(Color::Red, RuneConfig::default());
    for step in 0..8 {
        let theta = 0.2 + f64::from(step) * 0.7;
        let rune = run_scene(&mut detector, &scene, theta);
        assert!(rune.is_complete(), "frame at theta {theta} incomplete: {rune:?}");
        assert_near(rune.center_r, scene.center_r(), 1.0);
        assert_near(rune.center_p, scene.center_p(theta), 2.0);
    }
}

#[test]
fn test_clockwise_rotation_is_voted() {
    let scene = RuneScene::new();
    let mut detector = RuneDetector::new(Color::Red, RuneConfig::default());
    let step = 3f64.to_radians();

    for i in 0..10 {
        let rune = run_scene(&mut detector, &scene, 0.3 + f64::from(i) * step);
        assert_eq!(rune.rotation, Rotation::Undetermined);
    }
    assert_eq!(detector.pending_votes().len(), 10);

    let rune = run_scene(&mut detector, &scene, 0.3 + 10.0 * step);
    assert_eq!(rune.rotation, Rotation::Clockwise);
    assert!(detector.pending_votes().is_empty());

    // The decision sticks, even when the blade turns the other way.
    let rune = run_scene(&mut detector, &scene, 0.0);
    assert_eq!(rune.rotation, Rotation::Clockwise);
    assert!(detector.pending_votes().is_empty());

    detector.reset_rotation();
    assert_eq!(detector.rotation(), Rotation::Undetermined);
}

#[test]
fn test_counter_clockwise_rotation_is_voted() {
    let scene = RuneScene::new().with_size(420, 400).with_center(210.0, 200.0);
    let mut detector = RuneDetector::new(Color::Red, RuneConfig::default());
    let step = -4f64.to_radians();

    let mut last = None;
    for i in 0..11 {
        last = Some(run_scene(&mut detector, &scene, 2.0 + f64::from(i) * step));
    }
    assert_eq!(last.map(|r| r.rotation), Some(Rotation::CounterClockwise));
    assert_eq!(detector.rotation().as_i8(), -1);
}

#[test]
fn test_rotation_since_between_frames() {
    let scene = RuneScene::new();
    let mut detector = RuneDetector::new(Color::Red, RuneConfig::default());
    let a = run_scene(&mut detector, &scene, 0.5);
    let b = run_scene(&mut detector, &scene, 0.5 + 20f64.to_radians());
    let turned = b.rotation_since(&a).unwrap();
    assert!((turned - 20.0).abs() < 1.5, "turned {turned}");
}
