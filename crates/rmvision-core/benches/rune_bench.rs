#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use bumpalo::Bump;
use divan::bench;
use rand::prelude::*;
use rmvision_core::contour::{find_contours, ContourTree};
use rmvision_core::image::{BgrImageView, ImageView};
use rmvision_core::morphology::clean_mask;
use rmvision_core::test_utils::colorize;
use rmvision_core::test_utils::scene::RuneScene;
use rmvision_core::{Color, Frame, RuneConfig, RuneDetector};

fn main() {
    divan::main();
}

#[bench]
fn bench_run_gray_400(bencher: divan::Bencher) {
    let scene = RuneScene::new();
    let mask = scene.render(0.8);
    let frame = Frame::Gray(ImageView::new(&mask, scene.width(), scene.height(), scene.width()).unwrap());
    let mut detector = RuneDetector::new(Color::Red, RuneConfig::default());

    bencher.bench_local(move || divan::black_box(detector.run(divan::black_box(&frame))));
}

#[bench]
fn bench_run_bgr_720p(bencher: divan::Bencher) {
    let scene = RuneScene::new().with_size(1280, 720).with_center(640.0, 360.0);
    let mask = scene.render(1.3);
    let mut rng = StdRng::seed_from_u64(42);
    let bgr = colorize(&mask, Color::Red, 6.0, &mut rng);
    let frame = Frame::Bgr(BgrImageView::new(&bgr, 1280, 720, 3 * 1280).unwrap());
    let mut detector = RuneDetector::new(Color::Red, RuneConfig::default());

    bencher.bench_local(move || divan::black_box(detector.run(divan::black_box(&frame))));
}

#[bench]
fn bench_clean_mask_720p(bencher: divan::Bencher) {
    let scene = RuneScene::new().with_size(1280, 720).with_center(640.0, 360.0);
    let mask = scene.render(0.4);
    let mut arena = Bump::new();
    let mut buf = mask.clone();

    bencher.bench_local(move || {
        arena.reset();
        buf.copy_from_slice(&mask);
        clean_mask(&arena, &mut buf, 1280, 720, 5, 7);
    });
}

#[bench]
fn bench_find_contours_720p(bencher: divan::Bencher) {
    let scene = RuneScene::new().with_size(1280, 720).with_center(640.0, 360.0);
    let mask = scene.render(2.1);
    let img = ImageView::new(&mask, 1280, 720, 1280).unwrap();
    let mut arena = Bump::new();
    let mut tree = ContourTree::new();

    bencher.bench_local(move || {
        arena.reset();
        find_contours(&arena, &img, &mut tree);
        divan::black_box(tree.len())
    });
}
