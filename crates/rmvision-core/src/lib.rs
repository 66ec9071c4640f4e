//! Perception core for RoboMaster power runes and armor plates.
//!
//! The crate turns camera frames into target geometry for an aiming
//! controller. It does no camera handling, serial I/O or logging setup; the
//! caller owns those and installs a `tracing` subscriber if it wants logs.
//!
//! # Architecture Overview
//!
//! 1. **Mask extraction**:
//!    - Target-color isolation on BGR frames (R - B or B - R).
//!    - Fixed-level binarization.
//!    - Separable dilate/close with multiversion SIMD row kernels.
//!
//! 2. **Contour hierarchy**:
//!    - Suzuki–Abe border following into an index-linked tree
//!      (parent, first child, next sibling) held in flat vectors.
//!
//! 3. **Center search**:
//!    - Blade and armor window filters on minimum-area rectangles (P).
//!    - Windowed online mean of center-mark candidates (R).
//!    - Fixed-weight blade centroid (G).
//!
//! 4. **Rotation voting**:
//!    - Majority vote of R→P cross products against a reference sample.
//!
//! 5. **Armor pose**:
//!    - Plate model lookup by robot id and pixel aspect ratio.
//!    - Planar PnP (homography + orthogonal iteration) and IMU-based
//!      camera↔world transforms.
//!
//! # Example
//!
//! ```
//! use rmvision_core::{Color, Frame, RuneConfig, RuneDetector};
//! use rmvision_core::image::ImageView;
//!
//! let config = RuneConfig::builder().split_gray_thresh(90).build();
//! let mut detector = RuneDetector::new(Color::Red, config);
//!
//! # let pixels = vec![0u8; 64 * 48];
//! let frame = Frame::Gray(ImageView::new(&pixels, 64, 48, 64).unwrap());
//! let rune = detector.run(&frame);
//! assert!(!rune.found_armor);
//! ```

/// Armor plate model selection and pose.
pub mod armor;
/// Pinhole camera model with lens distortion.
pub mod camera;
/// Target color tags.
pub mod color;
/// Configuration types for the detectors.
pub mod config;
/// Nested contour extraction.
pub mod contour;
/// Rotation conversions and camera/world transforms.
pub mod coordinate;
/// Debug overlay seam.
pub mod debug;
/// 2D geometric primitives.
pub mod geometry;
/// Image buffer abstractions.
pub mod image;
/// Binary morphology.
pub mod morphology;
/// Planar 4-point pose estimation.
pub mod pose;
/// The power rune detector.
pub mod rune;
/// P/R/G center search.
pub mod search;
/// Batched trigonometry.
pub mod simd;
/// Utilities for testing and synthetic data generation.
pub mod test_utils;
/// Channel isolation and binarization.
pub mod threshold;
/// Rotation direction voting.
pub mod vote;

pub use crate::armor::{Armor, ArmorBox, PlateModel};
pub use crate::camera::CameraModel;
pub use crate::color::Color;
pub use crate::config::{ArmorConfig, RuneConfig};
pub use crate::geometry::Point;
pub use crate::image::{BgrImageView, Frame, ImageView};
pub use crate::rune::{PowerRune, RuneDetector, RunStats};
pub use crate::search::DetectionMiss;
pub use crate::vote::Rotation;

/// Returns version and build information for the core library.
#[must_use]
pub fn core_info() -> String {
    format!("rmvision-core {}", env!("CARGO_PKG_VERSION"))
}
