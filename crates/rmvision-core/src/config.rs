//! Configuration types for the rune detector and the armor pose estimator.
//!
//! This module provides two configuration types:
//! - [`RuneConfig`]: contour-filter thresholds and search heuristics for the rune
//!   pipeline (immutable once a detector is constructed)
//! - [`ArmorConfig`]: plate-model selection and the camera→IMU extrinsic

use crate::coordinate::ImuExtrinsic;
use crate::geometry::Point;

// ============================================================================
// RuneConfig: Rune pipeline configuration
// ============================================================================

/// Tunable parameters of the rune detection pipeline.
///
/// With the `serde` feature the fields map onto the parameter keys of the
/// external tuning file (`SplitGrayThresh`, `MinBoundingBoxArea`, ...).
/// Area and ratio bounds are exclusive unless stated otherwise.
///
/// # Example
/// ```
/// use rmvision_core::config::RuneConfig;
///
/// let config = RuneConfig::builder()
///     .split_gray_thresh(80)
///     .min_bounding_box_area(3000.0)
///     .build();
/// assert_eq!(config.split_gray_thresh, 80);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RuneConfig {
    // Preprocessing
    /// Gray level above which an isolated-channel pixel becomes foreground (default: 100).
    #[cfg_attr(feature = "serde", serde(rename = "SplitGrayThresh"))]
    pub split_gray_thresh: u8,
    /// Side of the square dilation element (default: 5).
    #[cfg_attr(feature = "serde", serde(rename = "DilateKernelSize"))]
    pub dilate_kernel_size: usize,
    /// Side of the square closing element (default: 7).
    #[cfg_attr(feature = "serde", serde(rename = "CloseKernelSize"))]
    pub close_kernel_size: usize,

    // Center R candidates
    /// Lower bound of a center-R candidate's rectangle area (default: 100).
    #[cfg_attr(feature = "serde", serde(rename = "MinRBoundingBoxArea"))]
    pub min_r_bounding_box_area: f64,
    /// Upper bound of a center-R candidate's rectangle area (default: 1000).
    #[cfg_attr(feature = "serde", serde(rename = "MaxRBoundingBoxArea"))]
    pub max_r_bounding_box_area: f64,
    /// Maximum `|width - height|` of a center-R rectangle (default: 5).
    #[cfg_attr(feature = "serde", serde(rename = "MaxEncircleRRectWHDeviation"))]
    pub max_encircle_r_rect_wh_deviation: f64,

    // Fan filters
    /// Minimum fan rectangle area, inclusive (default: 4000).
    #[cfg_attr(feature = "serde", serde(rename = "MinBoundingBoxArea"))]
    pub min_bounding_box_area: f64,
    /// Lower bound of the fan's short/long side ratio (default: 0.2).
    #[cfg_attr(feature = "serde", serde(rename = "MinBoundingBoxWHRatio"))]
    pub min_bounding_box_wh_ratio: f64,
    /// Upper bound of the fan's short/long side ratio (default: 0.7).
    #[cfg_attr(feature = "serde", serde(rename = "MaxBoundingBoxWHRatio"))]
    pub max_bounding_box_wh_ratio: f64,
    /// Lower bound of the fan's contour area (default: 3000).
    #[cfg_attr(feature = "serde", serde(rename = "MinContourArea"))]
    pub min_contour_area: f64,
    /// Upper bound of the fan's contour area (default: 30000).
    #[cfg_attr(feature = "serde", serde(rename = "MaxContourArea"))]
    pub max_contour_area: f64,

    // Armor filters
    /// Lower bound of the armor rectangle area (default: 300).
    #[cfg_attr(feature = "serde", serde(rename = "MinArmorArea"))]
    pub min_armor_area: f64,
    /// Upper bound of the armor rectangle area (default: 3000).
    #[cfg_attr(feature = "serde", serde(rename = "MaxArmorArea"))]
    pub max_armor_area: f64,
    /// Lower bound of the armor's short/long side ratio (default: 0.4).
    #[cfg_attr(feature = "serde", serde(rename = "MinArmorWHRatio"))]
    pub min_armor_wh_ratio: f64,
    /// Upper bound of the armor's short/long side ratio (default: 0.9).
    #[cfg_attr(feature = "serde", serde(rename = "MaxArmorWHRatio"))]
    pub max_armor_wh_ratio: f64,

    // Center search heuristics
    /// Correction subtracted from every center-R candidate before averaging (default: origin).
    #[cfg_attr(feature = "serde", serde(rename = "CenterROffset"))]
    pub center_r_offset: Point,
    /// Fraction of the fan's long side the search window is shifted by (default: 0.75).
    #[cfg_attr(feature = "serde", serde(rename = "SearchOffsetRatio"))]
    pub search_offset_ratio: f32,
    /// Divisor applied to the larger search-window side (default: 2).
    #[cfg_attr(feature = "serde", serde(rename = "SearchShrinkDivisor"))]
    pub search_shrink_divisor: i32,

    // Output
    /// Yaw/pitch/delay triple copied into every snapshot (default: zeros).
    #[cfg_attr(feature = "serde", serde(rename = "AimDelay"))]
    pub aim_delay: [f32; 3],
    /// Emit draw calls to the debug painter (default: false).
    #[cfg_attr(feature = "serde", serde(rename = "Debug"))]
    pub debug: bool,
}

impl Default for RuneConfig {
    fn default() -> Self {
        Self {
            split_gray_thresh: 100,
            dilate_kernel_size: 5,
            close_kernel_size: 7,
            min_r_bounding_box_area: 100.0,
            max_r_bounding_box_area: 1000.0,
            max_encircle_r_rect_wh_deviation: 5.0,
            min_bounding_box_area: 4000.0,
            min_bounding_box_wh_ratio: 0.2,
            max_bounding_box_wh_ratio: 0.7,
            min_contour_area: 3000.0,
            max_contour_area: 30000.0,
            min_armor_area: 300.0,
            max_armor_area: 3000.0,
            min_armor_wh_ratio: 0.4,
            max_armor_wh_ratio: 0.9,
            center_r_offset: Point::ORIGIN,
            search_offset_ratio: 0.75,
            search_shrink_divisor: 2,
            aim_delay: [0.0; 3],
            debug: false,
        }
    }
}

impl RuneConfig {
    /// Create a new builder for `RuneConfig`.
    #[must_use]
    pub fn builder() -> RuneConfigBuilder {
        RuneConfigBuilder::default()
    }
}

/// Builder for [`RuneConfig`].
#[derive(Default)]
pub struct RuneConfigBuilder {
    split_gray_thresh: Option<u8>,
    dilate_kernel_size: Option<usize>,
    close_kernel_size: Option<usize>,
    min_r_bounding_box_area: Option<f64>,
    max_r_bounding_box_area: Option<f64>,
    max_encircle_r_rect_wh_deviation: Option<f64>,
    min_bounding_box_area: Option<f64>,
    min_bounding_box_wh_ratio: Option<f64>,
    max_bounding_box_wh_ratio: Option<f64>,
    min_contour_area: Option<f64>,
    max_contour_area: Option<f64>,
    min_armor_area: Option<f64>,
    max_armor_area: Option<f64>,
    min_armor_wh_ratio: Option<f64>,
    max_armor_wh_ratio: Option<f64>,
    center_r_offset: Option<Point>,
    search_offset_ratio: Option<f32>,
    search_shrink_divisor: Option<i32>,
    aim_delay: Option<[f32; 3]>,
    debug: Option<bool>,
}

impl RuneConfigBuilder {
    /// Set the binarization threshold.
    #[must_use]
    pub fn split_gray_thresh(mut self, thresh: u8) -> Self {
        self.split_gray_thresh = Some(thresh);
        self
    }

    /// Set the dilation element size.
    #[must_use]
    pub fn dilate_kernel_size(mut self, size: usize) -> Self {
        self.dilate_kernel_size = Some(size);
        self
    }

    /// Set the closing element size.
    #[must_use]
    pub fn close_kernel_size(mut self, size: usize) -> Self {
        self.close_kernel_size = Some(size);
        self
    }

    /// Set the center-R rectangle area bounds.
    #[must_use]
    pub fn r_bounding_box_area(mut self, min: f64, max: f64) -> Self {
        self.min_r_bounding_box_area = Some(min);
        self.max_r_bounding_box_area = Some(max);
        self
    }

    /// Set the maximum center-R width/height deviation.
    #[must_use]
    pub fn max_encircle_r_rect_wh_deviation(mut self, deviation: f64) -> Self {
        self.max_encircle_r_rect_wh_deviation = Some(deviation);
        self
    }

    /// Set the minimum fan rectangle area.
    #[must_use]
    pub fn min_bounding_box_area(mut self, area: f64) -> Self {
        self.min_bounding_box_area = Some(area);
        self
    }

    /// Set the fan side-ratio bounds.
    #[must_use]
    pub fn bounding_box_wh_ratio(mut self, min: f64, max: f64) -> Self {
        self.min_bounding_box_wh_ratio = Some(min);
        self.max_bounding_box_wh_ratio = Some(max);
        self
    }

    /// Set the fan contour-area bounds.
    #[must_use]
    pub fn contour_area(mut self, min: f64, max: f64) -> Self {
        self.min_contour_area = Some(min);
        self.max_contour_area = Some(max);
        self
    }

    /// Set the armor rectangle-area bounds.
    #[must_use]
    pub fn armor_area(mut self, min: f64, max: f64) -> Self {
        self.min_armor_area = Some(min);
        self.max_armor_area = Some(max);
        self
    }

    /// Set the armor side-ratio bounds.
    #[must_use]
    pub fn armor_wh_ratio(mut self, min: f64, max: f64) -> Self {
        self.min_armor_wh_ratio = Some(min);
        self.max_armor_wh_ratio = Some(max);
        self
    }

    /// Set the per-candidate center-R correction.
    #[must_use]
    pub fn center_r_offset(mut self, offset: Point) -> Self {
        self.center_r_offset = Some(offset);
        self
    }

    /// Set the search window offset and shrink divisor.
    #[must_use]
    pub fn search_window(mut self, offset_ratio: f32, shrink_divisor: i32) -> Self {
        self.search_offset_ratio = Some(offset_ratio);
        self.search_shrink_divisor = Some(shrink_divisor);
        self
    }

    /// Set the aim-delay triple carried by every snapshot.
    #[must_use]
    pub fn aim_delay(mut self, delay: [f32; 3]) -> Self {
        self.aim_delay = Some(delay);
        self
    }

    /// Enable or disable debug drawing.
    #[must_use]
    pub fn debug(mut self, enable: bool) -> Self {
        self.debug = Some(enable);
        self
    }

    /// Build the configuration, using defaults for unset fields.
    #[must_use]
    pub fn build(self) -> RuneConfig {
        let d = RuneConfig::default();
        RuneConfig {
            split_gray_thresh: self.split_gray_thresh.unwrap_or(d.split_gray_thresh),
            dilate_kernel_size: self.dilate_kernel_size.unwrap_or(d.dilate_kernel_size),
            close_kernel_size: self.close_kernel_size.unwrap_or(d.close_kernel_size),
            min_r_bounding_box_area: self
                .min_r_bounding_box_area
                .unwrap_or(d.min_r_bounding_box_area),
            max_r_bounding_box_area: self
                .max_r_bounding_box_area
                .unwrap_or(d.max_r_bounding_box_area),
            max_encircle_r_rect_wh_deviation: self
                .max_encircle_r_rect_wh_deviation
                .unwrap_or(d.max_encircle_r_rect_wh_deviation),
            min_bounding_box_area: self.min_bounding_box_area.unwrap_or(d.min_bounding_box_area),
            min_bounding_box_wh_ratio: self
                .min_bounding_box_wh_ratio
                .unwrap_or(d.min_bounding_box_wh_ratio),
            max_bounding_box_wh_ratio: self
                .max_bounding_box_wh_ratio
                .unwrap_or(d.max_bounding_box_wh_ratio),
            min_contour_area: self.min_contour_area.unwrap_or(d.min_contour_area),
            max_contour_area: self.max_contour_area.unwrap_or(d.max_contour_area),
            min_armor_area: self.min_armor_area.unwrap_or(d.min_armor_area),
            max_armor_area: self.max_armor_area.unwrap_or(d.max_armor_area),
            min_armor_wh_ratio: self.min_armor_wh_ratio.unwrap_or(d.min_armor_wh_ratio),
            max_armor_wh_ratio: self.max_armor_wh_ratio.unwrap_or(d.max_armor_wh_ratio),
            center_r_offset: self.center_r_offset.unwrap_or(d.center_r_offset),
            search_offset_ratio: self.search_offset_ratio.unwrap_or(d.search_offset_ratio),
            search_shrink_divisor: self.search_shrink_divisor.unwrap_or(d.search_shrink_divisor),
            aim_delay: self.aim_delay.unwrap_or(d.aim_delay),
            debug: self.debug.unwrap_or(d.debug),
        }
    }
}

// ============================================================================
// ArmorConfig: Plate pose configuration
// ============================================================================

/// Parameters of the armor pose estimator.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ArmorConfig {
    /// Width/height ratio above which an ambiguous plate id uses the big model (default: 1.3).
    ///
    /// Provisional; still awaiting calibration against recorded footage.
    pub big_plate_ratio: f64,
    /// Fixed camera→IMU mounting transform.
    pub extrinsic: ImuExtrinsic,
}

impl Default for ArmorConfig {
    fn default() -> Self {
        Self {
            big_plate_ratio: 1.3,
            extrinsic: ImuExtrinsic::default(),
        }
    }
}

impl ArmorConfig {
    /// Override the ambiguous-plate ratio threshold.
    #[must_use]
    pub fn with_big_plate_ratio(mut self, ratio: f64) -> Self {
        self.big_plate_ratio = ratio;
        self
    }

    /// Override the camera→IMU extrinsic.
    #[must_use]
    pub fn with_extrinsic(mut self, extrinsic: ImuExtrinsic) -> Self {
        self.extrinsic = extrinsic;
        self
    }
}
