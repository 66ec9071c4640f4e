//! Power rune detector: per-frame orchestration of mask extraction, contour
//! search and rotation voting.

use crate::color::{Color, UnsupportedColor};
use crate::config::RuneConfig;
use crate::contour::{find_contours, ContourTree};
use crate::debug::{DebugPainter, NullPainter, OverlayColor};
use crate::geometry::{self, Point};
use crate::image::{Frame, ImageView};
use crate::morphology::clean_mask;
use crate::search::{self, DetectionMiss};
use crate::threshold::{binarize, binarize_in_place, isolate_channel};
use crate::vote::{Rotation, RotationVoter, VoteOutcome};
use bumpalo::Bump;

const CONTOUR_COLOR: OverlayColor = [255, 255, 255];
const FAN_COLOR: OverlayColor = [0, 255, 0];
const ARMOR_COLOR: OverlayColor = [0, 0, 255];
const WINDOW_COLOR: OverlayColor = [0, 255, 255];
const CANDIDATE_COLOR: OverlayColor = [255, 0, 255];
const CENTER_COLOR: OverlayColor = [255, 0, 0];

/// Snapshot of one detection call.
///
/// Every point that was not found in the call, and every vector derived
/// from it, is the origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PowerRune {
    /// Color the detector is tracking.
    pub color: Color,
    /// Rotation direction known after this call.
    pub rotation: Rotation,
    /// Vector from the rotation center R to the armor center P.
    pub r_to_p: Point,
    /// Vector from R to the blade centroid G.
    pub r_to_g: Point,
    /// Rotation center R.
    pub center_r: Point,
    /// Armor center P.
    pub center_p: Point,
    /// Blade centroid G.
    pub center_g: Point,
    /// Aim delay compensation copied from the configuration.
    pub aim_delay: [f32; 3],
    /// P was found in this call.
    pub found_armor: bool,
    /// R was found in this call.
    pub found_r: bool,
    /// G was computed in this call.
    pub found_g: bool,
}

impl PowerRune {
    fn empty(color: Color, rotation: Rotation, aim_delay: [f32; 3]) -> Self {
        Self {
            color,
            rotation,
            aim_delay,
            ..Self::default()
        }
    }

    /// True if P, R and G were all found.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.found_armor && self.found_r && self.found_g
    }

    /// Angle in degrees the blade turned since an earlier snapshot.
    ///
    /// `None` unless both snapshots carry an R→P vector.
    #[must_use]
    pub fn rotation_since(&self, earlier: &PowerRune) -> Option<f32> {
        if self.r_to_p.is_origin() || earlier.r_to_p.is_origin() {
            return None;
        }
        Some(geometry::vector_angle(earlier.r_to_p, self.r_to_p))
    }
}

/// Timing and counts for a single detection call.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunStats {
    /// Time for channel isolation and binarization in milliseconds.
    pub threshold_ms: f64,
    /// Time for dilation and closing in milliseconds.
    pub morphology_ms: f64,
    /// Time for contour extraction in milliseconds.
    pub contours_ms: f64,
    /// Time for the P/R/G search and voting in milliseconds.
    pub search_ms: f64,
    /// Total time in milliseconds.
    pub total_ms: f64,
    /// Number of contours in the hierarchy.
    pub num_contours: usize,
    /// Number of center mark candidates.
    pub num_center_candidates: usize,
    /// First point that could not be found, if any.
    pub miss: Option<DetectionMiss>,
    /// Voter result, if a sample was cast.
    pub vote: Option<VoteOutcome>,
}

/// Power rune detector for one target color.
///
/// The detector owns the rotation voter and all per-frame buffers; calls
/// must be serialized by the caller.
pub struct RuneDetector<P: DebugPainter = NullPainter> {
    arena: Bump,
    config: RuneConfig,
    color: Color,
    painter: P,
    voter: RotationVoter,
    mask: Vec<u8>,
    mask_width: usize,
    mask_height: usize,
    contours: ContourTree,
    candidates: Vec<Point>,
    last: PowerRune,
}

impl RuneDetector<NullPainter> {
    /// Create a detector without debug output.
    #[must_use]
    pub fn new(color: Color, config: RuneConfig) -> Self {
        Self::with_painter(color, config, NullPainter)
    }

    /// Create a detector from a raw color code (`0` red, `1` blue).
    ///
    /// # Errors
    /// Returns [`UnsupportedColor`] for any other code.
    pub fn from_color_code(code: u8, config: RuneConfig) -> Result<Self, UnsupportedColor> {
        Ok(Self::new(Color::try_from(code)?, config))
    }
}

impl<P: DebugPainter> RuneDetector<P> {
    /// Create a detector that reports overlays to `painter` when `config.debug` is set.
    #[must_use]
    pub fn with_painter(color: Color, config: RuneConfig, painter: P) -> Self {
        Self {
            arena: Bump::new(),
            config,
            color,
            painter,
            voter: RotationVoter::new(),
            mask: Vec::new(),
            mask_width: 0,
            mask_height: 0,
            contours: ContourTree::new(),
            candidates: Vec::new(),
            last: PowerRune::empty(color, Rotation::Undetermined, config.aim_delay),
        }
    }

    /// Detector configuration.
    #[must_use]
    pub fn config(&self) -> &RuneConfig {
        &self.config
    }

    /// Target color.
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Rotation direction decided so far.
    #[must_use]
    pub fn rotation(&self) -> Rotation {
        self.voter.rotation()
    }

    /// Drop the decided direction and restart voting.
    pub fn reset_rotation(&mut self) {
        tracing::info!("Rotation direction reset");
        self.voter.reset();
    }

    /// R→P vectors buffered in the current voting round.
    #[must_use]
    pub fn pending_votes(&self) -> &[Point] {
        self.voter.samples()
    }

    /// Snapshot returned by the latest call.
    #[must_use]
    pub fn last(&self) -> &PowerRune {
        &self.last
    }

    /// Cleaned binary mask of the latest frame.
    #[must_use]
    pub fn mask(&self) -> ImageView<'_> {
        ImageView::dense(&self.mask, self.mask_width, self.mask_height)
    }

    /// Contour hierarchy of the latest frame.
    #[must_use]
    pub fn contours(&self) -> &ContourTree {
        &self.contours
    }

    /// Debug painter.
    pub fn painter(&self) -> &P {
        &self.painter
    }

    /// Mutable debug painter, e.g. to flush recorded calls between frames.
    pub fn painter_mut(&mut self) -> &mut P {
        &mut self.painter
    }

    /// Process one frame.
    ///
    /// Never fails: anything not found is reported as the origin and logged.
    pub fn run(&mut self, frame: &Frame) -> PowerRune {
        self.run_with_stats(frame).0
    }

    /// Process one frame and report stage timings.
    pub fn run_with_stats(&mut self, frame: &Frame) -> (PowerRune, RunStats) {
        let mut stats = RunStats::default();
        let start_total = std::time::Instant::now();
        let mut rune = PowerRune::empty(self.color, self.voter.rotation(), self.config.aim_delay);

        self.arena.reset();
        let (w, h) = (frame.width(), frame.height());
        self.mask_width = w;
        self.mask_height = h;
        self.mask.clear();

        if frame.is_empty() {
            tracing::warn!("Empty frame");
            self.contours.clear();
            self.last = rune;
            return (rune, stats);
        }
        self.mask.resize(w * h, 0);

        let start = std::time::Instant::now();
        match frame {
            Frame::Bgr(img) => {
                {
                    let _span = tracing::info_span!("channel_split").entered();
                    isolate_channel(img, self.color, &mut self.mask);
                }
                let _span = tracing::info_span!("binarize").entered();
                binarize_in_place(&mut self.mask, self.config.split_gray_thresh);
            },
            Frame::Gray(img) => {
                let _span = tracing::info_span!("binarize").entered();
                binarize(img, self.config.split_gray_thresh, &mut self.mask);
            },
        }
        stats.threshold_ms = start.elapsed().as_secs_f64() * 1000.0;

        let start = std::time::Instant::now();
        {
            let _span = tracing::info_span!("morphology").entered();
            clean_mask(
                &self.arena,
                &mut self.mask,
                w,
                h,
                self.config.dilate_kernel_size,
                self.config.close_kernel_size,
            );
        }
        stats.morphology_ms = start.elapsed().as_secs_f64() * 1000.0;

        let start = std::time::Instant::now();
        {
            let _span = tracing::info_span!("contours").entered();
            let mask = ImageView::dense(&self.mask, w, h);
            find_contours(&self.arena, &mask, &mut self.contours);
        }
        stats.contours_ms = start.elapsed().as_secs_f64() * 1000.0;
        stats.num_contours = self.contours.len();

        let start = std::time::Instant::now();
        {
            let _span = tracing::info_span!("center_search").entered();
            if let Err(miss) = self.search_centers(&mut rune) {
                stats.miss = Some(miss);
            }
            stats.num_center_candidates = self.candidates.len();

            if rune.found_armor && rune.found_r {
                rune.r_to_p = rune.center_p - rune.center_r;
                rune.r_to_g = rune.center_g - rune.center_r;
                if !self.voter.rotation().is_decided() {
                    stats.vote = Some(self.voter.push(rune.r_to_p));
                }
            }
            rune.rotation = self.voter.rotation();
        }
        stats.search_ms = start.elapsed().as_secs_f64() * 1000.0;
        stats.total_ms = start_total.elapsed().as_secs_f64() * 1000.0;

        tracing::debug!(
            found_armor = rune.found_armor,
            found_r = rune.found_r,
            rotation = ?rune.rotation,
            total_ms = stats.total_ms,
            "Rune frame processed"
        );

        self.last = rune;
        (rune, stats)
    }

    /// Find P, then R, then G, filling `rune` as far as the chain gets.
    fn search_centers(&mut self, rune: &mut PowerRune) -> Result<(), DetectionMiss> {
        self.candidates.clear();
        if self.config.debug {
            for contour in self.contours.iter() {
                self.painter.draw_contour(contour, CONTOUR_COLOR);
            }
        }

        let fan = search::find_armor_center(&self.contours, &self.config)?;
        rune.center_p = fan.armor_center();
        rune.found_armor = true;

        search::collect_center_candidates(&self.contours, &self.config, &mut self.candidates);
        let window = search::center_search_window(&fan.fan_rect, rune.center_p, &self.config);

        if self.config.debug {
            self.painter.draw_rotated_rect(&fan.fan_rect, FAN_COLOR);
            self.painter.draw_rotated_rect(&fan.armor_rect, ARMOR_COLOR);
            self.painter.draw_point(rune.center_p, ARMOR_COLOR);
            self.painter.draw_rotated_rect(&window, WINDOW_COLOR);
            for &c in &self.candidates {
                self.painter.draw_point(c, CANDIDATE_COLOR);
            }
        }

        let center_r = search::find_center_r(&self.candidates, &window, self.config.center_r_offset)?;
        rune.center_r = center_r;
        rune.found_r = true;
        rune.center_g = search::fan_center_g(&fan, center_r);
        rune.found_g = true;

        if self.config.debug {
            self.painter.draw_point(center_r, CENTER_COLOR);
            self.painter.draw_point(rune.center_g, FAN_COLOR);
            self.painter.draw_line(center_r, rune.center_p, CENTER_COLOR);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::{DrawCall, RecordingPainter};
    use crate::test_utils::{reference_rune_mask, REFERENCE_HEIGHT, REFERENCE_WIDTH};

    fn gray(mask: &[u8]) -> Frame<'_> {
        Frame::Gray(ImageView::new(mask, REFERENCE_WIDTH, REFERENCE_HEIGHT, REFERENCE_WIDTH).unwrap())
    }

    #[test]
    fn test_reference_rune_end_to_end() {
        let mask = reference_rune_mask();
        let mut detector = RuneDetector::new(Color::Red, RuneConfig::default());
        let (rune, stats) = detector.run_with_stats(&gray(&mask));

        assert!(rune.is_complete());
        assert_eq!(rune.r_to_p, rune.center_p - rune.center_r);
        assert!((rune.center_p - Point::new(224.5, 149.5)).norm() < 1e-3);
        assert!((rune.center_r - Point::new(47.5, 149.5)).norm() < 1e-3);
        assert!((rune.center_g - Point::new(157.75, 149.5)).norm() < 1e-3);
        assert!((rune.r_to_g - Point::new(110.25, 0.0)).norm() < 1e-3);
        assert_eq!(rune.rotation, Rotation::Undetermined);
        assert_eq!(detector.pending_votes().len(), 1);
        assert_eq!(stats.miss, None);
        assert_eq!(stats.vote, Some(VoteOutcome::Pending));
        assert_eq!(stats.num_contours, 3);
        assert_eq!(detector.last(), &rune);
    }

    #[test]
    fn test_missing_r_zeroes_dependent_fields() {
        let mut mask = reference_rune_mask();
        crate::test_utils::fill_rect(&mut mask, REFERENCE_WIDTH, 40, 142, 55, 157, 0);
        let mut detector = RuneDetector::new(Color::Red, RuneConfig::default());
        let (rune, stats) = detector.run_with_stats(&gray(&mask));

        assert!(rune.found_armor);
        assert!(!rune.found_r && !rune.found_g);
        assert!((rune.center_p - Point::new(224.5, 149.5)).norm() < 1e-3);
        assert_eq!(rune.center_r, Point::ORIGIN);
        assert_eq!(rune.center_g, Point::ORIGIN);
        assert_eq!(rune.r_to_p, Point::ORIGIN);
        assert_eq!(rune.r_to_g, Point::ORIGIN);
        assert_eq!(stats.miss, Some(DetectionMiss::NoCenterCandidates));
        assert!(detector.pending_votes().is_empty());
    }

    #[test]
    fn test_empty_and_blank_frames() {
        let mut detector = RuneDetector::new(Color::Blue, RuneConfig::default());
        let empty = Frame::Gray(ImageView::new(&[], 0, 0, 0).unwrap());
        let rune = detector.run(&empty);
        assert_eq!(rune, PowerRune::empty(Color::Blue, Rotation::Undetermined, [0.0; 3]));

        let blank = vec![0u8; REFERENCE_WIDTH * REFERENCE_HEIGHT];
        let (rune, stats) = detector.run_with_stats(&gray(&blank));
        assert!(!rune.found_armor);
        assert_eq!(rune.center_p, Point::ORIGIN);
        assert_eq!(stats.miss, Some(DetectionMiss::NoArmorCenter));
        assert!(detector.contours().is_empty());
    }

    #[test]
    fn test_debug_painter_only_called_when_enabled() {
        let mask = reference_rune_mask();
        let mut quiet = RuneDetector::with_painter(Color::Red, RuneConfig::default(), RecordingPainter::default());
        quiet.run(&gray(&mask));
        assert!(quiet.painter().calls.is_empty());

        let config = RuneConfig::builder().debug(true).build();
        let mut loud = RuneDetector::with_painter(Color::Red, config, RecordingPainter::default());
        let rune = loud.run(&gray(&mask));
        let calls = &loud.painter().calls;
        assert!(calls.iter().any(|c| matches!(c, DrawCall::RotatedRect(_, color) if *color == FAN_COLOR)));
        assert!(calls.contains(&DrawCall::Line(rune.center_r, rune.center_p, CENTER_COLOR)));

        loud.painter_mut().clear();
        assert!(loud.painter().calls.is_empty());
    }

    #[test]
    fn test_aim_delay_and_color_code() {
        let config = RuneConfig::builder().aim_delay([0.1, -0.2, 0.3]).build();
        let mut detector = RuneDetector::from_color_code(1, config).unwrap();
        assert_eq!(detector.color(), Color::Blue);
        let blank = vec![0u8; REFERENCE_WIDTH * REFERENCE_HEIGHT];
        assert_eq!(detector.run(&gray(&blank)).aim_delay, [0.1, -0.2, 0.3]);

        assert_eq!(
            RuneDetector::from_color_code(9, RuneConfig::default()).err(),
            Some(UnsupportedColor(9))
        );
    }

    #[test]
    fn test_rotation_since() {
        let a = PowerRune {
            r_to_p: Point::new(100.0, 0.0),
            ..PowerRune::default()
        };
        let b = PowerRune {
            r_to_p: Point::new(0.0, 50.0),
            ..PowerRune::default()
        };
        assert!((b.rotation_since(&a).unwrap() - 90.0).abs() < 1e-2);
        assert_eq!(b.rotation_since(&PowerRune::default()), None);
    }
}
