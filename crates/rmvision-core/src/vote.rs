//! Rotation direction voting over successive R→P vectors.

use crate::geometry::Point;

/// Samples that must be buffered before a round is counted (a round needs strictly more).
pub const VOTE_MIN_SAMPLES: usize = 10;
/// Net vote that must be exceeded to decide a direction.
pub const VOTE_DECISION_MARGIN: i32 = 7;

/// Rotation direction of the rune as seen by the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i8)]
pub enum Rotation {
    /// Not decided yet.
    #[default]
    Undetermined = 0,
    /// Clockwise on screen.
    Clockwise = 1,
    /// Counter-clockwise on screen.
    CounterClockwise = -1,
}

impl Rotation {
    /// Signed encoding `{-1, 0, 1}`.
    #[must_use]
    pub fn as_i8(self) -> i8 {
        self as i8
    }

    /// True once a direction has been decided.
    #[must_use]
    pub fn is_decided(self) -> bool {
        self != Rotation::Undetermined
    }
}

/// What a single [`RotationVoter::push`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The sample was buffered; the round is still open.
    Pending,
    /// A round completed with a clear majority.
    Decided(Rotation),
    /// A round completed without a clear majority; the buffer was cleared.
    Inconclusive {
        /// Net vote of the failed round.
        net: i32,
    },
    /// The direction was already decided; the sample was ignored.
    AlreadyDecided(Rotation),
}

/// Majority vote of R→P vectors against the first buffered sample.
///
/// Each sample votes with the sign of its cross product against the first
/// one. Once decided the direction sticks until [`RotationVoter::reset`].
#[derive(Debug, Clone, Default)]
pub struct RotationVoter {
    rotation: Rotation,
    samples: Vec<Point>,
}

impl RotationVoter {
    /// An undecided voter with an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current decision.
    #[must_use]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Vectors buffered in the current round.
    #[must_use]
    pub fn samples(&self) -> &[Point] {
        &self.samples
    }

    /// Forget the decision and any buffered samples.
    pub fn reset(&mut self) {
        self.rotation = Rotation::Undetermined;
        self.samples.clear();
    }

    /// Add one R→P vector and close the round if it is full.
    pub fn push(&mut self, r_to_p: Point) -> VoteOutcome {
        if self.rotation.is_decided() {
            return VoteOutcome::AlreadyDecided(self.rotation);
        }

        self.samples.push(r_to_p);
        if self.samples.len() <= VOTE_MIN_SAMPLES {
            return VoteOutcome::Pending;
        }

        let first = self.samples[0];
        let net: i32 = self
            .samples
            .iter()
            .map(|&s| {
                let cross = first.cross(s);
                if cross > 0.0 {
                    1
                } else if cross < 0.0 {
                    -1
                } else {
                    0
                }
            })
            .sum();
        self.samples.clear();

        if net > VOTE_DECISION_MARGIN {
            self.rotation = Rotation::Clockwise;
        } else if net < -VOTE_DECISION_MARGIN {
            self.rotation = Rotation::CounterClockwise;
        } else {
            tracing::warn!(net, "Rotation vote inconclusive");
            return VoteOutcome::Inconclusive { net };
        }

        tracing::info!(rotation = ?self.rotation, net, "Rotation direction decided");
        VoteOutcome::Decided(self.rotation)
    }
}
