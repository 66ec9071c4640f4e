//! Target color selection.

use thiserror::Error;

/// Color of the targets the robot shoots at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Color {
    /// Red team lights; isolated as R minus B.
    #[default]
    Red,
    /// Blue team lights; isolated as B minus R.
    Blue,
}

/// A numeric color code outside the known set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unsupported color code {0}")]
pub struct UnsupportedColor(pub u8);

impl TryFrom<u8> for Color {
    type Error = UnsupportedColor;

    /// Referee-system codes: `0` is red, `1` is blue.
    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Color::Red),
            1 => Ok(Color::Blue),
            other => {
                tracing::error!(code = other, "Input wrong color");
                Err(UnsupportedColor(other))
            },
        }
    }
}

impl From<Color> for u8 {
    fn from(color: Color) -> Self {
        match color {
            Color::Red => 0,
            Color::Blue => 1,
        }
    }
}
