//! Difficulty levels and the clamping policy applied after each evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A difficulty level. Higher is harder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Difficulty(pub u8);

impl Difficulty {
    pub fn level(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid difficulty range {min}..={max}: levels start at 1 and min must not exceed max")]
pub struct DifficultyRangeError {
    pub min: u8,
    pub max: u8,
}

/// The inclusive bounds every level is clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyRange {
    min: u8,
    max: u8,
}

impl DifficultyRange {
    pub fn new(min: u8, max: u8) -> Result<Self, DifficultyRangeError> {
        if min == 0 || min > max {
            return Err(DifficultyRangeError { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> Difficulty {
        Difficulty(self.min)
    }

    pub fn max(&self) -> Difficulty {
        Difficulty(self.max)
    }

    pub fn contains(&self, level: Difficulty) -> bool {
        (self.min..=self.max).contains(&level.0)
    }

    pub fn clamp(&self, level: Difficulty) -> Difficulty {
        Difficulty(level.0.clamp(self.min, self.max))
    }

    /// Applies a signed delta, saturating at both ends of the range.
    pub fn apply(&self, level: Difficulty, delta: i8) -> Difficulty {
        let moved = i16::from(level.0) + i16::from(delta);
        let clamped = moved.clamp(i16::from(self.min), i16::from(self.max));
        // The clamp bounds are u8 values, so the cast cannot truncate.
        Difficulty(clamped as u8)
    }

    /// Fraction of the range covered by `level`, for progress display.
    pub fn progress(&self, level: Difficulty) -> f32 {
        f32::from(self.clamp(level).0) / f32::from(self.max)
    }
}

impl Default for DifficultyRange {
    /// Five levels, matching the interviewer prompt's `N/5` scale.
    fn default() -> Self {
        Self { min: 1, max: 5 }
    }
}
