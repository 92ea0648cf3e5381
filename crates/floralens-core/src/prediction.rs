//! Prediction result type and threshold policy

use serde::{Deserialize, Serialize};

/// Minimum confidence (in percent) for a prediction to surface a
/// species name. Inclusive: exactly 80.0 counts as confident.
pub const CONFIDENCE_THRESHOLD: f32 = 80.0;

/// Outcome of a single-image prediction.
///
/// A below-threshold result is not an error; callers get an explicit
/// variant so "unconfident" can never be conflated with a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Prediction {
    /// The classifier cleared the confidence threshold
    Confident {
        /// Species name from the label table
        label: String,
        /// Max class probability scaled to a percentage, in (0, 100]
        confidence: f32,
    },

    /// Max class probability fell below the threshold; no label is
    /// surfaced
    NotConfident,
}

impl Prediction {
    /// Apply the threshold policy to an already-selected class.
    pub fn from_scored(label: impl Into<String>, confidence: f32) -> Self {
        if confidence >= CONFIDENCE_THRESHOLD {
            Self::Confident {
                label: label.into(),
                confidence,
            }
        } else {
            Self::NotConfident
        }
    }

    /// True when a label will be shown to the user
    pub fn is_confident(&self) -> bool {
        matches!(self, Self::Confident { .. })
    }
}
