//! Floralens Core
//!
//! Core types shared across floralens components:
//! - Error taxonomy and result handling
//! - The prediction result type and confidence threshold policy
//! - The class-index to species-name label table

pub mod error;
pub mod labels;
pub mod prediction;

pub use error::{Error, Result};
pub use labels::{LabelTable, UNKNOWN_LABEL};
pub use prediction::{Prediction, CONFIDENCE_THRESHOLD};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::labels::{LabelTable, UNKNOWN_LABEL};
    pub use crate::prediction::{Prediction, CONFIDENCE_THRESHOLD};
}
