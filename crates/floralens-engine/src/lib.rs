//! Floralens Engine
//!
//! The prediction pipeline behind the flower identification app:
//! - Artifact provisioning: fetch weights, architecture config, and
//!   preprocessor config from a fixed remote store, cache them
//!   locally, and never fetch a file that already exists
//! - Model construction: build a ViT image classifier once per
//!   process from the provisioned artifacts
//! - Prediction: preprocess a decoded image, run inference, and apply
//!   the inclusive 80% confidence threshold
//!
//! The pipeline is synchronous from the caller's perspective and holds
//! no state beyond the cached classifier handle and the on-disk
//! artifact files.

pub mod artifacts;
pub mod config;
pub mod engine;
pub mod model;
pub mod preprocess;

pub use artifacts::{ArtifactKind, ArtifactPaths, ArtifactStore};
pub use config::EngineConfig;
pub use engine::{resolve_prediction, ClassifierHandle, InferenceEngine};
pub use model::{ArchitectureSettings, FlowerModel, ModelLoader, VitClassifier, VitLoader};
pub use preprocess::{Preprocessor, PreprocessorSettings, TargetSize};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::artifacts::{ArtifactKind, ArtifactStore};
    pub use crate::config::EngineConfig;
    pub use crate::engine::{ClassifierHandle, InferenceEngine};
    pub use crate::model::{FlowerModel, ModelLoader};
    pub use crate::preprocess::{Preprocessor, PreprocessorSettings};
    pub use floralens_core::prelude::*;
}
