//! The inference engine: once-only model construction plus the
//! single-image prediction pipeline

use crate::artifacts::ArtifactStore;
use crate::config::EngineConfig;
use crate::model::{ArchitectureSettings, FlowerModel, ModelLoader, VitLoader};
use crate::preprocess::{Preprocessor, PreprocessorSettings};
use floralens_core::{LabelTable, Prediction, Result};
use image::DynamicImage;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// The constructed model + preprocessor + label table.
///
/// Immutable after construction and shared read-only across
/// concurrent prediction calls.
pub struct ClassifierHandle {
    model: Box<dyn FlowerModel>,
    preprocessor: Preprocessor,
    labels: LabelTable,
}

impl ClassifierHandle {
    pub fn new(
        model: Box<dyn FlowerModel>,
        preprocessor: Preprocessor,
        labels: LabelTable,
    ) -> Self {
        Self {
            model,
            preprocessor,
            labels,
        }
    }

    /// Run the full prediction pipeline on one decoded image.
    pub fn predict(&self, image: &DynamicImage) -> Result<Prediction> {
        let input = self.preprocessor.process(image)?;
        let probabilities = self.model.probabilities(&input)?;
        Ok(resolve_prediction(&probabilities, &self.labels))
    }
}

impl std::fmt::Debug for ClassifierHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierHandle").finish_non_exhaustive()
    }
}

/// Select the winning class and apply the threshold policy.
///
/// Argmax tie-break: the first strictly-greater value wins, so ties
/// resolve to the lowest class index. An empty distribution is never
/// confident.
pub fn resolve_prediction(probabilities: &[f32], labels: &LabelTable) -> Prediction {
    let mut best: Option<(usize, f32)> = None;
    for (index, &p) in probabilities.iter().enumerate() {
        match best {
            Some((_, current)) if p <= current => {}
            _ => best = Some((index, p)),
        }
    }

    match best {
        Some((index, p)) => {
            let confidence = p * 100.0;
            tracing::debug!(index, confidence, "argmax selected");
            Prediction::from_scored(labels.get(index), confidence)
        }
        None => Prediction::NotConfident,
    }
}

/// Lazily-built, process-lifetime inference engine.
///
/// The first prediction (or an explicit [`InferenceEngine::load`])
/// provisions the artifacts and constructs the classifier; exactly one
/// builder runs while concurrent callers wait, and every later call
/// shares the same handle. A failed build is not cached, so a later
/// call may retry.
pub struct InferenceEngine {
    config: EngineConfig,
    labels: LabelTable,
    loader: Box<dyn ModelLoader>,
    handle: OnceCell<Arc<ClassifierHandle>>,
}

impl InferenceEngine {
    pub fn new(config: EngineConfig, labels: LabelTable) -> Self {
        Self::with_loader(config, labels, Box::new(VitLoader))
    }

    /// Engine with a custom model backend.
    pub fn with_loader(
        config: EngineConfig,
        labels: LabelTable,
        loader: Box<dyn ModelLoader>,
    ) -> Self {
        Self {
            config,
            labels,
            loader,
            handle: OnceCell::new(),
        }
    }

    /// Engine with the built-in flower label table and defaults.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default(), LabelTable::flowers())
    }

    /// Get the classifier handle, building it on first use.
    pub async fn load(&self) -> Result<Arc<ClassifierHandle>> {
        self.handle
            .get_or_try_init(|| self.build_handle())
            .await
            .cloned()
    }

    /// Whether the classifier has been built already
    pub fn is_loaded(&self) -> bool {
        self.handle.initialized()
    }

    /// Predict the species on one decoded image.
    ///
    /// Preprocessing failures are local to this call and leave the
    /// cached handle untouched.
    pub async fn predict(&self, image: &DynamicImage) -> Result<Prediction> {
        let handle = self.load().await?;
        handle.predict(image)
    }

    async fn build_handle(&self) -> Result<Arc<ClassifierHandle>> {
        tracing::info!("building classifier");
        let store = ArtifactStore::new(&self.config)?;
        let paths = store.ensure_all().await?;

        let device = self.config.resolve_device()?;
        let architecture = ArchitectureSettings::from_file(&paths.architecture_config)?;
        let settings = PreprocessorSettings::from_file(&paths.preprocessor_config)?;

        let model = self
            .loader
            .load(&architecture, &paths.weights, self.labels.len(), &device)
            .await?;
        let preprocessor = Preprocessor::new(settings, device);

        tracing::info!(classes = self.labels.len(), "classifier ready");
        Ok(Arc::new(ClassifierHandle::new(
            model,
            preprocessor,
            self.labels.clone(),
        )))
    }
}
