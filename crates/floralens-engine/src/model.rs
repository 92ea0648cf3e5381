//! ViT classifier construction and the model seam
//!
//! The engine talks to the model through the [`FlowerModel`] trait so
//! tests can swap in stubs that emit synthetic probability vectors.

use candle_core::{DType, Device, Tensor, D};
use candle_nn::VarBuilder;
use candle_transformers::models::vit;
use floralens_core::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// A constructed classifier: fixed-size tensor in, probability
/// distribution over the known classes out.
///
/// Implementations must return values in (0, 1) summing to 1 and
/// perform no in-place mutation, so one instance can serve concurrent
/// predictions.
pub trait FlowerModel: Send + Sync {
    fn probabilities(&self, input: &Tensor) -> Result<Vec<f32>>;
}

/// Architecture parameters as serialized in a HuggingFace
/// `config.json`. Unknown keys (id2label, torch_dtype, ...) are
/// ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchitectureSettings {
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    pub hidden_act: candle_nn::Activation,
    pub layer_norm_eps: f64,
    pub image_size: usize,
    pub patch_size: usize,
    pub num_channels: usize,
    pub qkv_bias: bool,
}

impl ArchitectureSettings {
    /// Load settings from a provisioned `config.json`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::model_load(format!("failed to read architecture config: {e}")))?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::model_load(format!("invalid architecture config: {e}")))
    }

    fn to_vit_config(&self) -> vit::Config {
        vit::Config {
            hidden_size: self.hidden_size,
            num_hidden_layers: self.num_hidden_layers,
            num_attention_heads: self.num_attention_heads,
            intermediate_size: self.intermediate_size,
            hidden_act: self.hidden_act,
            layer_norm_eps: self.layer_norm_eps,
            image_size: self.image_size,
            patch_size: self.patch_size,
            num_channels: self.num_channels,
            qkv_bias: self.qkv_bias,
        }
    }
}

/// Pluggable backend turning provisioned artifacts into a model.
///
/// The default backend is [`VitLoader`]; tests provide stubs that
/// emit synthetic probability vectors without touching candle.
#[async_trait::async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(
        &self,
        architecture: &ArchitectureSettings,
        weights_path: &Path,
        num_classes: usize,
        device: &Device,
    ) -> Result<Box<dyn FlowerModel>>;
}

/// Default loader building a [`VitClassifier`]
pub struct VitLoader;

#[async_trait::async_trait]
impl ModelLoader for VitLoader {
    async fn load(
        &self,
        architecture: &ArchitectureSettings,
        weights_path: &Path,
        num_classes: usize,
        device: &Device,
    ) -> Result<Box<dyn FlowerModel>> {
        let classifier =
            VitClassifier::from_artifacts(architecture, weights_path, num_classes, device)?;
        Ok(Box::new(classifier))
    }
}

/// ViT image classifier backed by candle
#[derive(Debug)]
pub struct VitClassifier {
    model: vit::Model,
}

impl VitClassifier {
    /// Build the classifier from a provisioned architecture config and
    /// safetensors weight file. A shape mismatch between the two
    /// surfaces here as a model load error.
    pub fn from_artifacts(
        architecture: &ArchitectureSettings,
        weights_path: impl AsRef<Path>,
        num_classes: usize,
        device: &Device,
    ) -> Result<Self> {
        let weights = std::fs::read(weights_path.as_ref())
            .map_err(|e| Error::model_load(format!("failed to read weights: {e}")))?;
        let vb = VarBuilder::from_buffered_safetensors(weights, DType::F32, device)
            .map_err(|e| Error::model_load(format!("failed to load safetensors: {e}")))?;

        let model = vit::Model::new(&architecture.to_vit_config(), num_classes, vb)
            .map_err(|e| Error::model_load(format!("failed to construct ViT model: {e}")))?;

        Ok(Self { model })
    }
}

impl FlowerModel for VitClassifier {
    fn probabilities(&self, input: &Tensor) -> Result<Vec<f32>> {
        let logits = self
            .model
            .forward(input)
            .map_err(|e| Error::internal(format!("inference failed: {e}")))?;
        let probabilities = candle_nn::ops::softmax(&logits, D::Minus1)
            .and_then(|p| p.squeeze(0))
            .and_then(|p| p.to_vec1::<f32>())
            .map_err(|e| Error::internal(format!("failed to normalize scores: {e}")))?;
        Ok(probabilities)
    }
}
