//! Engine configuration

use candle_core::Device;
use floralens_core::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the inference engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the remote artifact store; artifact keys are
    /// appended directly, so this must end with a slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory holding the cached artifact files
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Device to run inference on (cpu, cuda:N, metal)
    #[serde(default = "default_device")]
    pub device: String,

    /// Per-request timeout for artifact downloads, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Total fetch attempts per artifact before giving up
    #[serde(default = "default_download_attempts")]
    pub download_attempts: u32,
}

fn default_base_url() -> String {
    "https://flowerm.s3.amazonaws.com/".to_string()
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("floralens/models")
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_download_attempts() -> u32 {
    3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            cache_dir: default_cache_dir(),
            device: default_device(),
            request_timeout_secs: default_request_timeout_secs(),
            download_attempts: default_download_attempts(),
        }
    }
}

impl EngineConfig {
    /// Resolve the configured device string to a Candle device.
    pub fn resolve_device(&self) -> Result<Device> {
        let spec = self.device.trim().to_ascii_lowercase();
        if spec == "cpu" {
            return Ok(Device::Cpu);
        }
        if spec == "cuda" || spec.starts_with("cuda:") {
            let idx: usize = spec.strip_prefix("cuda:").unwrap_or("0").parse().map_err(|_| {
                floralens_core::Error::internal(format!("invalid cuda device index: {spec}"))
            })?;
            return Device::new_cuda(idx).map_err(|e| {
                floralens_core::Error::model_load(format!("failed to create CUDA device: {e}"))
            });
        }
        if spec == "metal" {
            return Device::new_metal(0).map_err(|e| {
                floralens_core::Error::model_load(format!("failed to create Metal device: {e}"))
            });
        }
        Err(floralens_core::Error::internal(format!(
            "unknown device spec: {}",
            self.device
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.base_url.ends_with('/'));
        assert_eq!(config.device, "cpu");
        assert_eq!(config.download_attempts, 3);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "device": "cpu", "base_url": "http://localhost:9000/" }"#)
                .unwrap();
        assert_eq!(config.base_url, "http://localhost:9000/");
        assert_eq!(config.request_timeout_secs, 120);
    }

    #[test]
    fn test_cpu_device_resolves() {
        let config = EngineConfig::default();
        assert!(matches!(config.resolve_device().unwrap(), Device::Cpu));
    }

    #[test]
    fn test_bad_device_spec() {
        let config = EngineConfig {
            device: "tpu".to_string(),
            ..Default::default()
        };
        assert!(config.resolve_device().is_err());
    }
}
