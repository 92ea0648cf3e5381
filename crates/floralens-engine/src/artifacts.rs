//! Artifact provisioning: fetch model files once, reuse forever
//!
//! The remote store is a plain HTTP(S) object store with three
//! fixed-name objects. A local file's existence is the only
//! cache-validity signal; downloads go through a temporary file and a
//! rename so a failed fetch can never leave a partial artifact that
//! would pass that check on the next run.

use crate::config::EngineConfig;
use floralens_core::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// The three files needed to reconstruct the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Model weights (safetensors)
    Weights,
    /// Transformer architecture config (config.json)
    ArchitectureConfig,
    /// Image preprocessing parameters (preprocessor_config.json)
    PreprocessorConfig,
}

impl ArtifactKind {
    /// Object key in the remote store; also the local file name.
    pub fn remote_key(&self) -> &'static str {
        match self {
            Self::Weights => "model.safetensors",
            Self::ArchitectureConfig => "config.json",
            Self::PreprocessorConfig => "preprocessor_config.json",
        }
    }

    /// All artifacts in provisioning order
    pub fn all() -> [ArtifactKind; 3] {
        [
            Self::Weights,
            Self::ArchitectureConfig,
            Self::PreprocessorConfig,
        ]
    }
}

/// Local paths of a fully provisioned artifact set
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub weights: PathBuf,
    pub architecture_config: PathBuf,
    pub preprocessor_config: PathBuf,
}

/// Downloads artifacts into a local cache directory
pub struct ArtifactStore {
    base_url: String,
    cache_dir: PathBuf,
    client: reqwest::Client,
    attempts: u32,
}

impl ArtifactStore {
    /// Create a store from engine configuration.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::internal(format!("failed to build http client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.clone(),
            cache_dir: config.cache_dir.clone(),
            client,
            attempts: config.download_attempts.max(1),
        })
    }

    /// Local cache path for an artifact.
    pub fn local_path(&self, kind: ArtifactKind) -> PathBuf {
        self.cache_dir.join(kind.remote_key())
    }

    /// Ensure one artifact exists locally, fetching it if absent.
    ///
    /// Idempotent: if the file is already present no network request
    /// is made. On failure no file (not even a partial one) is left
    /// at the local path.
    pub async fn ensure_local(&self, kind: ArtifactKind) -> Result<PathBuf> {
        let path = self.local_path(kind);
        if path.exists() {
            tracing::debug!(artifact = kind.remote_key(), "artifact already cached");
            return Ok(path);
        }

        tokio::fs::create_dir_all(&self.cache_dir).await?;

        let url = format!("{}{}", self.base_url, kind.remote_key());
        let mut last_err = None;
        for attempt in 1..=self.attempts {
            match self.fetch_to(&url, &path).await {
                Ok(()) => {
                    tracing::info!(artifact = kind.remote_key(), url = %url, "downloaded artifact");
                    return Ok(path);
                }
                Err(e) => {
                    tracing::warn!(
                        artifact = kind.remote_key(),
                        attempt,
                        attempts = self.attempts,
                        error = %e,
                        "artifact fetch failed"
                    );
                    last_err = Some(e);
                }
            }
        }

        Err(Error::download(
            kind.remote_key(),
            last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        ))
    }

    /// Provision the full artifact set.
    pub async fn ensure_all(&self) -> Result<ArtifactPaths> {
        Ok(ArtifactPaths {
            weights: self.ensure_local(ArtifactKind::Weights).await?,
            architecture_config: self.ensure_local(ArtifactKind::ArchitectureConfig).await?,
            preprocessor_config: self.ensure_local(ArtifactKind::PreprocessorConfig).await?,
        })
    }

    /// Fetch a URL into `path` via a temporary sibling file.
    ///
    /// The body is streamed chunk by chunk; the weight file is too
    /// large to buffer whole.
    async fn fetch_to(&self, url: &str, path: &Path) -> Result<()> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::internal(e.to_string()))?;

        // Write-then-rename keeps the existence check trustworthy.
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".part");
        let tmp = PathBuf::from(tmp);

        let write = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| Error::internal(e.to_string()))?
            {
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            tokio::fs::rename(&tmp, path).await?;
            Ok::<(), Error>(())
        }
        .await;

        if write.is_err() {
            let _ = tokio::fs::remove_file(&tmp).await;
        }
        write
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &Path, base_url: &str) -> EngineConfig {
        EngineConfig {
            base_url: base_url.to_string(),
            cache_dir: dir.to_path_buf(),
            device: "cpu".to_string(),
            request_timeout_secs: 2,
            download_attempts: 1,
        }
    }

    #[tokio::test]
    async fn test_cached_file_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), b"{}").unwrap();

        // An unroutable base URL proves no fetch happens.
        let store =
            ArtifactStore::new(&test_config(dir.path(), "http://invalid.invalid/")).unwrap();
        let path = store
            .ensure_local(ArtifactKind::ArchitectureConfig)
            .await
            .unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"{}");
    }

    #[tokio::test]
    async fn test_download_streams_to_cache_file() {
        use tokio::io::AsyncReadExt;

        // Minimal one-shot HTTP server so the full fetch path runs
        // without leaving the host.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let body = vec![7u8; 64 * 1024];
        let served = body.clone();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let header = format!(
                "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                served.len()
            );
            socket.write_all(header.as_bytes()).await.unwrap();
            socket.write_all(&served).await.unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let store =
            ArtifactStore::new(&test_config(dir.path(), &format!("http://{addr}/"))).unwrap();
        let path = store.ensure_local(ArtifactKind::Weights).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), body);
        assert!(!dir.path().join("model.safetensors.part").exists());
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        // Discard port: connection is refused immediately.
        let store = ArtifactStore::new(&test_config(dir.path(), "http://127.0.0.1:9/")).unwrap();

        let err = store.ensure_local(ArtifactKind::Weights).await.unwrap_err();
        assert_eq!(err.kind(), "download");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert!(leftovers.is_empty(), "unexpected files: {leftovers:?}");
    }

    #[tokio::test]
    async fn test_retry_after_failure_uses_fresh_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(&test_config(dir.path(), "http://127.0.0.1:9/")).unwrap();
        assert!(store.ensure_local(ArtifactKind::Weights).await.is_err());

        // Simulate the network coming back by pre-seeding the cache;
        // the next call must succeed off the local file alone.
        std::fs::write(dir.path().join("model.safetensors"), b"weights").unwrap();
        let path = store.ensure_local(ArtifactKind::Weights).await.unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_artifact_keys_are_fixed() {
        assert_eq!(ArtifactKind::Weights.remote_key(), "model.safetensors");
        assert_eq!(ArtifactKind::ArchitectureConfig.remote_key(), "config.json");
        assert_eq!(
            ArtifactKind::PreprocessorConfig.remote_key(),
            "preprocessor_config.json"
        );
    }
}
