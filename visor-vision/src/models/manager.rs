//! Model manager with download-and-cache acquisition
//!
//! Model artifacts are acquired once, during startup, never lazily inside a
//! request. A failed acquisition degrades the owning capability; the rest of
//! the service keeps running.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use visor_core::{Result, VisionConfig, VisionError};

/// SeetaFace frontal face model, published with the rustface engine.
const FACE_MODEL_NAME: &str = "seeta_fd_frontal_v1.0.bin";
const FACE_MODEL_URL: &str =
    "https://github.com/atomashpolskiy/rustface/raw/master/model/seeta_fd_frontal_v1.0.bin";
const FACE_MODEL_CHECKSUM: &str = ""; // Checksum validation can be added later

/// Hand landmark network. Google distributes the landmarker as a `.task`
/// zip bundle of TFLite graphs, not as ONNX, so there is no default download
/// URL: an ONNX export must already sit in the model directory or be served
/// from the URL named in VISOR_HAND_MODEL_URL.
const HAND_MODEL_NAME: &str = "hand_landmarker.onnx";
const HAND_MODEL_URL_VAR: &str = "VISOR_HAND_MODEL_URL";
const HAND_MODEL_CHECKSUM: &str = "";

/// Emotion network filenames searched in the model directory, best first.
/// This artifact comes out of training and is never downloaded.
const EMOTION_MODEL_CANDIDATES: [&str; 3] =
    ["emotion_cnn_best.onnx", "emotion_cnn_final.onnx", "emotion_cnn.onnx"];

const MAX_MODEL_SIZE: usize = 500_000_000;
const DOWNLOAD_TIMEOUT_SECS: u64 = 600;

/// Downloads and caches model artifacts under the configured model directory.
pub struct ModelManager {
    config: Arc<VisionConfig>,
}

impl ModelManager {
    pub fn new(config: Arc<VisionConfig>) -> Self {
        Self { config }
    }

    /// Ensure the model directory exists.
    pub fn ensure_model_dir(&self) -> Result<PathBuf> {
        let model_dir = &self.config.model_dir;
        if !model_dir.exists() {
            fs::create_dir_all(model_dir)?;
            info!("Created model directory: {:?}", model_dir);
        }
        Ok(model_dir.clone())
    }

    /// Download a model if it is not already cached.
    pub async fn ensure_model(&self, model_name: &str, url: &str, checksum: &str) -> Result<PathBuf> {
        // Reject names that could escape the model directory.
        if model_name.is_empty()
            || model_name.len() > 255
            || model_name.contains("..")
            || model_name.contains('/')
            || model_name.contains('\\')
        {
            return Err(VisionError::ModelUnavailable(format!(
                "invalid model name: {model_name:?}"
            )));
        }

        if !url.starts_with("https://") {
            return Err(VisionError::ModelUnavailable(
                "only HTTPS URLs are allowed for model downloads".to_string(),
            ));
        }

        self.ensure_model_dir()?;
        let model_path = self.config.model_dir.join(model_name);
        if model_path.exists() {
            info!("Model {} already cached at {:?}", model_name, model_path);
            return Ok(model_path);
        }

        info!("Downloading model {} from {}", model_name, url);
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .build()?;
        let response = client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(VisionError::ModelUnavailable(format!(
                "failed to download {}: HTTP {}",
                model_name,
                response.status()
            )));
        }

        if let Some(length) = response.content_length() {
            if length > MAX_MODEL_SIZE as u64 {
                return Err(VisionError::ModelUnavailable(format!(
                    "model {} too large: {} bytes",
                    model_name, length
                )));
            }
        }

        let bytes = response.bytes().await?;
        if bytes.len() > MAX_MODEL_SIZE {
            return Err(VisionError::ModelUnavailable(format!(
                "downloaded model {} too large: {} bytes",
                model_name,
                bytes.len()
            )));
        }
        if bytes.len() < 1024 {
            return Err(VisionError::ModelUnavailable(format!(
                "downloaded model {} too small, likely corrupted",
                model_name
            )));
        }
        check_artifact_container(model_name, &bytes)?;

        if !checksum.is_empty() {
            let mut hasher = Sha256::new();
            hasher.update(&bytes);
            let computed = hex::encode(hasher.finalize());
            if computed != checksum {
                return Err(VisionError::ModelUnavailable(format!(
                    "checksum mismatch for {}: expected {}, got {}",
                    model_name, checksum, computed
                )));
            }
            info!("Verified checksum for model {}", model_name);
        }

        // Write to a temp file first so a crash never leaves a truncated
        // artifact behind.
        let temp_path = model_path.with_extension("tmp");
        fs::write(&temp_path, &bytes)?;
        fs::rename(&temp_path, &model_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            VisionError::Io(e)
        })?;

        info!("Model {} saved to {:?} ({} bytes)", model_name, model_path, bytes.len());
        Ok(model_path)
    }

    /// Face detection model path, downloading if needed.
    pub async fn get_face_model(&self) -> Result<PathBuf> {
        self.ensure_model(FACE_MODEL_NAME, FACE_MODEL_URL, FACE_MODEL_CHECKSUM).await
    }

    /// Hand landmark model path: the cached ONNX export, or a download from
    /// the override URL when one is configured.
    pub async fn get_hand_landmark_model(&self) -> Result<PathBuf> {
        let cached = self.config.model_dir.join(HAND_MODEL_NAME);
        if cached.exists() {
            return Ok(cached);
        }
        match std::env::var(HAND_MODEL_URL_VAR) {
            Ok(url) => self.ensure_model(HAND_MODEL_NAME, &url, HAND_MODEL_CHECKSUM).await,
            Err(_) => Err(VisionError::ModelUnavailable(format!(
                "no hand landmark model at {:?}; place an ONNX export of the \
                 MediaPipe hand landmarker there or set {}",
                cached, HAND_MODEL_URL_VAR
            ))),
        }
    }

    /// Find a trained emotion network in the model directory, if any.
    pub fn locate_emotion_model(&self) -> Option<PathBuf> {
        EMOTION_MODEL_CANDIDATES
            .iter()
            .map(|name| self.config.model_dir.join(name))
            .find(|path| path.exists())
    }
}

/// Reject payloads cached under an `.onnx` name that are actually zip
/// archives, such as MediaPipe `.task` bundles.
fn check_artifact_container(model_name: &str, bytes: &[u8]) -> Result<()> {
    if model_name.ends_with(".onnx") && bytes.starts_with(b"PK") {
        return Err(VisionError::ModelUnavailable(format!(
            "downloaded model {model_name} is a zip archive, not an ONNX graph"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager_with_dir(dir: &TempDir) -> ModelManager {
        let mut config = VisionConfig::default();
        config.model_dir = dir.path().to_path_buf();
        ModelManager::new(Arc::new(config))
    }

    #[tokio::test]
    async fn test_ensure_model_dir_idempotent() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_dir(&dir);
        assert!(manager.ensure_model_dir().is_ok());
        assert!(manager.ensure_model_dir().is_ok());
    }

    #[tokio::test]
    async fn test_ensure_model_rejects_bad_names() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_dir(&dir);
        for name in ["", "../evil", "a/b", "a\\b"] {
            let result = manager.ensure_model(name, "https://example.com/m.onnx", "").await;
            assert!(result.is_err(), "name {name:?} should be rejected");
        }
    }

    #[tokio::test]
    async fn test_ensure_model_rejects_non_https() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_dir(&dir);
        let result = manager.ensure_model("m.onnx", "http://example.com/m.onnx", "").await;
        assert!(result.is_err());
        let result = manager.ensure_model("m.onnx", "ftp://example.com/m.onnx", "").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_ensure_model_uses_cached_file() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_dir(&dir);
        let cached = dir.path().join("m.onnx");
        fs::write(&cached, b"cached bytes").unwrap();
        // URL is never contacted when the file is already present.
        let path = manager
            .ensure_model("m.onnx", "https://invalid.invalid/m.onnx", "")
            .await
            .unwrap();
        assert_eq!(path, cached);
    }

    #[test]
    fn test_onnx_artifact_must_not_be_a_zip() {
        assert!(check_artifact_container("m.onnx", b"PK\x03\x04bundle").is_err());
        // Bare protobuf graphs start with a varint field header, not "PK".
        assert!(check_artifact_container("m.onnx", &[0x08, 0x07, 0x12]).is_ok());
        // Non-ONNX artifacts are left alone.
        assert!(check_artifact_container("m.bin", b"PK\x03\x04").is_ok());
    }

    #[tokio::test]
    async fn test_hand_model_requires_cache_or_override() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_dir(&dir);
        std::env::remove_var("VISOR_HAND_MODEL_URL");

        // Nothing cached and no override configured.
        let result = manager.get_hand_landmark_model().await;
        assert!(matches!(result, Err(VisionError::ModelUnavailable(_))));

        // A cached export is used without any network access.
        fs::write(dir.path().join("hand_landmarker.onnx"), b"cached graph").unwrap();
        let path = manager.get_hand_landmark_model().await.unwrap();
        assert!(path.ends_with("hand_landmarker.onnx"));
    }

    #[test]
    fn test_locate_emotion_model_prefers_best() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_dir(&dir);
        assert!(manager.locate_emotion_model().is_none());

        fs::write(dir.path().join("emotion_cnn_final.onnx"), b"x").unwrap();
        fs::write(dir.path().join("emotion_cnn_best.onnx"), b"x").unwrap();
        let found = manager.locate_emotion_model().unwrap();
        assert!(found.ends_with("emotion_cnn_best.onnx"));
    }
}
