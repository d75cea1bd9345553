use crate::error::AppError;
use crate::models::classify_types::ModelStatus;
use futures::StreamExt;
use ort::session::Session;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tauri::{AppHandle, Emitter};
use tokio::sync::Mutex;

const MODEL_URL: &str =
    "https://huggingface.co/Xenova/mobilenet_v2_1.0_224/resolve/main/onnx/model.onnx";
const MODEL_FILE: &str = "mobilenet_v2_224.onnx";

/// Locations of the classifier's two read-only inputs: the model file in the
/// app data directory and the bundled label resource. Sessions are opened
/// fresh per classification call, so no session lives here.
#[derive(Clone)]
pub struct ModelArtifacts {
    pub model_dir: PathBuf,
    pub labels_path: PathBuf,
    downloading: Arc<Mutex<bool>>,
    error: Arc<Mutex<Option<String>>>,
    cancel_flag: Arc<AtomicBool>,
}

impl ModelArtifacts {
    pub fn new(app_data_dir: PathBuf, labels_path: PathBuf) -> Self {
        Self {
            model_dir: app_data_dir.join("models"),
            labels_path,
            downloading: Arc::new(Mutex::new(false)),
            error: Arc::new(Mutex::new(None)),
            cancel_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(MODEL_FILE)
    }

    pub fn is_downloaded(&self) -> bool {
        self.model_path().exists()
    }

    pub fn cancel_download(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    fn reset_cancel_flag(&self) {
        self.cancel_flag.store(false, Ordering::Relaxed);
    }

    pub async fn status(&self) -> ModelStatus {
        ModelStatus {
            downloaded: self.is_downloaded(),
            downloading: *self.downloading.lock().await,
            error: self.error.lock().await.clone(),
        }
    }

    pub async fn download_model(&self, app: &AppHandle) -> Result<(), AppError> {
        if self.is_downloaded() {
            return Ok(());
        }

        std::fs::create_dir_all(&self.model_dir).map_err(|e| AppError {
            message: format!("Failed to create model directory: {}", e),
        })?;

        {
            let mut downloading = self.downloading.lock().await;
            if *downloading {
                return Err("Model is already downloading".into());
            }
            *downloading = true;
        }
        *self.error.lock().await = None;
        self.reset_cancel_flag();

        let result = download_file(MODEL_URL, &self.model_path(), app, &self.cancel_flag).await;

        *self.downloading.lock().await = false;
        if let Err(ref e) = result {
            *self.error.lock().await = Some(e.message.clone());
        }

        result
    }

    /// Open a fresh inference session on the downloaded artifact. The
    /// returned session is owned by the caller and released when dropped,
    /// which bounds the model's lifetime to a single classification call.
    pub fn open_session(&self) -> Result<Session, AppError> {
        let model_path = self.model_path();
        if !model_path.exists() {
            return Err(AppError {
                message: format!("Model artifact missing: {}", model_path.display()),
            });
        }

        let _ = ort::init().with_name("snap-classify").commit();

        let session = Session::builder()
            .map_err(|e| AppError {
                message: format!("Failed to create session builder: {}", e),
            })?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(|e| AppError {
                message: format!("Failed to set optimization level: {}", e),
            })?
            .with_intra_threads(4)
            .map_err(|e| AppError {
                message: format!("Failed to set intra threads: {}", e),
            })?
            .with_execution_providers([
                ort::execution_providers::CPUExecutionProvider::default().build(),
            ])
            .map_err(|e| AppError {
                message: format!("Failed to register execution provider: {}", e),
            })?
            .commit_from_file(&model_path)
            .map_err(|e| AppError {
                message: format!("Failed to load ONNX model: {}", e),
            })?;

        Ok(session)
    }
}

async fn download_file(
    url: &str,
    dest: &PathBuf,
    app: &AppHandle,
    cancel_flag: &AtomicBool,
) -> Result<(), AppError> {
    let client = reqwest::Client::new();
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(format!("Failed to download {}: HTTP {}", url, response.status()).into());
    }

    let total_size = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;

    let mut file = tokio::fs::File::create(dest).await.map_err(|e| AppError {
        message: format!("Failed to create file {}: {}", dest.display(), e),
    })?;

    let mut stream = response.bytes_stream();
    let mut last_emit = 0;

    while let Some(chunk) = stream.next().await {
        if cancel_flag.load(Ordering::Relaxed) {
            // Clean up partial file
            drop(file);
            let _ = tokio::fs::remove_file(dest).await;
            return Err("Download cancelled".into());
        }

        let chunk = chunk?;
        downloaded += chunk.len() as u64;
        tokio::io::AsyncWriteExt::write_all(&mut file, &chunk)
            .await
            .map_err(|e| AppError {
                message: format!("Failed to write to file: {}", e),
            })?;

        if total_size > 0 {
            let progress = (downloaded * 100) / total_size;
            // Emit every 1% or so to reduce traffic
            if progress > last_emit {
                let _ = app.emit("download-progress", progress);
                last_emit = progress;
            }
        }
    }
    let _ = app.emit("download-progress", 100u64);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifacts_in(dir: &str) -> ModelArtifacts {
        ModelArtifacts::new(PathBuf::from(dir), PathBuf::from(dir).join("labels.txt"))
    }

    #[test]
    fn model_path_lives_under_models_dir() {
        let artifacts = artifacts_in("/tmp/snap-classify-test");
        assert_eq!(
            artifacts.model_path(),
            PathBuf::from("/tmp/snap-classify-test/models").join(MODEL_FILE)
        );
    }

    #[test]
    fn missing_artifact_is_not_downloaded() {
        let artifacts = artifacts_in("/tmp/snap-classify-test-missing");
        assert!(!artifacts.is_downloaded());
    }

    #[test]
    fn open_session_without_artifact_reports_missing_model() {
        let artifacts = artifacts_in("/tmp/snap-classify-test-missing");
        let err = artifacts.open_session().unwrap_err();
        assert!(err.message.contains("Model artifact missing"));
    }
}
