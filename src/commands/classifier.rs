use crate::error::AppError;
use crate::models::classify_types::{DisplayState, ModelStatus, Normalization, PreprocessOptions};
use crate::services::classifier::artifacts::ModelArtifacts;
use crate::services::classifier::inference;
use crate::services::view_state::{self, Effect, Event, ImageInput, ViewState};
use base64::Engine;
use std::path::PathBuf;
use std::sync::Mutex;
use tauri::{AppHandle, Emitter, Manager, State};

/// The current view state. Mutated only by feeding events through the
/// reducer in `view_state`; commands and background completions both go
/// through `dispatch`.
pub struct ViewStore(Mutex<ViewState>);

impl ViewStore {
    pub fn new() -> Self {
        Self(Mutex::new(view_state::init()))
    }
}

impl Default for ViewStore {
    fn default() -> Self {
        Self::new()
    }
}

fn dispatch(app: &AppHandle, event: Event) -> DisplayState {
    let store = app.state::<ViewStore>();
    let (display, effects) = {
        let mut guard = store.0.lock().unwrap();
        let (next, effects) = view_state::update(guard.clone(), event);
        *guard = next.clone();
        (view_state::render(&next), effects)
    };

    let _ = app.emit("view-state", &display);

    for effect in effects {
        run_effect(app, effect);
    }

    display
}

fn run_effect(app: &AppHandle, effect: Effect) {
    match effect {
        Effect::Classify {
            generation,
            input,
            options,
        } => {
            // Inference is CPU-bound; keep it off the UI thread.
            let app = app.clone();
            tauri::async_runtime::spawn_blocking(move || {
                let artifacts = app.state::<ModelArtifacts>().inner().clone();
                let text = run_classification(&artifacts, input, options);
                dispatch(&app, Event::ClassificationFinished { generation, text });
            });
        }
    }
}

/// Boundary between the pipeline and the UI: every failure is folded into
/// display text here, so nothing below can crash the app or leak a panic
/// across the webview bridge.
fn run_classification(
    artifacts: &ModelArtifacts,
    input: ImageInput,
    options: PreprocessOptions,
) -> String {
    let decoded = match &input {
        ImageInput::File(path) => inference::decode_image_file(path),
        ImageInput::Capture(bytes) => inference::decode_image_bytes(bytes),
    };

    let img = match decoded {
        Ok(img) => img,
        Err(e) => {
            tracing::warn!("image decode failed: {}", e);
            return "Error loading image.".to_string();
        }
    };

    match inference::classify_image(&img, artifacts, options) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("classification failed: {}", e);
            format!("Error during classification: {}", e)
        }
    }
}

fn decode_capture_payload(data: &str) -> Result<Vec<u8>, AppError> {
    // The webview sends either a bare base64 string or a full data URL.
    let payload = match data.split_once(',') {
        Some((_, payload)) => payload,
        None => data,
    };
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| AppError {
            message: format!("Failed to decode capture payload: {}", e),
        })
}

#[tauri::command]
pub async fn get_view_state(store: State<'_, ViewStore>) -> Result<DisplayState, AppError> {
    Ok(view_state::render(&store.0.lock().unwrap()))
}

#[tauri::command]
pub async fn classify_file(
    app: AppHandle,
    path: String,
    normalization: Option<Normalization>,
) -> Result<DisplayState, AppError> {
    let options = PreprocessOptions {
        normalization: normalization.unwrap_or_default(),
    };
    Ok(dispatch(
        &app,
        Event::ImageChosen {
            path: PathBuf::from(path),
            options,
        },
    ))
}

#[tauri::command]
pub async fn classify_capture(
    app: AppHandle,
    data: String,
    normalization: Option<Normalization>,
) -> Result<DisplayState, AppError> {
    let bytes = decode_capture_payload(&data)?;
    let options = PreprocessOptions {
        normalization: normalization.unwrap_or_default(),
    };
    Ok(dispatch(&app, Event::CaptureReceived { bytes, options }))
}

#[tauri::command]
pub async fn report_camera_denied(app: AppHandle) -> Result<DisplayState, AppError> {
    Ok(dispatch(&app, Event::CameraDenied))
}

#[tauri::command]
pub async fn get_model_status(
    artifacts: State<'_, ModelArtifacts>,
) -> Result<ModelStatus, AppError> {
    Ok(artifacts.status().await)
}

#[tauri::command]
pub async fn download_model(
    app: AppHandle,
    artifacts: State<'_, ModelArtifacts>,
) -> Result<(), AppError> {
    artifacts.download_model(&app).await
}

#[tauri::command]
pub async fn cancel_download(artifacts: State<'_, ModelArtifacts>) -> Result<(), AppError> {
    artifacts.cancel_download();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_payload_accepts_data_urls() {
        let encoded = base64::engine::general_purpose::STANDARD.encode([1u8, 2, 3]);
        let bytes = decode_capture_payload(&format!("data:image/png;base64,{}", encoded)).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn capture_payload_accepts_bare_base64() {
        let encoded = base64::engine::general_purpose::STANDARD.encode([9u8, 8]);
        let bytes = decode_capture_payload(&encoded).unwrap();
        assert_eq!(bytes, vec![9, 8]);
    }

    #[test]
    fn capture_payload_rejects_invalid_base64() {
        assert!(decode_capture_payload("data:image/png;base64,!!!").is_err());
    }
}
