mod commands;
mod error;
mod models;
mod services;

use commands::classifier::ViewStore;
use services::classifier::artifacts::ModelArtifacts;
use tauri::path::BaseDirectory;
use tauri::{Emitter, Manager};

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let app_data_dir = app
                .path()
                .app_data_dir()
                .expect("Failed to get app data directory");

            if !app_data_dir.exists() {
                std::fs::create_dir_all(&app_data_dir).expect("Failed to create app data directory");
            }

            let labels_path = app
                .path()
                .resolve("resources/labels.txt", BaseDirectory::Resource)
                .expect("Failed to resolve label resource");

            let artifacts = ModelArtifacts::new(app_data_dir, labels_path);
            app.manage(artifacts.clone());
            app.manage(ViewStore::new());

            // Fetch the model artifact on first start so classification
            // works without a manual download step.
            let app_handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                if !artifacts.is_downloaded() {
                    let _ = app_handle.emit(
                        "model-auto-download",
                        serde_json::json!({ "status": "downloading" }),
                    );
                    if let Err(e) = artifacts.download_model(&app_handle).await {
                        tracing::error!("Auto-download: failed to fetch model: {}", e);
                        return;
                    }
                }

                let _ = app_handle.emit(
                    "model-auto-download",
                    serde_json::json!({ "status": "ready" }),
                );
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::classifier::get_view_state,
            commands::classifier::classify_file,
            commands::classifier::classify_capture,
            commands::classifier::report_camera_denied,
            commands::classifier::get_model_status,
            commands::classifier::download_model,
            commands::classifier::cancel_download,
            commands::image::get_image_preview,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
