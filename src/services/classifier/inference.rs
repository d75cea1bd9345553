use crate::error::AppError;
use crate::models::classify_types::{Normalization, Prediction, PreprocessOptions};
use crate::services::classifier::artifacts::ModelArtifacts;
use crate::services::classifier::labels;
use image::DynamicImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

/// Fixed model input resolution. The tensor shape is [1, INPUT_SIZE,
/// INPUT_SIZE, 3] regardless of the source image dimensions.
pub const INPUT_SIZE: u32 = 224;

pub fn decode_image_bytes(bytes: &[u8]) -> Result<DynamicImage, AppError> {
    image::load_from_memory(bytes).map_err(|e| AppError {
        message: format!("Failed to decode image data: {}", e),
    })
}

pub fn decode_image_file(path: &std::path::Path) -> Result<DynamicImage, AppError> {
    image::ImageReader::open(path)
        .map_err(|e| AppError {
            message: format!("Failed to open image {}: {}", path.display(), e),
        })?
        .decode()
        .map_err(|e| AppError {
            message: format!("Failed to decode image {}: {}", path.display(), e),
        })
}

/// Resize to INPUT_SIZE x INPUT_SIZE (bilinear) and pack the RGB bytes into
/// a float32 NHWC tensor. Pixel values stay raw 0-255 floats unless a
/// scaling mode is selected; the bundled model expects unscaled input.
pub fn preprocess_image(
    img: &DynamicImage,
    opts: PreprocessOptions,
) -> Result<Array4<f32>, AppError> {
    let resized = img.resize_exact(INPUT_SIZE, INPUT_SIZE, image::imageops::FilterType::Triangle);
    let rgb = resized.to_rgb8();

    let raw = rgb.into_raw();
    let mut data = Vec::with_capacity(raw.len());
    match opts.normalization {
        Normalization::None => {
            data.extend(raw.iter().map(|&v| v as f32));
        }
        Normalization::ZeroToOne => {
            data.extend(raw.iter().map(|&v| v as f32 / 255.0));
        }
        Normalization::MinusOneToOne => {
            data.extend(raw.iter().map(|&v| v as f32 / 127.5 - 1.0));
        }
    }

    let side = INPUT_SIZE as usize;
    let tensor = Array4::from_shape_vec((1, side, side, 3), data).map_err(|e| AppError {
        message: format!("Failed to create tensor: {}", e),
    })?;

    Ok(tensor)
}

pub fn run_inference(session: &mut Session, input: Array4<f32>) -> Result<Vec<f32>, AppError> {
    // Get the input name from the model (assuming single input)
    let input_name = session.inputs()[0].name().to_string();

    let input_tensor = Value::from_array(input).map_err(|e| AppError {
        message: format!("Failed to create tensor value: {}", e),
    })?;

    let outputs = session
        .run(ort::inputs![input_name.as_str() => input_tensor])
        .map_err(|e| AppError {
            message: format!("Inference failed: {}", e),
        })?;

    let output_value = outputs.values().next().ok_or_else(|| AppError {
        message: "Model produced no outputs".to_string(),
    })?;

    let (_, data) = output_value
        .try_extract_tensor::<f32>()
        .map_err(|e| AppError {
            message: format!("Failed to extract output tensor: {}", e),
        })?;

    Ok(data.to_vec())
}

/// Arg-max over the score vector, first occurrence winning ties. Returns
/// `None` when the winning index has no matching label (score vector longer
/// than the label list) or either input is empty.
pub fn best_prediction(scores: &[f32], class_labels: &[String]) -> Option<Prediction> {
    let mut max_idx: Option<usize> = None;
    for (idx, &score) in scores.iter().enumerate() {
        match max_idx {
            Some(current) if scores[current] >= score => {}
            _ => max_idx = Some(idx),
        }
    }

    let idx = max_idx?;
    let class_name = class_labels.get(idx)?.clone();
    Some(Prediction {
        class_name,
        confidence: scores[idx],
    })
}

pub fn format_result(scores: &[f32], class_labels: &[String]) -> String {
    match best_prediction(scores, class_labels) {
        Some(p) => format!("Result: {} ({:.2}%)", p.class_name, p.confidence * 100.0),
        None => "Unknown result".to_string(),
    }
}

/// The full classification pipeline for one image: fresh session, resize,
/// pack, infer, read labels, arg-max, format. The session is scoped to this
/// call and released on every exit path, including errors.
pub fn classify_image(
    img: &DynamicImage,
    artifacts: &ModelArtifacts,
    opts: PreprocessOptions,
) -> Result<String, AppError> {
    let mut session = artifacts.open_session()?;

    let tensor = preprocess_image(img, opts)?;
    let scores = run_inference(&mut session, tensor)?;

    let class_labels = labels::load_labels(&artifacts.labels_path)?;

    Ok(format_result(&scores, &class_labels))
}
