use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Clone)]
pub struct ModelStatus {
    pub downloaded: bool,
    pub downloading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Prediction {
    pub class_name: String,
    pub confidence: f32,
}

/// Pixel-value scaling applied before tensor packing. The model this app
/// ships with was exported against raw 0-255 inputs, so `None` is the
/// default; the other variants exist for models trained on scaled inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Normalization {
    #[default]
    None,
    ZeroToOne,
    MinusOneToOne,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessOptions {
    pub normalization: Normalization,
}

/// Projection of the view state sent to the webview after every update.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DisplayState {
    pub image_path: Option<String>,
    pub loading: bool,
    pub result_text: String,
}
