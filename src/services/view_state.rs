use crate::models::classify_types::{DisplayState, PreprocessOptions};
use std::path::PathBuf;

/// The image a classification request operates on: a file the user picked
/// or the encoded bytes of a camera capture.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageInput {
    File(PathBuf),
    Capture(Vec<u8>),
}

/// Explicit UI state, advanced only through `update`. The generation
/// counter ties an in-flight classification to the request that started
/// it; a completion carrying an older generation is dropped so a stale
/// result can never overwrite the display of a newer request.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub image_path: Option<PathBuf>,
    pub loading: bool,
    pub result_text: String,
    pub generation: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            image_path: None,
            loading: false,
            result_text: "No image selected yet.".to_string(),
            generation: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ImageChosen {
        path: PathBuf,
        options: PreprocessOptions,
    },
    CaptureReceived {
        bytes: Vec<u8>,
        options: PreprocessOptions,
    },
    CameraDenied,
    ClassificationFinished {
        generation: u64,
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Classify {
        generation: u64,
        input: ImageInput,
        options: PreprocessOptions,
    },
}

pub fn init() -> ViewState {
    ViewState::default()
}

pub fn update(state: ViewState, event: Event) -> (ViewState, Vec<Effect>) {
    match event {
        Event::ImageChosen { path, options } => {
            let generation = state.generation + 1;
            (
                ViewState {
                    image_path: Some(path.clone()),
                    loading: true,
                    result_text: "Processing...".to_string(),
                    generation,
                },
                vec![Effect::Classify {
                    generation,
                    input: ImageInput::File(path),
                    options,
                }],
            )
        }
        Event::CaptureReceived { bytes, options } => {
            let generation = state.generation + 1;
            (
                ViewState {
                    image_path: None,
                    loading: true,
                    result_text: "Processing...".to_string(),
                    generation,
                },
                vec![Effect::Classify {
                    generation,
                    input: ImageInput::Capture(bytes),
                    options,
                }],
            )
        }
        Event::CameraDenied => (
            ViewState {
                loading: false,
                result_text: "Camera permission denied.".to_string(),
                ..state
            },
            vec![],
        ),
        Event::ClassificationFinished { generation, text } => {
            if generation == state.generation {
                (
                    ViewState {
                        loading: false,
                        result_text: text,
                        ..state
                    },
                    vec![],
                )
            } else {
                // Superseded request; keep the newer state untouched.
                (state, vec![])
            }
        }
    }
}

pub fn render(state: &ViewState) -> DisplayState {
    DisplayState {
        image_path: state
            .image_path
            .as_ref()
            .map(|p| p.to_string_lossy().to_string()),
        loading: state.loading,
        result_text: state.result_text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_has_no_image_and_prompt_text() {
        let state = init();
        assert!(state.image_path.is_none());
        assert!(!state.loading);
        assert_eq!(state.result_text, "No image selected yet.");
    }

    #[test]
    fn choosing_an_image_starts_a_classification() {
        let (state, effects) = update(
            init(),
            Event::ImageChosen {
                path: PathBuf::from("/photos/pear.jpg"),
                options: PreprocessOptions::default(),
            },
        );

        assert!(state.loading);
        assert_eq!(state.result_text, "Processing...");
        assert_eq!(state.image_path, Some(PathBuf::from("/photos/pear.jpg")));
        assert_eq!(
            effects,
            vec![Effect::Classify {
                generation: state.generation,
                input: ImageInput::File(PathBuf::from("/photos/pear.jpg")),
                options: PreprocessOptions::default(),
            }]
        );
    }

    #[test]
    fn capture_starts_a_classification_without_a_file_path() {
        let (state, effects) = update(
            init(),
            Event::CaptureReceived {
                bytes: vec![1, 2, 3],
                options: PreprocessOptions::default(),
            },
        );

        assert!(state.loading);
        assert!(state.image_path.is_none());
        assert!(matches!(
            effects.as_slice(),
            [Effect::Classify {
                input: ImageInput::Capture(_),
                ..
            }]
        ));
    }

    #[test]
    fn matching_completion_updates_the_result() {
        let (state, _) = update(
            init(),
            Event::ImageChosen {
                path: PathBuf::from("/photos/pear.jpg"),
                options: PreprocessOptions::default(),
            },
        );
        let generation = state.generation;

        let (state, effects) = update(
            state,
            Event::ClassificationFinished {
                generation,
                text: "Result: pear (88.00%)".to_string(),
            },
        );

        assert!(!state.loading);
        assert_eq!(state.result_text, "Result: pear (88.00%)");
        assert!(effects.is_empty());
    }

    #[test]
    fn stale_completion_never_overwrites_a_newer_request() {
        let (state, _) = update(
            init(),
            Event::ImageChosen {
                path: PathBuf::from("/photos/first.jpg"),
                options: PreprocessOptions::default(),
            },
        );
        let first_generation = state.generation;

        // A second image is chosen while the first is still in flight.
        let (state, _) = update(
            state,
            Event::ImageChosen {
                path: PathBuf::from("/photos/second.jpg"),
                options: PreprocessOptions::default(),
            },
        );

        // The first request completes late.
        let (state, _) = update(
            state,
            Event::ClassificationFinished {
                generation: first_generation,
                text: "Result: apple (90.00%)".to_string(),
            },
        );

        assert!(state.loading);
        assert_eq!(state.result_text, "Processing...");

        // The second request's completion still lands.
        let (state, _) = update(
            state,
            Event::ClassificationFinished {
                generation: state.generation,
                text: "Result: banana (75.00%)".to_string(),
            },
        );
        assert!(!state.loading);
        assert_eq!(state.result_text, "Result: banana (75.00%)");
    }

    #[test]
    fn camera_denial_shows_a_status_message() {
        let (state, effects) = update(init(), Event::CameraDenied);
        assert!(!state.loading);
        assert_eq!(state.result_text, "Camera permission denied.");
        assert!(effects.is_empty());
    }

    #[test]
    fn each_request_bumps_the_generation() {
        let (state, _) = update(
            init(),
            Event::ImageChosen {
                path: PathBuf::from("/a.png"),
                options: PreprocessOptions::default(),
            },
        );
        let first = state.generation;
        let (state, _) = update(
            state,
            Event::CaptureReceived {
                bytes: vec![0],
                options: PreprocessOptions::default(),
            },
        );
        assert!(state.generation > first);
    }

    #[test]
    fn render_projects_the_display_fields() {
        let (state, _) = update(
            init(),
            Event::ImageChosen {
                path: PathBuf::from("/photos/kiwi.png"),
                options: PreprocessOptions::default(),
            },
        );
        let display = render(&state);
        assert_eq!(display.image_path.as_deref(), Some("/photos/kiwi.png"));
        assert!(display.loading);
        assert_eq!(display.result_text, "Processing...");
    }
}
