//! Tablero - AI sketch board
//!
//! Draw on a canvas, have a multimodal model describe the drawing, turn the
//! description into a short story and hear it read aloud.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Presentation (HTTP / web UI)            │
//! └────────────────────┬────────────────────────────────┘
//!                      │ triggers
//! ┌────────────────────▼────────────────────────────────┐
//! │                    Workflow                          │
//! │   Canvas  │  Codec  │  Session  │  Artifact slot     │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                Hosted models                         │
//! │   Vision / chat (inference)  │  Speech (voice)       │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod artifact;
pub mod canvas;
pub mod codec;
pub mod config;
pub mod error;
pub mod inference;
pub mod prompt;
pub mod session;
pub mod voice;
pub mod workflow;

pub use artifact::ArtifactSlot;
pub use canvas::{Canvas, Drawing, Point, Rgb, Stroke, StrokeWidth};
pub use config::Config;
pub use error::{Error, Result};
pub use inference::{InferenceClient, OpenAiProvider, Provider};
pub use prompt::Language;
pub use session::{AnalysisRecord, SessionState};
pub use voice::{SpeechSynthesizer, TextToSpeech, TtsProvider};
pub use workflow::{Notice, Outcome, Trigger, Workflow, WorkflowState};
