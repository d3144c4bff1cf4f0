//! Voice output
//!
//! Narrated stories are synthesized to MP3 and handed to the presentation
//! layer for playback; nothing is written to disk.

mod tts;

pub use tts::{SpeechSynthesizer, TextToSpeech, TtsProvider};

/// MIME type of synthesized audio
pub const AUDIO_MIME: &str = "audio/mpeg";
