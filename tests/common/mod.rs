//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tablero::config::BoardConfig;
use tablero::{
    ArtifactSlot, Error, InferenceClient, Language, Point, Provider, Result, SpeechSynthesizer,
    Workflow,
};
use tablero::workflow::StrokeInput;

/// Fake MP3 payload returned by the mock synthesizer
pub const FAKE_AUDIO: &[u8] = b"ID3\x03fake-mp3";

/// One remote call seen by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Describe { prompt: String, png: Vec<u8> },
    Generate { prompt: String },
    Synthesize { text: String, language: Language },
}

#[derive(Default)]
struct Inner {
    calls: Vec<Call>,
    keys: Vec<String>,
    descriptions: VecDeque<Result<String>>,
    stories: VecDeque<Result<String>>,
    speech: VecDeque<Result<Vec<u8>>>,
}

/// Recording provider with scripted responses
///
/// Unscripted calls succeed with canned values.
#[derive(Clone, Default)]
pub struct MockProvider {
    inner: Arc<Mutex<Inner>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_description(&self, result: Result<String>) {
        self.inner.lock().unwrap().descriptions.push_back(result);
    }

    pub fn push_story(&self, result: Result<String>) {
        self.inner.lock().unwrap().stories.push_back(result);
    }

    pub fn push_speech(&self, result: Result<Vec<u8>>) {
        self.inner.lock().unwrap().speech.push_back(result);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Keys the provider was asked to build clients with
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().unwrap().keys.clone()
    }

    fn record_key(&self, key: &SecretString) {
        self.inner
            .lock()
            .unwrap()
            .keys
            .push(key.expose_secret().to_string());
    }
}

impl Provider for MockProvider {
    fn inference(&self, api_key: &SecretString) -> Result<Box<dyn InferenceClient>> {
        self.record_key(api_key);
        Ok(Box::new(self.clone()))
    }

    fn speech(&self, api_key: &SecretString) -> Result<Box<dyn SpeechSynthesizer>> {
        self.record_key(api_key);
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl InferenceClient for MockProvider {
    async fn describe(&self, image_png: &[u8], prompt: &str) -> Result<String> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::Describe {
            prompt: prompt.to_string(),
            png: image_png.to_vec(),
        });
        let n = inner.calls.len();
        inner
            .descriptions
            .pop_front()
            .unwrap_or_else(|| Ok(format!("drawing {n}")))
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::Generate {
            prompt: prompt.to_string(),
        });
        inner
            .stories
            .pop_front()
            .unwrap_or_else(|| Ok("Había una vez un sol.".to_string()))
    }
}

#[async_trait]
impl SpeechSynthesizer for MockProvider {
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::Synthesize {
            text: text.to_string(),
            language,
        });
        inner
            .speech
            .pop_front()
            .unwrap_or_else(|| Ok(FAKE_AUDIO.to_vec()))
    }
}

pub fn inference_error(message: &str) -> Error {
    Error::Inference(message.to_string())
}

/// Workflow over a small canvas with the mock provider and a temp artifact slot
pub fn workflow(
    provider: &MockProvider,
    api_key: Option<&str>,
    dir: &tempfile::TempDir,
) -> Workflow {
    workflow_with(provider, api_key, dir, BoardConfig {
        width: 64,
        height: 48,
        ..BoardConfig::default()
    })
}

pub fn workflow_with(
    provider: &MockProvider,
    api_key: Option<&str>,
    dir: &tempfile::TempDir,
    board: BoardConfig,
) -> Workflow {
    Workflow::new(
        &board,
        api_key.map(|k| SecretString::from(k.to_string())),
        Arc::new(provider.clone()),
        ArtifactSlot::new(dir.path().join("sketch.png")),
    )
    .expect("failed to build workflow")
}

/// A short horizontal line across the middle of the canvas
pub fn line() -> StrokeInput {
    StrokeInput {
        points: vec![Point::new(10.0, 20.0), Point::new(40.0, 20.0)],
        width: None,
        color: None,
    }
}
