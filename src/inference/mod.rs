//! Hosted model access
//!
//! The workflow only sees two capabilities: describing an image and generating
//! text. Clients are built per trigger from the session's API key through a
//! [`Provider`], so a key entered mid-session applies to the next action.

mod openai;

pub use openai::OpenAiClient;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::config::{Config, LlmConfig, VoiceConfig};
use crate::voice::{SpeechSynthesizer, TextToSpeech, TtsProvider};
use crate::{Error, Result};

/// Multimodal model capabilities used by the board
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Describe a PNG image following `prompt`
    ///
    /// # Errors
    ///
    /// Returns `Error::Inference` on network, API or response failures
    async fn describe(&self, image_png: &[u8], prompt: &str) -> Result<String>;

    /// Generate free text from `prompt`
    ///
    /// # Errors
    ///
    /// Returns `Error::Inference` on network, API or response failures
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Builds remote clients from a session API key
pub trait Provider: Send + Sync {
    /// Client for descriptions and stories
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the key is unusable
    fn inference(&self, api_key: &SecretString) -> Result<Box<dyn InferenceClient>>;

    /// Client for narration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the key is unusable or the backend lacks a key
    fn speech(&self, api_key: &SecretString) -> Result<Box<dyn SpeechSynthesizer>>;
}

/// Production provider backed by `OpenAI` (and optionally `ElevenLabs` for speech)
pub struct OpenAiProvider {
    http: reqwest::Client,
    llm: LlmConfig,
    voice: VoiceConfig,
    elevenlabs_key: Option<SecretString>,
}

impl OpenAiProvider {
    #[must_use]
    pub fn new(llm: LlmConfig, voice: VoiceConfig, elevenlabs_key: Option<SecretString>) -> Self {
        Self {
            http: reqwest::Client::new(),
            llm,
            voice,
            elevenlabs_key,
        }
    }

    /// Build from loaded configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.llm.clone(),
            config.voice.clone(),
            config
                .api_keys
                .elevenlabs
                .as_ref()
                .map(|k| SecretString::from(k.expose_secret().to_owned())),
        )
    }
}

impl Provider for OpenAiProvider {
    fn inference(&self, api_key: &SecretString) -> Result<Box<dyn InferenceClient>> {
        Ok(Box::new(OpenAiClient::new(
            self.http.clone(),
            api_key,
            &self.llm,
        )?))
    }

    fn speech(&self, api_key: &SecretString) -> Result<Box<dyn SpeechSynthesizer>> {
        let tts = match self.voice.provider {
            TtsProvider::OpenAI => TextToSpeech::new_openai(
                self.http.clone(),
                api_key,
                self.voice.tts_voice.clone(),
                self.voice.tts_speed,
                self.voice.tts_model.clone(),
            )?
            .with_base_url(self.llm.base_url.clone()),
            TtsProvider::ElevenLabs => {
                let key = self.elevenlabs_key.as_ref().ok_or_else(|| {
                    Error::Config("ElevenLabs API key required for TTS".to_string())
                })?;
                TextToSpeech::new_elevenlabs(
                    self.http.clone(),
                    key,
                    self.voice.tts_voice.clone(),
                    self.voice.tts_model.clone(),
                )?
            }
        };
        Ok(Box::new(tts))
    }
}
