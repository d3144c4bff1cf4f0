//! Configuration management for the sketch board

pub mod file;

use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};

use crate::canvas::{Rgb, StrokeWidth};
use crate::prompt::Language;
use crate::voice::TtsProvider;
use crate::{Error, Result};

use file::ConfigFile;

/// Default model for descriptions and stories
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default `OpenAI`-compatible API base URL
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Sketch board configuration
#[derive(Debug, Default)]
pub struct Config {
    /// API keys
    pub api_keys: ApiKeys,

    /// Model API configuration
    pub llm: LlmConfig,

    /// Speech synthesis configuration
    pub voice: VoiceConfig,

    /// Canvas and session defaults
    pub board: BoardConfig,

    /// HTTP server configuration
    pub server: ServerConfig,
}

/// API keys for external services
#[derive(Debug, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (vision, chat and TTS)
    pub openai: Option<SecretString>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<SecretString>,
}

/// Model API configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// API base URL, without trailing slash
    pub base_url: String,

    /// Token limit for drawing descriptions
    pub max_tokens: u32,

    /// Token limit for generated stories
    pub story_max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_API_BASE.to_string(),
            max_tokens: 300,
            story_max_tokens: 500,
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Backend used for narration
    pub provider: TtsProvider,

    /// TTS model (e.g. "tts-1", "`eleven_multilingual_v2`")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            provider: TtsProvider::OpenAI,
            tts_model: TtsProvider::OpenAI.default_model().to_string(),
            tts_voice: TtsProvider::OpenAI.default_voice().to_string(),
            tts_speed: 1.0,
        }
    }
}

/// Canvas and session defaults
#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub stroke_width: StrokeWidth,
    pub stroke_color: Rgb,
    pub language: Language,

    /// Number of past analyses shown, most recent first
    pub history_display: usize,

    /// Whether "clear" also forgets past analyses
    pub clear_purges_history: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 300,
            background: Rgb::WHITE,
            stroke_width: StrokeWidth::default(),
            stroke_color: Rgb::BLACK,
            language: Language::default(),
            history_display: 3,
            clear_purges_history: false,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Path to static files directory (web UI)
    pub static_dir: Option<PathBuf>,

    /// Single slot the last analysed drawing is written to
    pub artifact_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 18800,
            static_dir: None,
            artifact_path: default_artifact_path(),
        }
    }
}

/// Default artifact slot: `~/.local/share/tablero/sketch.png` on Linux
fn default_artifact_path() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from("sketch.png"),
        |d| d.data_dir().join("tablero").join("sketch.png"),
    )
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if a configured value cannot be parsed
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::resolve(fc, |name| std::env::var(name).ok())
    }

    /// Merge a parsed config file with environment lookups (env > toml > default)
    ///
    /// Empty environment values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a language, color or provider is invalid
    pub fn resolve<F>(fc: ConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let api_keys = ApiKeys {
            openai: secret(env("OPENAI_API_KEY").or(fc.api_keys.openai)),
            elevenlabs: secret(env("ELEVENLABS_API_KEY").or(fc.api_keys.elevenlabs)),
        };

        let llm_defaults = LlmConfig::default();
        let llm = LlmConfig {
            model: env("TABLERO_MODEL")
                .or(fc.llm.model)
                .unwrap_or(llm_defaults.model),
            base_url: env("TABLERO_API_BASE")
                .or(fc.llm.base_url)
                .map_or(llm_defaults.base_url, |url| url.trim_end_matches('/').to_string()),
            max_tokens: fc.llm.max_tokens.unwrap_or(llm_defaults.max_tokens),
            story_max_tokens: fc
                .llm
                .story_max_tokens
                .unwrap_or(llm_defaults.story_max_tokens),
        };

        let provider = env("TABLERO_TTS_PROVIDER")
            .or(fc.voice.provider)
            .map(|p| p.parse::<TtsProvider>())
            .transpose()?
            .unwrap_or(TtsProvider::OpenAI);
        let voice_defaults = VoiceConfig::default();
        let voice = VoiceConfig {
            provider,
            tts_model: env("TABLERO_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or_else(|| provider.default_model().to_string()),
            tts_voice: fc
                .voice
                .tts_voice
                .unwrap_or_else(|| provider.default_voice().to_string()),
            tts_speed: fc
                .voice
                .tts_speed
                .unwrap_or(voice_defaults.tts_speed)
                .clamp(0.25, 4.0),
        };

        let board_defaults = BoardConfig::default();
        let board = BoardConfig {
            width: fc.board.width.unwrap_or(board_defaults.width),
            height: fc.board.height.unwrap_or(board_defaults.height),
            background: parse_or(fc.board.background, board_defaults.background)?,
            stroke_width: fc
                .board
                .stroke_width
                .map_or(board_defaults.stroke_width, StrokeWidth::new),
            stroke_color: parse_or(fc.board.stroke_color, board_defaults.stroke_color)?,
            language: parse_or(
                env("TABLERO_LANGUAGE").or(fc.board.language),
                board_defaults.language,
            )?,
            history_display: fc
                .board
                .history_display
                .unwrap_or(board_defaults.history_display),
            clear_purges_history: fc
                .board
                .clear_purges_history
                .unwrap_or(board_defaults.clear_purges_history),
        };

        if board.width == 0 || board.height == 0 {
            return Err(Error::Config(format!(
                "canvas size must be positive, got {}x{}",
                board.width, board.height
            )));
        }

        let server_defaults = ServerConfig::default();
        let server = ServerConfig {
            port: env("TABLERO_PORT")
                .map(|p| {
                    p.parse::<u16>()
                        .map_err(|_| Error::Config(format!("invalid TABLERO_PORT: {p}")))
                })
                .transpose()?
                .or(fc.server.port)
                .unwrap_or(server_defaults.port),
            static_dir: env("TABLERO_STATIC_DIR")
                .or(fc.server.static_dir)
                .map(PathBuf::from),
            artifact_path: env("TABLERO_ARTIFACT")
                .or(fc.server.artifact_path)
                .map_or(server_defaults.artifact_path, PathBuf::from),
        };

        Ok(Self {
            api_keys,
            llm,
            voice,
            board,
            server,
        })
    }

    /// Whether an `OpenAI` key was configured up front
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_keys
            .openai
            .as_ref()
            .is_some_and(|k| !k.expose_secret().is_empty())
    }
}

fn secret(value: Option<String>) -> Option<SecretString> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| SecretString::from(v.trim().to_string()))
}

fn parse_or<T>(value: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr<Err = Error>,
{
    value.map_or(Ok(default), |v| v.parse())
}
