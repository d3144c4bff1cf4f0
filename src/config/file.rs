//! TOML configuration file loading
//!
//! Supports `~/.config/tablero/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Model API configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Speech synthesis configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Canvas and session defaults
    #[serde(default)]
    pub board: BoardFileConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// Model API configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gpt-4o-mini")
    pub model: Option<String>,

    /// API base URL (e.g. `https://api.openai.com/v1`)
    pub base_url: Option<String>,

    /// Token limit for drawing descriptions
    pub max_tokens: Option<u32>,

    /// Token limit for generated stories
    pub story_max_tokens: Option<u32>,
}

/// Speech synthesis configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// "openai" or "elevenlabs"
    pub provider: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f32>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub elevenlabs: Option<String>,
}

/// Canvas and session defaults
#[derive(Debug, Default, Deserialize)]
pub struct BoardFileConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Background color, `#rrggbb`
    pub background: Option<String>,
    pub stroke_width: Option<u8>,
    /// Stroke color, `#rrggbb`
    pub stroke_color: Option<String>,
    /// "es", "en" or "fr"
    pub language: Option<String>,
    /// Number of past analyses shown
    pub history_display: Option<usize>,
    /// Whether clearing the board also forgets past analyses
    pub clear_purges_history: Option<bool>,
}

/// HTTP server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    pub port: Option<u16>,
    /// Directory with the web UI
    pub static_dir: Option<String>,
    /// Where the last analysed drawing is written
    pub artifact_path: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ConfigFile {
    config_file_path().map_or_else(ConfigFile::default, |path| load_from(&path))
}

/// Load a TOML config file from an explicit path
///
/// Missing or malformed files fall back to defaults with a warning.
pub fn load_from(path: &Path) -> ConfigFile {
    if !path.exists() {
        return ConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/tablero/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("tablero").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_parses() {
        let fc: ConfigFile = toml::from_str(
            r##"
            [llm]
            model = "gpt-4o"

            [board]
            language = "fr"
            stroke_color = "#ff0000"
            "##,
        )
        .unwrap();

        assert_eq!(fc.llm.model.as_deref(), Some("gpt-4o"));
        assert_eq!(fc.llm.max_tokens, None);
        assert_eq!(fc.board.language.as_deref(), Some("fr"));
        assert_eq!(fc.board.stroke_color.as_deref(), Some("#ff0000"));
        assert!(fc.api_keys.openai.is_none());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let fc = load_from(&dir.path().join("absent.toml"));
        assert!(fc.llm.model.is_none());
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();
        let fc = load_from(&path);
        assert!(fc.server.port.is_none());
    }
}
