//! Session workflow controller
//!
//! Drives one board session as an explicit state machine:
//!
//! ```text
//! Idle ──draw──▶ Drawing ──analyze──▶ Analyzing ──ok──▶ Analyzed
//!                                                         │ story
//!                                                         ▼
//!                      Synthesized ◀──ok── Synthesizing ◀─ Narrated ◀──ok── Narrating
//! ```
//!
//! Every remote call runs to completion before the next trigger is accepted.
//! A failed call restores the state held before the trigger and leaves the
//! session untouched.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactSlot;
use crate::canvas::{Canvas, Point, Rgb, Stroke, StrokeWidth};
use crate::codec::{self, PNG_MIME};
use crate::config::{BoardConfig, Config};
use crate::inference::Provider;
use crate::prompt::{self, Language};
use crate::session::{AnalysisRecord, SessionState};
use crate::voice::AUDIO_MIME;
use crate::Result;

/// Where the session currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    Drawing,
    Analyzing,
    Analyzed,
    Narrating,
    Narrated,
    Synthesizing,
    Synthesized,
}

impl WorkflowState {
    /// A description is available to build a story on
    #[must_use]
    pub const fn has_analysis(self) -> bool {
        matches!(self, Self::Analyzed | Self::Narrated | Self::Synthesized)
    }

    /// A story is available to narrate
    #[must_use]
    pub const fn has_story(self) -> bool {
        matches!(self, Self::Narrated | Self::Synthesized)
    }
}

/// User-adjustable board settings
pub struct Settings {
    pub stroke_width: StrokeWidth,
    pub stroke_color: Rgb,
    pub language: Language,
    api_key: Option<SecretString>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("stroke_width", &self.stroke_width)
            .field("stroke_color", &self.stroke_color)
            .field("language", &self.language)
            .field("has_api_key", &self.has_api_key())
            .finish()
    }
}

impl Settings {
    #[must_use]
    pub fn from_board(board: &BoardConfig, api_key: Option<SecretString>) -> Self {
        Self {
            stroke_width: board.stroke_width,
            stroke_color: board.stroke_color,
            language: board.language,
            api_key: api_key.filter(|k| !k.expose_secret().trim().is_empty()),
        }
    }

    /// The API key, if one has been entered
    #[must_use]
    pub const fn api_key(&self) -> Option<&SecretString> {
        self.api_key.as_ref()
    }

    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Apply a partial update; an empty key string removes the key
    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(width) = update.stroke_width {
            self.stroke_width = StrokeWidth::new(width);
        }
        if let Some(color) = update.stroke_color {
            self.stroke_color = color;
        }
        if let Some(language) = update.language {
            self.language = language;
        }
        if let Some(key) = update.api_key {
            let key = key.trim();
            self.api_key = (!key.is_empty()).then(|| SecretString::from(key.to_string()));
        }
    }
}

/// Partial settings change from the presentation layer
#[derive(Debug, Default, Deserialize)]
pub struct SettingsUpdate {
    pub stroke_width: Option<u8>,
    pub stroke_color: Option<Rgb>,
    pub language: Option<Language>,
    pub api_key: Option<String>,
}

/// Stroke as sent by the presentation layer; width and color fall back to settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrokeInput {
    pub points: Vec<Point>,
    #[serde(default)]
    pub width: Option<u8>,
    #[serde(default)]
    pub color: Option<Rgb>,
}

/// Discrete user action
#[derive(Debug, Clone)]
pub enum Trigger {
    Draw(StrokeInput),
    Clear,
    Analyze,
    GenerateStory,
    PlayAudio,
}

/// Guard that refused a trigger; shown to the user as a notice, not an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    /// No API key has been entered
    ApiKeyRequired,
    /// A story needs a successful analysis first
    AnalysisRequired,
    /// Narration needs a story first
    StoryRequired,
}

impl Notice {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ApiKeyRequired => "Please enter your API key to continue.",
            Self::AnalysisRequired => "Analyze a drawing before asking for a story.",
            Self::StoryRequired => "Create a story before asking to hear it.",
        }
    }
}

/// Synthesized narration, handed to the presentation layer for playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Audio {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

/// Result of handling a trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Drawn,
    Cleared,
    /// Nothing to do (blank canvas, empty or off-canvas stroke)
    Skipped,
    Described(AnalysisRecord),
    Narrated(String),
    Synthesized(Audio),
    Notice(Notice),
}

/// Workflow controller for one board session
pub struct Workflow {
    settings: Settings,
    canvas: Canvas,
    session: SessionState,
    state: WorkflowState,
    provider: Arc<dyn Provider>,
    artifact: ArtifactSlot,
    history_display: usize,
    clear_purges_history: bool,
}

impl Workflow {
    /// Create a controller with a blank canvas
    ///
    /// # Errors
    ///
    /// Returns error if the configured canvas size is invalid
    pub fn new(
        board: &BoardConfig,
        api_key: Option<SecretString>,
        provider: Arc<dyn Provider>,
        artifact: ArtifactSlot,
    ) -> Result<Self> {
        Ok(Self {
            settings: Settings::from_board(board, api_key),
            canvas: Canvas::new(board.width, board.height, board.background)?,
            session: SessionState::new(),
            state: WorkflowState::Idle,
            provider,
            artifact,
            history_display: board.history_display,
            clear_purges_history: board.clear_purges_history,
        })
    }

    /// Create a controller from loaded configuration
    ///
    /// # Errors
    ///
    /// Returns error if the configured canvas size is invalid
    pub fn from_config(config: &Config, provider: Arc<dyn Provider>) -> Result<Self> {
        let api_key = config
            .api_keys
            .openai
            .as_ref()
            .map(|k| SecretString::from(k.expose_secret().to_owned()));
        Self::new(
            &config.board,
            api_key,
            provider,
            ArtifactSlot::new(config.server.artifact_path.clone()),
        )
    }

    #[must_use]
    pub const fn state(&self) -> WorkflowState {
        self.state
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub const fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    #[must_use]
    pub const fn session(&self) -> &SessionState {
        &self.session
    }

    #[must_use]
    pub const fn artifact(&self) -> &ArtifactSlot {
        &self.artifact
    }

    /// Change settings; takes effect on the next trigger
    pub fn configure(&mut self, update: SettingsUpdate) {
        self.settings.apply(update);
        tracing::debug!(settings = ?self.settings, "settings updated");
    }

    /// Dispatch a trigger to its handler
    ///
    /// # Errors
    ///
    /// Returns error if a remote call fails; the state is restored first
    pub async fn handle(&mut self, trigger: Trigger) -> Result<Outcome> {
        match trigger {
            Trigger::Draw(stroke) => Ok(self.draw(stroke)),
            Trigger::Clear => Ok(self.clear()),
            Trigger::Analyze => self.analyze().await,
            Trigger::GenerateStory => self.generate_story().await,
            Trigger::PlayAudio => self.synthesize_speech().await,
        }
    }

    /// Paint a stroke with the current (or per-stroke) width and color
    ///
    /// A stroke that paints no pixel leaves the state unchanged.
    pub fn draw(&mut self, input: StrokeInput) -> Outcome {
        if input.points.is_empty() {
            return Outcome::Skipped;
        }

        let stroke = Stroke {
            points: input.points,
            width: input
                .width
                .map_or(self.settings.stroke_width, StrokeWidth::new),
            color: input.color.unwrap_or(self.settings.stroke_color),
        };
        if !self.canvas.draw(&stroke) {
            return Outcome::Skipped;
        }

        if self.state == WorkflowState::Idle {
            self.state = WorkflowState::Drawing;
        }
        Outcome::Drawn
    }

    /// Wipe the canvas and hide the current result
    ///
    /// History survives unless the board is configured to purge it.
    pub fn clear(&mut self) -> Outcome {
        self.canvas.clear();
        self.session.reset_display();
        if self.clear_purges_history {
            self.session.clear_history();
        }
        self.state = WorkflowState::Idle;
        tracing::debug!(purged = self.clear_purges_history, "board cleared");
        Outcome::Cleared
    }

    /// Capture the canvas and ask the model to describe it
    ///
    /// A missing key yields a notice and a blank canvas is skipped; neither
    /// touches the network.
    ///
    /// # Errors
    ///
    /// Returns error if the description call fails
    pub async fn analyze(&mut self) -> Result<Outcome> {
        let Some(api_key) = self.settings.api_key() else {
            tracing::warn!("analysis requested without an API key");
            return Ok(Outcome::Notice(Notice::ApiKeyRequired));
        };

        let Some(drawing) = self.canvas.capture() else {
            tracing::debug!("canvas is blank, nothing to analyze");
            return Ok(Outcome::Skipped);
        };

        let png = match codec::encode_png(&drawing) {
            Ok(png) => png,
            Err(e) => {
                tracing::debug!(error = %e, "capture could not be encoded, skipping");
                return Ok(Outcome::Skipped);
            }
        };

        let language = self.settings.language;
        let prior = std::mem::replace(&mut self.state, WorkflowState::Analyzing);
        tracing::info!(language = %language, bytes = png.len(), "analyzing drawing");

        let result = match self.provider.inference(api_key) {
            Ok(client) => client.describe(&png, prompt::describe(language)).await,
            Err(e) => Err(e),
        };

        let description = match result {
            Ok(description) => description,
            Err(e) => {
                self.state = prior;
                tracing::warn!(error = %e, "analysis failed");
                return Err(e);
            }
        };

        if let Err(e) = self.artifact.store(&png).await {
            tracing::warn!(
                path = %self.artifact.path().display(),
                error = %e,
                "failed to store analysed drawing"
            );
        }

        let record = self
            .session
            .append(png, drawing.width(), drawing.height(), description);
        self.state = WorkflowState::Analyzed;
        tracing::info!(
            sequence = record.sequence(),
            history = self.session.history().len(),
            "analysis complete"
        );

        Ok(Outcome::Described(record))
    }

    /// Turn the last description into a short story
    ///
    /// # Errors
    ///
    /// Returns error if the generation call fails
    pub async fn generate_story(&mut self) -> Result<Outcome> {
        let Some(api_key) = self.settings.api_key() else {
            return Ok(Outcome::Notice(Notice::ApiKeyRequired));
        };

        let description = self
            .session
            .last_description()
            .filter(|_| self.state.has_analysis());
        let Some(description) = description else {
            tracing::debug!(state = ?self.state, "story requested without an analysis");
            return Ok(Outcome::Notice(Notice::AnalysisRequired));
        };

        let language = self.settings.language;
        let story_prompt = prompt::story(description, language);
        let prior = std::mem::replace(&mut self.state, WorkflowState::Narrating);
        tracing::info!(language = %language, "generating story");

        let result = match self.provider.inference(api_key) {
            Ok(client) => client.generate(&story_prompt).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(story) => {
                self.session.set_story(story.clone());
                self.state = WorkflowState::Narrated;
                tracing::info!(chars = story.len(), "story ready");
                Ok(Outcome::Narrated(story))
            }
            Err(e) => {
                self.state = prior;
                tracing::warn!(error = %e, "story generation failed");
                Err(e)
            }
        }
    }

    /// Read the last story aloud
    ///
    /// # Errors
    ///
    /// Returns error if speech synthesis fails
    pub async fn synthesize_speech(&mut self) -> Result<Outcome> {
        let Some(api_key) = self.settings.api_key() else {
            return Ok(Outcome::Notice(Notice::ApiKeyRequired));
        };

        let story = self.session.last_story().filter(|_| self.state.has_story());
        let Some(story) = story else {
            tracing::debug!(state = ?self.state, "narration requested without a story");
            return Ok(Outcome::Notice(Notice::StoryRequired));
        };

        let language = self.settings.language;
        let prior = std::mem::replace(&mut self.state, WorkflowState::Synthesizing);
        tracing::info!(language = %language, "synthesizing narration");

        let result = match self.provider.speech(api_key) {
            Ok(tts) => tts.synthesize(story, language).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(bytes) => {
                self.state = WorkflowState::Synthesized;
                tracing::info!(bytes = bytes.len(), "narration ready");
                Ok(Outcome::Synthesized(Audio {
                    bytes,
                    mime_type: AUDIO_MIME,
                }))
            }
            Err(e) => {
                self.state = prior;
                tracing::warn!(error = %e, "speech synthesis failed");
                Err(e)
            }
        }
    }

    /// Presentation view of the board
    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        let current = if self.session.analysis_done() {
            self.session.latest().map(RecordView::from)
        } else {
            None
        };
        let story = if self.session.analysis_done() && self.state.has_story() {
            self.session.last_story().map(ToString::to_string)
        } else {
            None
        };

        BoardSnapshot {
            state: self.state,
            settings: SettingsView {
                stroke_width: self.settings.stroke_width.get(),
                stroke_color: self.settings.stroke_color,
                language: self.settings.language,
                has_api_key: self.settings.has_api_key(),
            },
            canvas: CanvasView {
                width: self.canvas.width(),
                height: self.canvas.height(),
                strokes: self.canvas.stroke_count(),
                blank: self.canvas.is_blank(),
            },
            analysis_done: self.session.analysis_done(),
            current,
            story,
            history: self
                .session
                .recent(self.history_display)
                .map(RecordView::from)
                .collect(),
            history_len: self.session.history().len(),
        }
    }
}

/// Serializable board view for the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct BoardSnapshot {
    pub state: WorkflowState,
    pub settings: SettingsView,
    pub canvas: CanvasView,
    pub analysis_done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<RecordView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story: Option<String>,
    /// Most recent analyses, newest first
    pub history: Vec<RecordView>,
    pub history_len: usize,
}

/// Settings without the secret
#[derive(Debug, Clone, Serialize)]
pub struct SettingsView {
    pub stroke_width: u8,
    pub stroke_color: Rgb,
    pub language: Language,
    pub has_api_key: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CanvasView {
    pub width: u32,
    pub height: u32,
    pub strokes: usize,
    pub blank: bool,
}

/// One analysis as shown to the user
#[derive(Debug, Clone, Serialize)]
pub struct RecordView {
    pub sequence: usize,
    pub description: String,
    pub created_at: DateTime<Utc>,
    /// PNG as a `data:` URI
    pub image: String,
}

impl From<&AnalysisRecord> for RecordView {
    fn from(record: &AnalysisRecord) -> Self {
        Self {
            sequence: record.sequence(),
            description: record.description().to_string(),
            created_at: record.created_at(),
            image: codec::data_uri(PNG_MIME, record.image()),
        }
    }
}
