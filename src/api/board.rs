//! Board endpoints: drawing, settings and the analyze/story/speech triggers

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;

use super::SharedWorkflow;
use crate::codec::PNG_MIME;
use crate::workflow::{
    BoardSnapshot, Notice, Outcome, RecordView, SettingsUpdate, StrokeInput, Trigger,
    WorkflowState,
};

/// Build board router
pub fn router(workflow: SharedWorkflow) -> Router {
    Router::new()
        .route("/board", get(board))
        .route("/settings", put(update_settings))
        .route("/strokes", post(draw))
        .route("/clear", post(clear))
        .route("/analyze", post(analyze))
        .route("/story", post(story))
        .route("/speech", post(speech))
        .route("/drawing.png", get(drawing))
        .with_state(workflow)
}

/// Result of a trigger, tagged by `status`
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionResponse {
    Drawn {
        state: WorkflowState,
    },
    Cleared {
        state: WorkflowState,
    },
    Skipped {
        state: WorkflowState,
    },
    Described {
        state: WorkflowState,
        analysis: RecordView,
    },
    Narrated {
        state: WorkflowState,
        story: String,
    },
    Notice {
        state: WorkflowState,
        notice: Notice,
        message: &'static str,
    },
}

/// Current board view
async fn board(State(workflow): State<SharedWorkflow>) -> Json<BoardSnapshot> {
    Json(workflow.lock().await.snapshot())
}

/// Change stroke, language or API key settings
async fn update_settings(
    State(workflow): State<SharedWorkflow>,
    Json(update): Json<SettingsUpdate>,
) -> Json<BoardSnapshot> {
    let mut workflow = workflow.lock().await;
    workflow.configure(update);
    Json(workflow.snapshot())
}

/// Paint one stroke
async fn draw(
    State(workflow): State<SharedWorkflow>,
    Json(stroke): Json<StrokeInput>,
) -> Result<Response, BoardError> {
    run(&workflow, Trigger::Draw(stroke)).await
}

/// Wipe the canvas
async fn clear(State(workflow): State<SharedWorkflow>) -> Result<Response, BoardError> {
    run(&workflow, Trigger::Clear).await
}

/// Describe the current drawing
async fn analyze(State(workflow): State<SharedWorkflow>) -> Result<Response, BoardError> {
    run(&workflow, Trigger::Analyze).await
}

/// Generate a story from the last description
async fn story(State(workflow): State<SharedWorkflow>) -> Result<Response, BoardError> {
    run(&workflow, Trigger::GenerateStory).await
}

/// Narrate the last story
///
/// Returns audio in MP3 format, or a JSON notice when a guard refuses
async fn speech(State(workflow): State<SharedWorkflow>) -> Result<Response, BoardError> {
    run(&workflow, Trigger::PlayAudio).await
}

/// Last analysed drawing as stored in the artifact slot
async fn drawing(State(workflow): State<SharedWorkflow>) -> Result<Response, BoardError> {
    let artifact = workflow.lock().await.artifact().clone();
    let png = artifact.load().await?.ok_or(BoardError::NotFound)?;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, PNG_MIME)], png).into_response())
}

/// Hold the session for the whole trigger so actions never overlap
async fn run(workflow: &SharedWorkflow, trigger: Trigger) -> Result<Response, BoardError> {
    let mut workflow = workflow.lock().await;
    let outcome = workflow.handle(trigger).await?;
    Ok(respond(outcome, workflow.state()))
}

fn respond(outcome: Outcome, state: WorkflowState) -> Response {
    let body = match outcome {
        Outcome::Synthesized(audio) => {
            return (
                StatusCode::OK,
                [(header::CONTENT_TYPE, audio.mime_type)],
                audio.bytes,
            )
                .into_response();
        }
        Outcome::Drawn => ActionResponse::Drawn { state },
        Outcome::Cleared => ActionResponse::Cleared { state },
        Outcome::Skipped => ActionResponse::Skipped { state },
        Outcome::Described(record) => ActionResponse::Described {
            state,
            analysis: RecordView::from(&record),
        },
        Outcome::Narrated(story) => ActionResponse::Narrated { state, story },
        Outcome::Notice(notice) => ActionResponse::Notice {
            state,
            notice,
            message: notice.message(),
        },
    };
    Json(body).into_response()
}

/// Board API errors
#[derive(Debug)]
pub enum BoardError {
    NotFound,
    Failed(crate::Error),
}

impl From<crate::Error> for BoardError {
    fn from(e: crate::Error) -> Self {
        Self::Failed(e)
    }
}

impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                "not_found",
                "no drawing has been analysed yet".to_string(),
            ),
            Self::Failed(e) => {
                let (status, code) = match &e {
                    crate::Error::Config(_) => (StatusCode::SERVICE_UNAVAILABLE, "not_configured"),
                    crate::Error::InvalidImage(_) => (StatusCode::BAD_REQUEST, "invalid_image"),
                    crate::Error::Inference(_) | crate::Error::Http(_) => {
                        (StatusCode::BAD_GATEWAY, "inference_failed")
                    }
                    crate::Error::Tts(_) => (StatusCode::BAD_GATEWAY, "synthesis_failed"),
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
                };
                (status, code, e.to_string())
            }
        };

        (status, Json(ErrorResponse { error: ErrorBody { code, message } })).into_response()
    }
}
