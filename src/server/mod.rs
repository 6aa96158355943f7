//! HTTP API over the pipeline coordinator.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{error, info, instrument};

use crate::config::FarmGuideConfig;
use crate::error::{ErrorCategory, FarmGuideError};
use crate::language::Language;
use crate::pipeline::{PipelineCoordinator, PipelineResult};

const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PipelineCoordinator>,
    pub default_language: Language,
    /// Prefix for `audio_url`; relative URLs when `None`.
    pub public_base_url: Option<String>,
    /// Directory served under `/audio`.
    pub audio_dir: PathBuf,
}

impl AppState {
    pub fn from_config(config: &FarmGuideConfig, pipeline: Arc<PipelineCoordinator>) -> Self {
        Self {
            pipeline,
            default_language: config.settings().default_language,
            public_base_url: config.settings().public_base_url.clone(),
            audio_dir: config.voice_output_dir(),
        }
    }

    fn language(&self, requested: Option<&str>) -> Result<Language, FarmGuideError> {
        match requested.map(str::trim).filter(|l| !l.is_empty()) {
            Some(code) => Language::parse(code),
            None => Ok(self.default_language),
        }
    }

    fn audio_url(&self, path: Option<&Path>) -> Option<String> {
        let name = path?.file_name()?.to_str()?;
        let base = self
            .public_base_url
            .as_deref()
            .map(|b| b.trim_end_matches('/'))
            .unwrap_or_default();
        Some(format!("{base}/audio/{name}"))
    }

    fn response_body(&self, result: PipelineResult) -> QueryResponse {
        QueryResponse {
            audio_url: self.audio_url(result.audio_path.as_deref()),
            response: result.response,
            translated_response: result.translated_response,
        }
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let audio = ServeDir::new(&state.audio_dir);
    Router::new()
        .route("/api/health", get(health))
        .route("/api/query", post(query))
        .route("/api/voice", post(voice))
        .nest_service("/audio", audio)
        .layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES))
        .with_state(state)
}

/// Serve on an already-bound listener.
pub async fn serve_listener(listener: TcpListener, state: AppState) -> Result<(), FarmGuideError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "FarmGuide HTTP server listening");
    }
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Bind `config.settings().bind` and serve until the process exits.
#[instrument(skip_all)]
pub async fn serve(config: &FarmGuideConfig) -> Result<(), FarmGuideError> {
    let pipeline = Arc::new(PipelineCoordinator::from_config(config));
    let state = AppState::from_config(config, pipeline);
    tokio::fs::create_dir_all(&state.audio_dir).await?;
    let listener = TcpListener::bind(&config.settings().bind).await?;
    serve_listener(listener, state).await
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    agent_ready: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        agent_ready: state.pipeline.is_ready().await,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QueryRequest {
    pub ocr_text: Option<String>,
    pub farmer_query: Option<String>,
    pub language: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub response: String,
    pub translated_response: String,
    pub audio_url: Option<String>,
}

async fn query(
    State(state): State<AppState>,
    req: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(req) = req.map_err(|e| FarmGuideError::InvalidArgument(e.body_text()))?;
    let language = state.language(req.language.as_deref())?;
    let result = state
        .pipeline
        .process_text_query_in_session(
            req.ocr_text.as_deref().unwrap_or_default(),
            req.farmer_query.as_deref().unwrap_or_default(),
            language,
            req.session_id.as_deref(),
        )
        .await?;
    Ok(Json(state.response_body(result)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VoiceParams {
    pub language: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VoiceResponse {
    pub transcript: String,
    #[serde(flatten)]
    pub answer: QueryResponse,
}

async fn voice(
    State(state): State<AppState>,
    params: Result<Query<VoiceParams>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<VoiceResponse>, ApiError> {
    let Query(params) = params.map_err(|e| FarmGuideError::InvalidArgument(e.body_text()))?;
    let language = state.language(params.language.as_deref())?;
    let mime = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("audio/wav");
    let voice = state
        .pipeline
        .process_voice_audio(&body, mime, language, params.session_id.as_deref())
        .await?;
    Ok(Json(VoiceResponse {
        transcript: voice.transcript,
        answer: state.response_body(voice.result),
    }))
}

/// Error body `{"error": "..."}` with a status derived from the error.
pub struct ApiError(FarmGuideError);

impl From<FarmGuideError> for ApiError {
    fn from(err: FarmGuideError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.category() {
            ErrorCategory::Input => StatusCode::BAD_REQUEST,
            ErrorCategory::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}
