use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use lemmacard_resolve::{Automatic, Engine, ResolveError};
use lemmacard_source::{CachedSource, JsonDirSource};
use lemmacard_types::WordSense;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

pub type SharedEngine = Arc<Engine<CachedSource<JsonDirSource>>>;

const MAX_WORD_CHARS: usize = 64;

#[derive(Clone)]
pub struct AppState {
    pub engine: SharedEngine,
    pub confirm_default: bool,
}

#[derive(Deserialize)]
pub struct LookupQuery {
    pub word: String,
    /// 1-based sense of the queried word.
    pub sense: Option<usize>,
}

#[derive(Deserialize)]
pub struct EntriesQuery {
    pub word: String,
}

#[derive(Serialize)]
pub struct LookupResponse {
    word: String,
    found: bool,
    path: Vec<String>,
    sense: Option<WordSense>,
}

#[derive(Serialize)]
pub struct EntriesResponse {
    word: String,
    base_words: Vec<String>,
    senses: Vec<WordSense>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/lookup", get(lookup))
        .route("/v1/entries", get(entries))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn lookup(
    State(state): State<AppState>,
    Query(params): Query<LookupQuery>,
) -> Result<Json<LookupResponse>, ApiError> {
    let word = parse_word(&params.word)?;
    let selection = match params.sense {
        Some(0) => return Err(ApiError::bad_request("sense must be >= 1")),
        Some(sense) => Some(sense - 1),
        None => None,
    };

    let engine = Arc::clone(&state.engine);
    let confirm_default = state.confirm_default;
    let query = word.clone();
    let resolution = tokio::task::spawn_blocking(move || {
        let mut policy = Automatic::with_confirm_default(confirm_default);
        engine.resolve_traced(&query, selection, &mut policy)
    })
    .await
    .map_err(|err| {
        error!("lookup task for {word} failed: {err}");
        ApiError::Internal
    })??;

    let found = resolution.is_found();
    Ok(Json(LookupResponse {
        word,
        found,
        path: resolution.path,
        sense: found.then_some(resolution.sense),
    }))
}

async fn entries(
    State(state): State<AppState>,
    Query(params): Query<EntriesQuery>,
) -> Result<Json<EntriesResponse>, ApiError> {
    let word = parse_word(&params.word)?;
    let engine = Arc::clone(&state.engine);
    let query = word.clone();
    let set = tokio::task::spawn_blocking(move || engine.entries(&query))
        .await
        .map_err(|err| {
            error!("entries task for {word} failed: {err}");
            ApiError::Internal
        })??;

    Ok(Json(EntriesResponse {
        word,
        base_words: set.base_word_refs,
        senses: set.senses,
    }))
}

fn parse_word(raw: &str) -> Result<String, ApiError> {
    let word = raw.trim().to_lowercase();
    if word.is_empty() {
        return Err(ApiError::bad_request("word is required"));
    }
    if word.chars().count() > MAX_WORD_CHARS {
        return Err(ApiError::bad_request(format!(
            "word must be at most {MAX_WORD_CHARS} characters"
        )));
    }
    if word.contains(['/', '\\']) || word.starts_with('.') {
        return Err(ApiError::bad_request("word must be a single plain word"));
    }
    Ok(word)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::CycleDetected { .. } => {
                warn!("{err}");
                ApiError::Unprocessable(err.to_string())
            }
            other => {
                error!("lookup failed: {other}");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                let body = Json(ErrorResponse { error: msg });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::Unprocessable(msg) => {
                let body = Json(ErrorResponse { error: msg });
                (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
            }
            ApiError::Internal => {
                let body = Json(json!({ "error": "internal server error" }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}
