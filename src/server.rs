//! HTTP boundary: routes, bearer-key authentication, JSON mapping.

use crate::metrics::MetricsReport;
use crate::service::{TranslateRequest, TranslationService};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub struct AppState {
    pub service: TranslationService,
    /// Bearer key required on translate routes; `None` disables the check
    pub api_key: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_fields: Option<usize>,
    /// Number of locales written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_locales: Option<usize>,
    /// Codes of the locales written, in request order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committed_locales: Option<Vec<String>>,
}

impl TranslateResponse {
    fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            ..Default::default()
        }
    }
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<TranslateResponse>)>;

/// Build the router. With `translate_enabled == false` only `/health` is served.
pub fn router(state: Arc<AppState>, translate_enabled: bool) -> Router {
    let mut router = Router::new().route("/health", get(health));

    if translate_enabled {
        router = router
            .route("/api/translate", post(translate))
            .route("/api/translate/metrics", get(metrics));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn translate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<TranslateResponse> {
    authorize(&state, &headers)?;

    let request: TranslateRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!("Rejected translate request body: {}", e);
        (
            StatusCode::BAD_REQUEST,
            Json(TranslateResponse::error("Invalid request body")),
        )
    })?;

    match state.service.translate(request).await {
        Ok(outcome) => Ok(Json(TranslateResponse {
            success: true,
            message: Some(outcome.message()),
            error: outcome.failure.as_ref().map(ToString::to_string),
            translated_fields: Some(outcome.translated_fields),
            translated_locales: Some(outcome.translated_locales.len()),
            committed_locales: (!outcome.translated_locales.is_empty())
                .then_some(outcome.translated_locales),
        })),
        Err(e) => Err((e.status_code(), Json(TranslateResponse::error(e.to_string())))),
    }
}

async fn metrics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<MetricsReport> {
    authorize(&state, &headers)?;
    Ok(Json(state.service.metrics().report()))
}

fn authorize(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(), (StatusCode, Json<TranslateResponse>)> {
    let Some(expected) = state.api_key.as_deref() else {
        return Ok(());
    };

    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    if constant_time_compare(provided, expected) {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(TranslateResponse::error("Unauthorized")),
        ))
    }
}

/// Constant-time string comparison for API keys
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
