//! Readiness of the relay and its translator

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `"ok"` when translations can be started, `"degraded"` otherwise
    pub status: &'static str,
    pub version: &'static str,
    pub translator: TranslatorHealth,
}

#[derive(Serialize)]
pub struct TranslatorHealth {
    pub name: String,
    pub available: bool,
}

/// 200 when the translator can be launched, 503 when it cannot
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let translator = state.translator();
    let available = translator.is_available().await;

    if !available {
        tracing::warn!(translator = translator.name(), "Translator is not available");
    }

    let (code, status) = if available {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            translator: TranslatorHealth {
                name: translator.name().to_string(),
                available,
            },
        }),
    )
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}
