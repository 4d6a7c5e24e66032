//! HTTP routes for ID generation.
//!
//! Generation may block: a pool call waits for an idle member and any call
//! may sleep out an exhausted millisecond. Handlers therefore run
//! [`IdGenerator::next_id`] on Tokio's blocking pool and keep the async
//! workers free.

use crate::server::error::{Error, Result};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use flurry::{Components, IdGenerator, SharedGenerator, SnowflakeId};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Shared handle to the process-wide generator.
#[derive(Clone)]
pub struct AppState {
    generator: Arc<dyn IdGenerator + Send + Sync>,
}

impl AppState {
    pub fn new(generator: SharedGenerator) -> Self {
        Self {
            generator: Arc::from(generator),
        }
    }

    pub fn generator(&self) -> &(dyn IdGenerator + Send + Sync) {
        &*self.generator
    }
}

/// JSON body of `GET /decode/{id}`.
#[derive(Serialize, Debug)]
pub struct DecodedId {
    pub id: SnowflakeId,
    /// Generation time in milliseconds since the UNIX epoch.
    pub unix_millis: u64,
    #[serde(flatten)]
    pub components: Components,
}

/// Builds the application router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(next_id))
        .route("/decode/{id}", get(decode))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn next_id(State(state): State<AppState>) -> Result<String> {
    let generator = Arc::clone(&state.generator);
    let id = tokio::task::spawn_blocking(move || generator.next_id()).await??;
    Ok(id.to_string())
}

async fn decode(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<DecodedId>> {
    let value: i64 = raw.parse().map_err(|_| Error::InvalidId {
        raw: raw.clone(),
        reason: "not a 64-bit integer",
    })?;
    if value < 0 {
        return Err(Error::InvalidId {
            raw,
            reason: "must not be negative",
        });
    }

    let id = SnowflakeId::from_raw(value);
    let components = state.generator.layout().decode(id);
    Ok(Json(DecodedId {
        id,
        unix_millis: components.unix_millis(state.generator.epoch()),
        components,
    }))
}

async fn health() -> &'static str {
    "ok"
}
