//! HTTP read API over the indexed events.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::error;

use crate::db;
use crate::errors::IndexerError;
use crate::events::EventRecord;
use crate::summary::{self, SaleSummary};

pub struct ApiState {
    pub pool: SqlitePool,
}

type Shared = State<Arc<ApiState>>;

/// Any failure while serving a request becomes a 500 with a JSON body.
pub struct ApiError(IndexerError);

impl From<IndexerError> for ApiError {
    fn from(e: IndexerError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("API request failed: {}", self.0);
        let body = Json(json!({ "error": self.0.to_string() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

#[derive(Serialize)]
pub struct EventList {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

impl EventList {
    fn new(address: Option<String>, events: Vec<EventRecord>) -> Self {
        Self {
            address,
            count: events.len(),
            events,
        }
    }
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// `GET /events`
pub async fn get_all_events(State(state): Shared) -> Result<Json<EventList>, ApiError> {
    let events = db::get_all_events(&state.pool).await?;
    Ok(Json(EventList::new(None, events)))
}

/// `GET /beneficiaries/:address/events`
///
/// Purchases credited to `address` and admin changes naming it.
pub async fn get_beneficiary_events(
    State(state): Shared,
    Path(address): Path<String>,
) -> Result<Json<EventList>, ApiError> {
    let events = db::get_events_for_subject(&state.pool, &address).await?;
    Ok(Json(EventList::new(Some(address), events)))
}

/// `GET /summary`
///
/// Total raised, tokens sold and supply per cap window, rebuilt from the
/// indexed purchases.
pub async fn get_summary(State(state): Shared) -> Result<Json<SaleSummary>, ApiError> {
    let purchases = db::get_purchases(&state.pool).await?;
    Ok(Json(summary::summarize(&purchases)?))
}
