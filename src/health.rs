use axum::{Json, debug_handler};
use serde::Serialize;

use crate::AppResult;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

#[debug_handler]
pub async fn health() -> AppResult<Json<Health>> {
    Ok(Json(Health { status: "ok" }))
}
