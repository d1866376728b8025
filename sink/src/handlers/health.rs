use axum::{extract::State, Json};
use serde::Serialize;

use crate::{db::DriverKind, state::AppState};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub driver: DriverKind,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        driver: state.driver,
    })
}
