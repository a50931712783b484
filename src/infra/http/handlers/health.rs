use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pressroom_api_types::HealthResponse;

use crate::application::error::ErrorReport;
use crate::infra::http::state::HttpState;

pub async fn health(State(state): State<HttpState>) -> Response {
    match state.health.ping().await {
        Ok(()) => Json(HealthResponse {
            status: "ok".to_string(),
            database: "up".to_string(),
        })
        .into_response(),
        Err(err) => {
            let mut response = (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded".to_string(),
                    database: "down".to_string(),
                }),
            )
                .into_response();
            ErrorReport::from_error("infra::http::health", StatusCode::SERVICE_UNAVAILABLE, &err)
                .attach(&mut response);
            response
        }
    }
}
