use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use pressroom_api_types::{CreateExchangeRateRequest, ExchangeRateView};

use crate::application::exchange_rates::CreateExchangeRateCommand;
use crate::infra::http::{error::ApiError, state::HttpState};

pub async fn list_exchange_rates(
    State(state): State<HttpState>,
) -> Result<Json<Vec<ExchangeRateView>>, ApiError> {
    let rates = state.exchange_rates.list().await?;
    Ok(Json(rates))
}

pub async fn create_exchange_rate(
    State(state): State<HttpState>,
    Json(payload): Json<CreateExchangeRateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rate = state
        .exchange_rates
        .create(CreateExchangeRateCommand {
            from_currency: payload.from_currency,
            to_currency: payload.to_currency,
            rate: payload.rate,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(rate)))
}
