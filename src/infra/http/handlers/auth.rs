use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use pressroom_api_types::{AuthTokenResponse, LoginRequest, RegisterRequest};

use crate::application::auth::{AuthSession, LoginCommand, RegisterCommand};
use crate::application::users::user_view;
use crate::infra::http::{error::ApiError, state::HttpState};

pub async fn register(
    State(state): State<HttpState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .auth
        .register(RegisterCommand {
            username: payload.username,
            password: payload.password,
            role: payload.role,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(token_response(session))))
}

pub async fn login(
    State(state): State<HttpState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthTokenResponse>, ApiError> {
    let session = state
        .auth
        .login(LoginCommand {
            username: payload.username,
            password: payload.password,
        })
        .await?;
    Ok(Json(token_response(session)))
}

fn token_response(session: AuthSession) -> AuthTokenResponse {
    AuthTokenResponse {
        token: session.token.token,
        token_type: "Bearer".to_string(),
        expires_in: session.token.expires_in_secs,
        user: user_view(&session.user),
    }
}
