use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use pressroom_api_types::{
    AdminUpdateUserRequest, ChangePasswordRequest, UpdateProfileRequest, UserView,
};

use crate::application::auth::Principal;
use crate::application::users::{AdminUserChanges, ProfileChanges};
use crate::infra::http::{error::ApiError, state::HttpState};

pub async fn current_user(
    State(state): State<HttpState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<UserView>, ApiError> {
    let user = state.users.profile(principal.user_id).await?;
    Ok(Json(user))
}

pub async fn update_current_user(
    State(state): State<HttpState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserView>, ApiError> {
    let changes = ProfileChanges {
        email: payload.email,
        avatar: payload.avatar,
        nickname: payload.nickname,
        bio: payload.bio,
        phone: payload.phone,
    };
    let user = state
        .users
        .update_profile(principal.user_id, changes)
        .await?;
    Ok(Json(user))
}

pub async fn change_password(
    State(state): State<HttpState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .users
        .change_password(
            principal.user_id,
            payload.old_password,
            payload.new_password,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_user(
    State(state): State<HttpState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<Json<UserView>, ApiError> {
    let user = state.users.get_user(id, &principal).await?;
    Ok(Json(user))
}

pub async fn admin_update_user(
    State(state): State<HttpState>,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<Json<UserView>, ApiError> {
    let changes = AdminUserChanges {
        profile: ProfileChanges {
            email: payload.email,
            avatar: payload.avatar,
            nickname: payload.nickname,
            bio: payload.bio,
            phone: payload.phone,
        },
        role: payload.role,
        status: payload.status,
    };
    let user = state.users.admin_update_user(id, changes).await?;
    Ok(Json(user))
}

pub async fn list_users(State(state): State<HttpState>) -> Result<Json<Vec<UserView>>, ApiError> {
    let users = state.users.list_users().await?;
    Ok(Json(users))
}
