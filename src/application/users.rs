//! Account profiles and administration.

use std::sync::Arc;

use pressroom_api_types::UserView;
use tracing::{info, instrument};

use crate::{
    application::{
        auth::{PasswordHasher, Principal, hash_password, verify_password},
        error::AppError,
        repos::{UserChanges, UsersRepo},
    },
    domain::{
        entities::UserRecord,
        profile::{
            validate_avatar, validate_bio, validate_email, validate_nickname, validate_password,
            validate_phone,
        },
        types::{UserRole, UserStatus},
    },
    util::timestamp::display_timestamp,
};

/// Self-service profile fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub nickname: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AdminUserChanges {
    pub profile: ProfileChanges,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UsersRepo>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    pub fn new(users: Arc<dyn UsersRepo>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { users, hasher }
    }

    #[instrument(skip(self))]
    pub async fn profile(&self, user_id: i64) -> Result<UserView, AppError> {
        let user = self.load(user_id).await?;
        Ok(user_view(&user))
    }

    #[instrument(skip(self, changes))]
    pub async fn update_profile(
        &self,
        user_id: i64,
        changes: ProfileChanges,
    ) -> Result<UserView, AppError> {
        let changes = self.prepare_changes(user_id, changes, None, None).await?;
        let user = self.users.update_user(user_id, &changes).await?;
        Ok(user_view(&user))
    }

    #[instrument(skip(self, old_password, new_password))]
    pub async fn change_password(
        &self,
        user_id: i64,
        old_password: String,
        new_password: String,
    ) -> Result<(), AppError> {
        validate_password(&old_password)?;
        validate_password(&new_password)?;

        let user = self.load(user_id).await?;
        if !verify_password(&self.hasher, old_password, user.password_hash).await? {
            return Err(AppError::validation("current password is incorrect"));
        }

        let hashed = hash_password(&self.hasher, new_password).await?;
        self.users.update_password(user_id, &hashed).await?;
        info!(target: "pressroom::users", user_id, "password changed");
        Ok(())
    }

    /// Admins may read any account; everyone else only their own.
    #[instrument(skip(self, caller), fields(caller = caller.user_id))]
    pub async fn get_user(&self, target: i64, caller: &Principal) -> Result<UserView, AppError> {
        if !caller.is_admin() && caller.user_id != target {
            return Err(AppError::forbidden("cannot view another user's profile"));
        }
        self.profile(target).await
    }

    #[instrument(skip(self, changes))]
    pub async fn admin_update_user(
        &self,
        target: i64,
        changes: AdminUserChanges,
    ) -> Result<UserView, AppError> {
        let changes = self
            .prepare_changes(target, changes.profile, changes.role, changes.status)
            .await?;
        let user = self.users.update_user(target, &changes).await?;
        info!(
            target: "pressroom::users",
            user_id = target,
            role = user.role.as_str(),
            status = user.status.as_str(),
            "user updated by admin"
        );
        Ok(user_view(&user))
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<UserView>, AppError> {
        let users = self.users.list_users().await?;
        Ok(users.iter().map(user_view).collect())
    }

    async fn load(&self, user_id: i64) -> Result<UserRecord, AppError> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user"))
    }

    async fn prepare_changes(
        &self,
        user_id: i64,
        profile: ProfileChanges,
        role: Option<UserRole>,
        status: Option<UserStatus>,
    ) -> Result<UserChanges, AppError> {
        let ProfileChanges {
            email,
            avatar,
            nickname,
            bio,
            phone,
        } = profile;

        let email = email.map(|value| value.trim().to_string());
        if let Some(email) = email.as_deref() {
            validate_email(email)?;
        }
        if let Some(avatar) = avatar.as_deref() {
            validate_avatar(avatar)?;
        }
        if let Some(nickname) = nickname.as_deref() {
            validate_nickname(nickname)?;
        }
        if let Some(bio) = bio.as_deref() {
            validate_bio(bio)?;
        }
        if let Some(phone) = phone.as_deref() {
            validate_phone(phone)?;
        }

        let changes = UserChanges {
            email,
            avatar,
            nickname,
            bio,
            phone,
            role,
            status,
        };
        if changes.is_empty() {
            return Err(AppError::validation("no fields to update"));
        }

        self.load(user_id).await?;
        if let Some(email) = changes.email.as_deref()
            && self.users.email_in_use_by_other(email, user_id).await?
        {
            return Err(AppError::duplicate(format!("email `{email}` is already in use")));
        }

        Ok(changes)
    }
}

pub(crate) fn user_view(user: &UserRecord) -> UserView {
    UserView {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone().unwrap_or_default(),
        avatar: user.avatar.clone().unwrap_or_default(),
        nickname: user.nickname.clone().unwrap_or_default(),
        bio: user.bio.clone().unwrap_or_default(),
        phone: user.phone.clone().unwrap_or_default(),
        role: user.role,
        status: user.status,
        created_at: display_timestamp(user.created_at),
        updated_at: display_timestamp(user.updated_at),
    }
}
