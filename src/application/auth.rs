//! Registration, sign-in, and bearer-token authorization.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::{
    application::{
        error::AppError,
        repos::{CreateUserParams, RepoError, UsersRepo},
    },
    domain::{
        entities::UserRecord,
        profile::{validate_password, validate_username},
        types::UserRole,
    },
};

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error("token rejected: {0}")]
    InvalidToken(String),
    #[error("token expired")]
    Expired,
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::InvalidToken(_) | CredentialError::Expired => {
                AppError::unauthorized(err.to_string())
            }
            CredentialError::Hash(_) | CredentialError::Signing(_) => {
                AppError::unexpected(err.to_string())
            }
        }
    }
}

/// Identity carried by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub role: UserRole,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<&UserRecord> for Principal {
    fn from(user: &UserRecord) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in_secs: u64,
}

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, CredentialError>;

    /// `Ok(false)` for a well-formed hash that does not match.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, CredentialError>;
}

pub trait TokenSigner: Send + Sync {
    fn issue(&self, principal: &Principal) -> Result<IssuedToken, CredentialError>;

    fn verify(&self, token: &str) -> Result<Principal, CredentialError>;
}

/// What a protected route requires beyond a valid token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Any verified token.
    Authenticated,
    /// Token claims the admin role.
    AdminClaim,
    /// Account still exists and is active.
    ActiveUser,
    /// Account exists, is active, and is an admin according to the store.
    ActiveAdmin,
}

#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub username: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginCommand {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: IssuedToken,
    pub user: UserRecord,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UsersRepo>,
    hasher: Arc<dyn PasswordHasher>,
    signer: Arc<dyn TokenSigner>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        hasher: Arc<dyn PasswordHasher>,
        signer: Arc<dyn TokenSigner>,
    ) -> Self {
        Self {
            users,
            hasher,
            signer,
        }
    }

    #[instrument(skip(self, command), fields(username = %command.username))]
    pub async fn register(&self, command: RegisterCommand) -> Result<AuthSession, AppError> {
        validate_username(&command.username)?;
        validate_password(&command.password)?;
        let role = parse_role(command.role.as_deref())?;

        if self
            .users
            .find_user_by_username(&command.username)
            .await?
            .is_some()
        {
            return Err(AppError::duplicate(format!(
                "username `{}` is taken",
                command.username
            )));
        }

        let password_hash = hash_password(&self.hasher, command.password).await?;
        let user = self
            .users
            .create_user(CreateUserParams {
                username: command.username.clone(),
                password_hash,
                role,
            })
            .await
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => {
                    AppError::duplicate(format!("username `{}` is taken", command.username))
                }
                other => other.into(),
            })?;

        let token = self.signer.issue(&Principal::from(&user))?;
        info!(
            target: "pressroom::auth",
            user_id = user.id,
            role = user.role.as_str(),
            "user registered"
        );
        Ok(AuthSession { token, user })
    }

    #[instrument(skip(self, command), fields(username = %command.username))]
    pub async fn login(&self, command: LoginCommand) -> Result<AuthSession, AppError> {
        let rejected = || AppError::unauthorized("invalid username or password");

        let user = self
            .users
            .find_user_by_username(&command.username)
            .await?
            .ok_or_else(rejected)?;

        if !verify_password(&self.hasher, command.password, user.password_hash.clone()).await? {
            warn!(
                target: "pressroom::auth",
                user_id = user.id,
                "password mismatch on login"
            );
            return Err(rejected());
        }
        if !user.is_active() {
            return Err(AppError::forbidden("account is disabled"));
        }

        let token = self.signer.issue(&Principal::from(&user))?;
        Ok(AuthSession { token, user })
    }

    /// Verify `token` and enforce `policy`.
    pub async fn authorize(&self, token: &str, policy: AccessPolicy) -> Result<Principal, AppError> {
        let principal = self.signer.verify(token)?;

        match policy {
            AccessPolicy::Authenticated => Ok(principal),
            AccessPolicy::AdminClaim => {
                if principal.is_admin() {
                    Ok(principal)
                } else {
                    Err(AppError::forbidden("admin role required"))
                }
            }
            AccessPolicy::ActiveUser | AccessPolicy::ActiveAdmin => {
                let user = self
                    .users
                    .find_user(principal.user_id)
                    .await?
                    .ok_or_else(|| AppError::unauthorized("account no longer exists"))?;
                if !user.is_active() {
                    return Err(AppError::forbidden("account is disabled"));
                }
                if policy == AccessPolicy::ActiveAdmin && !user.is_admin() {
                    return Err(AppError::forbidden("admin role required"));
                }
                Ok(Principal::from(&user))
            }
        }
    }
}

fn parse_role(raw: Option<&str>) -> Result<UserRole, AppError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(UserRole::User),
        Some(value) => UserRole::parse(value)
            .ok_or_else(|| AppError::validation(format!("role `{value}` must be admin or user"))),
    }
}

/// Runs on the blocking pool.
pub(crate) async fn hash_password(
    hasher: &Arc<dyn PasswordHasher>,
    password: String,
) -> Result<String, AppError> {
    let hasher = Arc::clone(hasher);
    let hashed = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|err| AppError::unexpected(format!("hashing task failed: {err}")))??;
    Ok(hashed)
}

pub(crate) async fn verify_password(
    hasher: &Arc<dyn PasswordHasher>,
    password: String,
    hash: String,
) -> Result<bool, AppError> {
    let hasher = Arc::clone(hasher);
    let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .map_err(|err| AppError::unexpected(format!("verification task failed: {err}")))??;
    Ok(matches)
}
