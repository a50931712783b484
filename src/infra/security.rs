//! Credential primitives: Argon2id password hashing and HS256 bearer tokens.

use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{
        self, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
        rand_core::OsRng,
    },
};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::application::auth::{
    CredentialError, IssuedToken, PasswordHasher, Principal, TokenSigner,
};
use crate::domain::types::UserRole;

#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordHasher;

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| CredentialError::Hash(err.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, CredentialError> {
        let parsed = PasswordHash::new(hash).map_err(|err| CredentialError::Hash(err.to_string()))?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(CredentialError::Hash(err.to_string())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    username: String,
    role: UserRole,
    exp: i64,
    iat: i64,
}

/// Signs and verifies HS256 tokens with a shared secret.
#[derive(Clone)]
pub struct JwtTokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtTokenSigner {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }
}

impl TokenSigner for JwtTokenSigner {
    fn issue(&self, principal: &Principal) -> Result<IssuedToken, CredentialError> {
        let ttl_secs = i64::try_from(self.ttl.as_secs())
            .map_err(|_| CredentialError::Signing("token lifetime out of range".into()))?;
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: principal.user_id.to_string(),
            username: principal.username.clone(),
            role: principal.role,
            exp: now.saturating_add(ttl_secs),
            iat: now,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| CredentialError::Signing(err.to_string()))?;
        Ok(IssuedToken {
            token,
            expires_in_secs: self.ttl.as_secs(),
        })
    }

    fn verify(&self, token: &str) -> Result<Principal, CredentialError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => CredentialError::Expired,
                _ => CredentialError::InvalidToken(err.to_string()),
            }
        })?;

        let user_id = data
            .claims
            .sub
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| CredentialError::InvalidToken("subject is not a user id".into()))?;

        Ok(Principal {
            user_id,
            username: data.claims.username,
            role: data.claims.role,
        })
    }
}
