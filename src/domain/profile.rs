//! Field rules for account credentials and profile data.

use super::error::DomainError;

pub const MIN_PASSWORD_CHARS: usize = 6;
pub const MAX_USERNAME_CHARS: usize = 50;
pub const MAX_EMAIL_CHARS: usize = 100;
pub const MAX_AVATAR_CHARS: usize = 255;
pub const MAX_NICKNAME_CHARS: usize = 50;
pub const MAX_BIO_CHARS: usize = 500;
pub const MAX_PHONE_CHARS: usize = 20;

pub fn validate_username(username: &str) -> Result<(), DomainError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("username", "must not be empty"));
    }
    if trimmed != username {
        return Err(DomainError::validation(
            "username",
            "must not start or end with whitespace",
        ));
    }
    check_max_chars("username", username, MAX_USERNAME_CHARS)
}

pub fn validate_password(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(DomainError::validation(
            "password",
            format!("must be at least {MIN_PASSWORD_CHARS} characters"),
        ));
    }
    Ok(())
}

/// Minimal structural check: one `@`, a non-empty local part, and a dotted domain.
pub fn validate_email(email: &str) -> Result<(), DomainError> {
    check_max_chars("email", email, MAX_EMAIL_CHARS)?;
    let invalid = || DomainError::validation("email", format!("`{email}` is not a valid address"));

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}

pub fn validate_avatar(avatar: &str) -> Result<(), DomainError> {
    check_max_chars("avatar", avatar, MAX_AVATAR_CHARS)
}

pub fn validate_nickname(nickname: &str) -> Result<(), DomainError> {
    check_max_chars("nickname", nickname, MAX_NICKNAME_CHARS)
}

pub fn validate_bio(bio: &str) -> Result<(), DomainError> {
    check_max_chars("bio", bio, MAX_BIO_CHARS)
}

pub fn validate_phone(phone: &str) -> Result<(), DomainError> {
    check_max_chars("phone", phone, MAX_PHONE_CHARS)?;
    if !phone
        .chars()
        .all(|ch| ch.is_ascii_digit() || matches!(ch, '+' | '-' | ' ' | '(' | ')'))
    {
        return Err(DomainError::validation(
            "phone",
            "may only contain digits, spaces, and + - ( )",
        ));
    }
    Ok(())
}

fn check_max_chars(field: &'static str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}
