use crate::models::product::Image;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_USER_NAME_LEN: usize = 30;
pub const MIN_PASSWORD_LEN: usize = 6;

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: Option<Image>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Stored credentials. Never serialized.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: User,
    pub password_hash: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub avatar: Option<Image>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_name(&self.name)?;
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_name(&self.name)?;
        validate_email(&self.email)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct AdminUpdateUserRequest {
    pub name: String,
    pub email: String,
    pub role: String,
}

impl AdminUpdateUserRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_name(&self.name)?;
        validate_email(&self.email)?;
        if self.role != ROLE_USER && self.role != ROLE_ADMIN {
            return Err(format!("Unknown role: {}", self.role));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub confirm_password: String,
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Your password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Please enter your name".into());
    }
    if name.chars().count() > MAX_USER_NAME_LEN {
        return Err(format!(
            "Your name cannot exceed {} characters",
            MAX_USER_NAME_LEN
        ));
    }
    Ok(())
}

// Shape check only: one '@', non-empty local part, dotted domain.
fn validate_email(email: &str) -> Result<(), String> {
    let invalid = || Err("Please enter a valid email address".to_string());
    let Some((local, domain)) = email.split_once('@') else {
        return invalid();
    };
    if local.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return invalid();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(validate_email("jane@example.com").is_ok());
        assert!(validate_email("jane.doe@mail.example.org").is_ok());
        assert!(validate_email("jane").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("jane@example").is_err());
        assert!(validate_email("jane@@example.com").is_err());
        assert!(validate_email("ja ne@example.com").is_err());
    }

    #[test]
    fn register_rules() {
        let mut req = RegisterRequest {
            name: "Jane".into(),
            email: "jane@example.com".into(),
            password: "secret1".into(),
            avatar: None,
        };
        assert!(req.validate().is_ok());

        req.password = "short".into();
        assert!(req.validate().is_err());

        req.password = "secret1".into();
        req.name = "x".repeat(31);
        assert!(req.validate().is_err());
    }

    #[test]
    fn admin_update_rejects_unknown_role() {
        let req = AdminUpdateUserRequest {
            name: "Jane".into(),
            email: "jane@example.com".into(),
            role: "root".into(),
        };
        assert!(req.validate().is_err());
    }
}
