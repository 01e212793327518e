//! Login, signup and bearer-token resolution.
//!
//! Tokens have the form `token_<userId>_<millis>` and carry no signature;
//! a token is valid for as long as the user it names exists and is Active.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::notifications::notify_best_effort;
use super::{ServiceError, ServiceResult};
use crate::db::CrmDb;
use crate::permissions::{default_permissions, Permission, Role};
use crate::types::{NotificationType, User, UserStatus};
use crate::util::{new_id, today};

pub const MIN_PASSWORD_LEN: usize = 6;

// ---------------------------------------------------------------------------
// Passwords
// ---------------------------------------------------------------------------

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Salted SHA-256, stored as `salt$hexdigest`.
pub fn hash_password(password: &str) -> String {
    let salt = new_id()[..16].to_string();
    format!("{}${}", salt, digest(&salt, password))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, expected)) => digest(salt, password) == expected,
        None => false,
    }
}

pub fn check_password_length(password: &str) -> ServiceResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::invalid(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

pub fn issue_token(user_id: &str) -> String {
    format!("token_{}_{}", user_id, Utc::now().timestamp_millis())
}

/// Extract the user id from `token_<userId>_<millis>`.
pub fn user_id_from_token(token: &str) -> Option<&str> {
    let rest = token.strip_prefix("token_")?;
    let (user_id, millis) = rest.rsplit_once('_')?;
    if user_id.is_empty() || millis.is_empty() || !millis.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(user_id)
}

/// Resolve a bearer token to an Active user.
pub fn authenticate(db: &CrmDb, token: Option<&str>) -> ServiceResult<User> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServiceError::Unauthorized("No token provided. Please login first.".into()))?;
    let user_id = user_id_from_token(token)
        .ok_or_else(|| ServiceError::Unauthorized("Invalid token. Please login again.".into()))?;
    let user = db
        .get_user(user_id)?
        .ok_or_else(|| ServiceError::Unauthorized("User not found".into()))?;
    if user.status != UserStatus::Active {
        return Err(ServiceError::Forbidden("Account is not active".into()));
    }
    Ok(user)
}

/// Fail with 403 unless `user` holds `permission` (Admin always passes).
pub fn require(user: &User, permission: Permission) -> ServiceResult<()> {
    if user.has_permission(permission) {
        Ok(())
    } else {
        log::warn!(
            "User {} ({}) lacks permission {}",
            user.email,
            user.role.as_str(),
            permission.as_str()
        );
        Err(ServiceError::Forbidden(format!(
            "Insufficient permissions: {} required",
            permission.as_str()
        )))
    }
}

// ---------------------------------------------------------------------------
// Login / signup
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

pub fn login(db: &CrmDb, request: LoginRequest) -> ServiceResult<LoginResponse> {
    let (Some(email), Some(password)) = (
        request.email.filter(|e| !e.trim().is_empty()),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ServiceError::invalid("Email and password are required"));
    };

    let invalid = || ServiceError::Unauthorized("Invalid email or password".into());
    let mut user = db.find_user_by_email(&normalize_email(&email))?.ok_or_else(invalid)?;
    if !verify_password(&password, &user.password_hash) {
        return Err(invalid());
    }
    if user.status != UserStatus::Active {
        return Err(ServiceError::Forbidden(
            "Your account is pending approval. Please wait for admin approval.".into(),
        ));
    }

    user.last_login = Some(today());
    user.updated_at = Utc::now();
    db.update_user(&user)?;
    log::info!("User {} logged in", user.email);

    Ok(LoginResponse {
        token: issue_token(&user.id),
        user,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Register a Pending account and announce it to every user.
pub fn signup(db: &CrmDb, request: SignupRequest) -> ServiceResult<User> {
    let name = request.name.map(|n| n.trim().to_string()).unwrap_or_default();
    let email = request.email.as_deref().map(normalize_email).unwrap_or_default();
    let password = request.password.unwrap_or_default();
    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(ServiceError::invalid("Name, email, and password are required"));
    }
    check_password_length(&password)?;
    if db.find_user_by_email(&email)?.is_some() {
        return Err(ServiceError::invalid("User with this email already exists"));
    }

    let role = request.role.unwrap_or_default();
    let now = Utc::now();
    let user = User {
        id: new_id(),
        name,
        email,
        password_hash: hash_password(&password),
        role,
        permissions: default_permissions(role),
        status: UserStatus::Pending,
        last_login: Some(today()),
        created_at: now,
        updated_at: now,
    };
    db.insert_user(&user).map_err(|e| {
        if e.is_unique_violation() {
            ServiceError::invalid("User with this email already exists")
        } else {
            ServiceError::from(e)
        }
    })?;
    log::info!("Signup request from {} ({})", user.email, role.as_str());

    notify_best_effort(
        db,
        format!("New signup request from {} ({})", user.name, user.email),
        NotificationType::Signup,
        Some(&user.id),
    );
    Ok(user)
}
