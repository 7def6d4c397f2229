//! Account registration and login
//!
//! POST /auth/register: create an account and return a token
//! POST /auth/login:    exchange email + password for a token

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{User, UserRole};
use shared::util::now_millis;
use uuid::Uuid;

use crate::auth::jwt::create_token;
use crate::db;
use crate::state::AppState;
use crate::util::{hash_password, verify_password};

use super::ApiResult;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

const MIN_PASSWORD_LEN: usize = 8;

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_registration(req: &RegisterRequest) -> Result<(), AppError> {
    let name_len = req.name.trim().chars().count();
    if !(2..=100).contains(&name_len) {
        return Err(AppError::validation("name must be 2 to 100 characters"));
    }
    let email = normalize_email(&req.email);
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => return Err(AppError::validation("email is not valid")),
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn issue_token(state: &AppState, user: &User) -> Result<String, AppError> {
    create_token(user.id, &user.email, user.role, &state.jwt_secret).map_err(|e| {
        tracing::error!("JWT creation failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    validate_registration(&req)?;

    let password_hash = hash_password(&req.password).map_err(|e| {
        tracing::error!("Password hashing failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    let user = User {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        email: normalize_email(&req.email),
        role: req.role,
        push_token: None,
        created_at: now_millis(),
    };

    let created = db::users::create(
        &state.pool,
        user.id,
        &user.name,
        &user.email,
        &password_hash,
        user.role,
        user.created_at,
    )
    .await
    .map_err(|e| {
        tracing::error!("DB error during registration: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    if !created {
        return Err(AppError::conflict("email already registered"));
    }

    let token = issue_token(&state, &user)?;
    tracing::info!(user_id = %user.id, role = %user.role, "User registered");

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let row = db::users::find_by_email(&state.pool, &normalize_email(&req.email))
        .await
        .map_err(|e| {
            tracing::error!("DB error during login: {e}");
            AppError::new(ErrorCode::InternalError)
        })?
        .ok_or_else(AppError::invalid_credentials)?;

    if !verify_password(&req.password, &row.password_hash) {
        return Err(AppError::invalid_credentials());
    }

    let user = User {
        id: row.id,
        name: row.name,
        email: row.email,
        role: row.role,
        push_token: None,
        created_at: row.created_at,
    };
    let token = issue_token(&state, &user)?;

    Ok(Json(AuthResponse { token, user }))
}
