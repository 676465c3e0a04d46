// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{CreateUserRequest, LoginRequest, NewUser, ROLE_USER, User},
    storage::{SharedStore, UserStore},
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Resolves credentials to a user; the engine only ever sees the resulting id.
pub async fn authenticate<S: UserStore + ?Sized>(
    store: &S,
    username: &str,
    password: &str,
) -> Result<User, AppError> {
    let user = store
        .find_user_by_username(username)
        .await?
        .ok_or_else(|| AppError::AuthError("Invalid credentials".to_string()))?;

    if !verify_password(password, &user.password)? {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }
    Ok(user)
}

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(store): State<SharedStore>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let new_user = NewUser {
        username: payload.username.trim().to_string(),
        password: hash_password(&payload.password)?,
        full_name: payload.full_name.unwrap_or_default().trim().to_string(),
        role: ROLE_USER.to_string(),
    };

    let user = store.create_user(&new_user).await.map_err(|e| {
        tracing::warn!("Failed to register user '{}': {}", new_user.username, e);
        AppError::from(e)
    })?;

    tracing::info!("Registered user #{} '{}'", user.id, user.username);
    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
pub async fn login(
    State(store): State<SharedStore>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = authenticate(store.as_ref(), &payload.username, &payload.password).await?;

    let token = sign_jwt(user.id, &user.role, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user_id": user.id,
        "role": user.role,
    })))
}
