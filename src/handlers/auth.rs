// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{ChangePasswordRequest, SessionResponse, SigninRequest, SignupRequest},
    store::{DynStore, NewUser},
    utils::{
        hash::{hash_password, verify_password},
        ids::{default_avatar, username_suffix},
        jwt::{Claims, sign_jwt},
        validation::{first_message, is_strong_password, is_valid_email},
    },
};

/// Derives a unique username from the email's local part, appending a
/// random suffix on collision.
async fn generate_username(store: &DynStore, email: &str) -> Result<String, AppError> {
    let mut username = email.split('@').next().unwrap_or(email).to_string();

    if store.username_taken(&username).await? {
        username.push_str(&username_suffix());
    }

    Ok(username)
}

/// Registers a new account.
///
/// Hashes the password using Argon2 before storing it.
/// Returns the session payload the client keeps for later requests.
pub async fn signup(
    State(store): State<DynStore>,
    State(config): State<Config>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(first_message(&validation_errors)));
    }
    if payload.email.is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }
    if !is_valid_email(&payload.email) {
        return Err(AppError::Validation("Email is invalid".to_string()));
    }
    if !is_strong_password(&payload.password) {
        return Err(AppError::Validation(
            "Password must be between 6 to 20 characters long and contain at least one numeric digit, one uppercase and one lowercase letter".to_string(),
        ));
    }

    let hashed_password = hash_password(&payload.password)?;
    let username = generate_username(&store, &payload.email).await?;

    let user = store
        .create_user(NewUser {
            fullname: payload.fullname,
            email: payload.email,
            password_hash: hashed_password,
            username,
            profile_img: default_avatar(),
        })
        .await?;

    let token = sign_jwt(user.id, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(SessionResponse::for_user(&user, token)))
}

/// Authenticates an email/password pair and returns a session payload.
pub async fn signin(
    State(store): State<DynStore>,
    State(config): State<Config>,
    Json(payload): Json<SigninRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = store
        .find_user_by_email(&payload.email)
        .await?
        .ok_or(AppError::Forbidden("Email not found".to_string()))?;

    let is_valid = verify_password(&payload.password, &user.password)?;

    if !is_valid {
        return Err(AppError::Forbidden("Password is incorrect".to_string()));
    }

    let token = sign_jwt(user.id, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(SessionResponse::for_user(&user, token)))
}

/// Replaces the caller's password after re-checking the current one.
pub async fn change_password(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !is_strong_password(&payload.new_password) {
        return Err(AppError::Validation(
            "Password should be 6 to 20 characters long with a numeric, 1 lowercase and 1 uppercase letters".to_string(),
        ));
    }

    let user = store
        .find_user_by_id(claims.user_id())
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let is_valid = verify_password(&payload.current_password, &user.password)?;

    if !is_valid {
        return Err(AppError::Forbidden(
            "Current password is incorrect".to_string(),
        ));
    }

    let hashed_password = hash_password(&payload.new_password)?;
    store.update_password(user.id, &hashed_password).await?;

    Ok(Json(json!({ "status": "Password changed" })))
}
