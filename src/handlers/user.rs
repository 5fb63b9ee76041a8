// src/handlers/user.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{
        AuthorInfo, SearchUsersQuery, UpdateProfileRequest, UserProfileResponse,
    },
    store::DynStore,
    utils::{
        jwt::Claims,
        validation::{check_social_links, first_message},
    },
};

const MAX_SEARCH_RESULTS: i64 = 50;

/// Public profile lookup by user id. Social links stay private.
pub async fn get_user_profile(
    State(store): State<DynStore>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = store
        .find_user_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({ "user": UserProfileResponse::public(&user) })))
}

/// The caller's own profile, social links included.
pub async fn get_own_profile(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = store
        .find_user_by_id(claims.user_id())
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({ "user": UserProfileResponse::private(&user) })))
}

/// Username substring search, capped at 50 cards.
pub async fn search_users(
    State(store): State<DynStore>,
    Query(params): Query<SearchUsersQuery>,
) -> Result<impl IntoResponse, AppError> {
    let users = store.search_users(&params.query, MAX_SEARCH_RESULTS).await?;

    let cards: Vec<_> = users
        .iter()
        .map(|user| AuthorInfo::from(user).card())
        .collect();

    Ok(Json(json!({ "users": cards })))
}

/// Updates the caller's username, bio and social links.
pub async fn update_profile(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(first_message(&validation_errors)));
    }
    check_social_links(&payload.social_links)?;

    store
        .update_profile(
            claims.user_id(),
            &payload.username,
            &payload.bio,
            &payload.social_links,
        )
        .await?;

    Ok(Json(json!({ "username": payload.username })))
}
