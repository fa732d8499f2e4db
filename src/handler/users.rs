// src/handler/users.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    db::userdb::UserExt,
    dtos::userdtos::{FilterUserDto, RegisterUserDto, UpdateUserDto, UserListQueryDto},
    error::{ErrorMessage, HttpError},
    AppState,
};

pub fn users_handler() -> Router {
    Router::new()
        .route("/", get(get_users).post(create_user))
        .route("/:user_id", get(get_user).put(update_user))
}

pub async fn create_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .db_client
        .save_user(
            body.username,
            body.email,
            body.full_name,
            body.role,
            body.is_active.unwrap_or(true),
        )
        .await
        .map_err(map_user_db_error)?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": FilterUserDto::filter_user(&user)
    })))
}

pub async fn get_users(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<UserListQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let users = app_state
        .db_client
        .get_users(params.role)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": FilterUserDto::filter_users(&users)
    })))
}

pub async fn get_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .db_client
        .get_user_by_id(user_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::UserNotFound.to_str()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": FilterUserDto::filter_user(&user)
    })))
}

pub async fn update_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<i32>,
    Json(body): Json<UpdateUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .db_client
        .update_user(user_id, &body)
        .await
        .map_err(map_user_db_error)?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::UserNotFound.to_str()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": FilterUserDto::filter_user(&user)
    })))
}

/// Unique violations carry the offending constraint name from Postgres;
/// everything else is a plain server error.
fn map_user_db_error(err: sqlx::Error) -> HttpError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            let message = match db_err.constraint() {
                Some("users_username_key") => ErrorMessage::UsernameExist.to_str(),
                Some("users_email_key") => ErrorMessage::EmailExist.to_str(),
                _ => "A user with this username or email already exists".to_string(),
            };
            HttpError::unique_constraint_violation(message)
        }
        other => HttpError::server_error(other.to_string()),
    }
}
