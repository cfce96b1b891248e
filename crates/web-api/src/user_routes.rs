//! 用户目录路由：公开资料列表/查询、备用创建入口、在线状态切换

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use application::{RegisterUserRequest, UserDto};

use crate::{auth_routes::require, error::ApiError, response::ApiResponse, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user))
        .route("/{id}/status", patch(update_status))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    /// `online=true` 时只返回在线用户
    online: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct CreateUserPayload {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusPayload {
    is_online: bool,
}

async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let users = if query.online.unwrap_or(false) {
        state.user_service.list_online_users().await?
    } else {
        state.user_service.list_users().await?
    };
    let dtos = users.iter().map(UserDto::from).collect();
    Ok(Json(ApiResponse::ok(dtos)))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.user_service.get_user(id).await?;
    Ok(Json(ApiResponse::ok(UserDto::from(&user))))
}

/// 备用创建入口，与 `/auth/register` 等价但不签发令牌
async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let user = state
        .user_service
        .register(RegisterUserRequest {
            username: require(payload.username, "username")?,
            email: require(payload.email, "email")?,
            password: require(payload.password, "password")?,
            avatar: payload.avatar,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "User created successfully",
            UserDto::from(&user),
        )),
    ))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .user_service
        .update_online_status(id, payload.is_online)
        .await?;
    Ok(Json(ApiResponse::ok(UserDto::from(&user))))
}
