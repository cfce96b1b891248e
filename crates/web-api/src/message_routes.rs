//! 消息路由：发送、查询（会话/房间/信箱/搜索/回复/统计）、编辑、删除

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use application::{MessageDto, MessagePageDto, MessageStatsDto, SendMessageRequest};
use domain::{MessageType, Pagination, DEFAULT_PAGE_LIMIT};

use crate::{
    auth::{AuthUser, OptionalAuthUser},
    auth_routes::require,
    error::ApiError,
    response::ApiResponse,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(send_message))
        .route("/search", get(search_messages))
        .route("/conversation/{user_a}/{user_b}", get(get_conversation))
        .route("/room/{room_id}", get(get_room_messages))
        .route("/user/{user_id}", get(get_user_messages))
        .route(
            "/user/{user_id}/conversations",
            get(get_recent_conversations),
        )
        .route("/user/{user_id}/stats", get(get_user_stats))
        .route("/{message_id}/replies", get(get_replies))
        .route(
            "/{id}",
            get(get_message).put(update_message).delete(delete_message),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessagePayload {
    to_user: Option<Uuid>,
    room_from_message: Option<String>,
    message: Option<String>,
    message_type: Option<MessageType>,
    reply_to: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

impl PageQuery {
    fn pagination(&self) -> Pagination {
        Pagination::new(
            self.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
            self.offset.unwrap_or(0),
        )
    }
}

#[derive(Debug, Deserialize)]
struct DigestQuery {
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuery {
    q: String,
    user_id: Option<Uuid>,
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct UpdateMessagePayload {
    message: Option<String>,
}

async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<SendMessagePayload>,
) -> Result<(StatusCode, Json<ApiResponse<MessageDto>>), ApiError> {
    let message = state
        .message_service
        .send(SendMessageRequest {
            // 发送者永远取认证身份，不信任请求体
            from_user: auth.user_id,
            to_user: payload.to_user,
            room: payload.room_from_message,
            message: require(payload.message, "message")?,
            message_type: payload.message_type,
            reply_to: payload.reply_to,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Message created successfully",
            MessageDto::from(&message),
        )),
    ))
}

async fn get_message(
    State(state): State<AppState>,
    _auth: OptionalAuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageDto>>, ApiError> {
    let message = state.message_service.get_message(id).await?;
    Ok(Json(ApiResponse::ok(MessageDto::from(&message))))
}

async fn get_conversation(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((user_a, user_b)): Path<(Uuid, Uuid)>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<MessagePageDto>>, ApiError> {
    let page = state
        .message_service
        .conversation(user_a, user_b, query.pagination())
        .await?;
    Ok(Json(ApiResponse::ok(MessagePageDto::from(&page))))
}

async fn get_room_messages(
    State(state): State<AppState>,
    _auth: OptionalAuthUser,
    Path(room_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<MessagePageDto>>, ApiError> {
    let page = state
        .message_service
        .room_messages(room_id, query.pagination())
        .await?;
    Ok(Json(ApiResponse::ok(MessagePageDto::from(&page))))
}

async fn get_user_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<MessagePageDto>>, ApiError> {
    auth.ensure_owns(user_id)?;

    let page = state
        .message_service
        .user_messages(user_id, query.pagination())
        .await?;
    Ok(Json(ApiResponse::ok(MessagePageDto::from(&page))))
}

async fn get_recent_conversations(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    Query(query): Query<DigestQuery>,
) -> Result<Json<ApiResponse<Vec<MessageDto>>>, ApiError> {
    auth.ensure_owns(user_id)?;

    let messages = state
        .message_service
        .recent_conversations(user_id, query.limit)
        .await?;
    let dtos = messages.iter().map(MessageDto::from).collect();
    Ok(Json(ApiResponse::ok(dtos)))
}

async fn get_user_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageStatsDto>>, ApiError> {
    auth.ensure_owns(user_id)?;

    let stats = state.message_service.stats(user_id).await?;
    Ok(Json(ApiResponse::ok(MessageStatsDto::from(stats))))
}

async fn search_messages(
    State(state): State<AppState>,
    _auth: OptionalAuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<MessageDto>>>, ApiError> {
    let messages = state
        .message_service
        .search(query.q, query.user_id, query.limit)
        .await?;
    let dtos = messages.iter().map(MessageDto::from).collect();
    Ok(Json(ApiResponse::ok(dtos)))
}

async fn get_replies(
    State(state): State<AppState>,
    _auth: OptionalAuthUser,
    Path(message_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<MessageDto>>>, ApiError> {
    let messages = state.message_service.replies(message_id).await?;
    let dtos = messages.iter().map(MessageDto::from).collect();
    Ok(Json(ApiResponse::ok(dtos)))
}

async fn update_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMessagePayload>,
) -> Result<Json<ApiResponse<MessageDto>>, ApiError> {
    let message = state
        .message_service
        .update_message(id, auth.user_id, require(payload.message, "message")?)
        .await?;
    Ok(Json(ApiResponse::with_message(
        "Message updated successfully",
        MessageDto::from(&message),
    )))
}

async fn delete_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .message_service
        .delete_message(id, auth.user_id)
        .await?;
    Ok(Json(ApiResponse::message_only(
        "Message deleted successfully",
    )))
}
