//! 认证相关路由：注册、登录、登出、令牌校验、资料、修改密码

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use application::{
    AuthenticateUserRequest, ChangePasswordRequest as ChangePasswordServiceRequest,
    RegisterUserRequest, UserDto,
};
use domain::User;

use crate::{auth::AuthUser, error::ApiError, response::ApiResponse, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/verify", get(verify_token))
        .route("/profile", get(get_profile))
        .route("/change-password", put(change_password))
}

#[derive(Debug, Deserialize)]
struct RegisterPayload {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordPayload {
    current_password: Option<String>,
    new_password: Option<String>,
}

/// 缺失的必填字段按参考接口约定报400，而不是交给反序列化层报422
pub(crate) fn require<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::bad_request(format!("{field} is required")))
}

/// 注册/登录成功的数据载荷
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthData {
    user: UserDto,
    token: String,
    expires_in: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenIdentity {
    user_id: Uuid,
    username: String,
    email: String,
}

fn auth_data(state: &AppState, user: &User) -> Result<AuthData, ApiError> {
    let token = state.jwt_service.generate_token(
        Uuid::from(user.id),
        user.username.as_str(),
        user.email.as_str(),
    )?;
    Ok(AuthData {
        user: UserDto::from(user),
        token,
        expires_in: state.jwt_service.expires_in(),
    })
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<ApiResponse<AuthData>>), ApiError> {
    let user = state
        .user_service
        .register(RegisterUserRequest {
            username: require(payload.username, "username")?,
            email: require(payload.email, "email")?,
            password: require(payload.password, "password")?,
            avatar: payload.avatar,
        })
        .await?;

    let data = auth_data(&state, &user)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("User registered successfully", data)),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<ApiResponse<AuthData>>, ApiError> {
    let user = state
        .user_service
        .authenticate(AuthenticateUserRequest {
            email: require(payload.email, "email")?,
            password: require(payload.password, "password")?,
        })
        .await?;

    let data = auth_data(&state, &user)?;
    Ok(Json(ApiResponse::with_message("Login successful", data)))
}

async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.user_service.logout(auth.user_id).await?;
    Ok(Json(ApiResponse::message_only("Logout successful")))
}

async fn verify_token(auth: AuthUser) -> Json<ApiResponse<TokenIdentity>> {
    // AuthUser 提取器已经完成了令牌与用户的全部校验
    Json(ApiResponse::with_message(
        "Token is valid",
        TokenIdentity {
            user_id: auth.user_id,
            username: auth.username,
            email: auth.email,
        },
    ))
}

async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.user_service.get_user(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(UserDto::from(&user))))
}

async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    // 敏感接口：按用户限流
    state.password_rate_limiter.check(auth.user_id)?;

    state
        .user_service
        .change_password(
            auth.user_id,
            ChangePasswordServiceRequest {
                current_password: require(payload.current_password, "currentPassword")?,
                new_password: require(payload.new_password, "newPassword")?,
            },
        )
        .await?;

    Ok(Json(ApiResponse::message_only(
        "Password changed successfully",
    )))
}
