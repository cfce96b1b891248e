//! JWT 认证模块
//!
//! 提供令牌签发/验证服务和两种身份提取器：
//! `AuthUser` 是必选认证（缺失/无效直接401），
//! `OptionalAuthUser` 在认证失败时静默放行。

use std::convert::Infallible;

use application::ApplicationError;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use config::JwtConfig;
use domain::DomainError;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

pub const TOKEN_ISSUER: &str = "chat-backend";
pub const TOKEN_AUDIENCE: &str = "chat-users";

/// JWT Claims 结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// JWT Token 服务
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
        let decoding_key = DecodingKey::from_secret(config.secret.as_ref());
        let mut validation = Validation::default();
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_audience(&[TOKEN_AUDIENCE]);

        Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        }
    }

    /// 签发带身份声明和过期时间的令牌
    pub fn generate_token(
        &self,
        user_id: Uuid,
        username: &str,
        email: &str,
    ) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::days(self.config.expires_days);

        let claims = Claims {
            user_id,
            username: username.to_owned(),
            email: email.to_owned(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: TOKEN_ISSUER.to_owned(),
            aud: TOKEN_AUDIENCE.to_owned(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| ApiError::internal(format!("token generation failed: {err}")))
    }

    /// 验证并解析令牌。签名、过期、签发方和受众任意一项不通过
    /// 都返回 `None`，永远不会抛错。
    pub fn verify_token(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .ok()
    }

    /// 解析 `Authorization: Bearer <token>`。
    /// 格式不对（部分数不是2、scheme不是Bearer）返回 `None`。
    pub fn extract_bearer(header: &str) -> Option<&str> {
        let parts: Vec<&str> = header.split(' ').collect();
        if parts.len() != 2 || parts[0] != "Bearer" {
            return None;
        }
        Some(parts[1])
    }

    /// 展示给客户端的有效期描述
    pub fn expires_in(&self) -> String {
        format!("{}d", self.config.expires_days)
    }
}

/// 已认证的调用者身份
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

impl AuthUser {
    /// 资源归属检查：路径里的用户ID必须是调用者本人
    pub fn ensure_owns(&self, resource_user_id: Uuid) -> Result<(), ApiError> {
        if self.user_id != resource_user_id {
            return Err(ApiError::forbidden(
                "ACCESS_DENIED",
                "You can only access your own resources",
            ));
        }
        Ok(())
    }
}

async fn resolve_auth_user(parts: &Parts, state: &AppState) -> Result<AuthUser, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("MISSING_TOKEN", "Access token is required"))?;

    let token = JwtService::extract_bearer(header)
        .ok_or_else(|| ApiError::unauthorized("MISSING_TOKEN", "Access token is required"))?;

    let claims = state
        .jwt_service
        .verify_token(token)
        .ok_or_else(|| ApiError::unauthorized("INVALID_TOKEN", "Invalid or expired token"))?;

    // 令牌有效但用户已不存在时同样视为未认证
    match state.user_service.get_user(claims.user_id).await {
        Ok(user) => Ok(AuthUser {
            user_id: Uuid::from(user.id),
            username: user.username.as_str().to_owned(),
            email: user.email.as_str().to_owned(),
        }),
        Err(ApplicationError::Domain(DomainError::NotFound { .. })) => {
            Err(ApiError::unauthorized("USER_NOT_FOUND", "User not found"))
        }
        Err(err) => Err(err.into()),
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_auth_user(parts, state).await
    }
}

/// 可选认证：解析流程与 `AuthUser` 相同，但失败时静默继续
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuthUser(
            resolve_auth_user(parts, state).await.ok(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::new(JwtConfig {
            secret: "unit-test-secret-key-with-32-chars!!".to_string(),
            expires_days: 7,
        })
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let token = service
            .generate_token(user_id, "alice", "alice@example.com")
            .unwrap();
        let claims = service.verify_token(&token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert_eq!(claims.aud, TOKEN_AUDIENCE);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_token_is_invalid() {
        let service = test_service();
        let token = service
            .generate_token(Uuid::new_v4(), "alice", "alice@example.com")
            .unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(service.verify_token(&tampered).is_none());
        assert!(service.verify_token("not-a-token").is_none());
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let service = test_service();
        let other = JwtService::new(JwtConfig {
            secret: "another-secret-key-with-32-chars!!!!".to_string(),
            expires_days: 7,
        });

        let token = other
            .generate_token(Uuid::new_v4(), "alice", "alice@example.com")
            .unwrap();
        assert!(service.verify_token(&token).is_none());
    }

    #[test]
    fn expired_token_is_invalid() {
        let service = test_service();
        let now = Utc::now();
        let claims = Claims {
            user_id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            iat: (now - Duration::days(8)).timestamp(),
            exp: (now - Duration::days(1)).timestamp(),
            iss: TOKEN_ISSUER.to_owned(),
            aud: TOKEN_AUDIENCE.to_owned(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("unit-test-secret-key-with-32-chars!!".as_ref()),
        )
        .unwrap();

        assert!(service.verify_token(&token).is_none());
    }

    #[test]
    fn bearer_extraction_rules() {
        assert_eq!(JwtService::extract_bearer("Bearer abc.def"), Some("abc.def"));
        assert!(JwtService::extract_bearer("abc.def").is_none());
        assert!(JwtService::extract_bearer("Basic abc.def").is_none());
        assert!(JwtService::extract_bearer("Bearer a b").is_none());
        assert!(JwtService::extract_bearer("").is_none());
    }
}
