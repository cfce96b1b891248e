//! Web API 层。
//!
//! 提供 Axum 路由，将 HTTP 请求委托给应用层的用例服务；
//! 认证提取器、按用户限流和统一的响应信封都在这一层。

mod auth;
mod auth_routes;
mod error;
mod message_routes;
mod rate_limit;
mod response;
mod routes;
mod state;
mod user_routes;

pub use auth::{AuthUser, Claims, JwtService, OptionalAuthUser};
pub use config::JwtConfig;
pub use error::ApiError;
pub use rate_limit::RateLimiter;
pub use response::ApiResponse;
pub use routes::router;
pub use state::AppState;
