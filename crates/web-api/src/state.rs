use std::sync::Arc;

use application::{MessageService, UserService};

use crate::{rate_limit::RateLimiter, JwtService};

/// 应用状态：启动时构造一次的服务句柄，按引用注入各个handler
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub message_service: Arc<MessageService>,
    pub jwt_service: Arc<JwtService>,
    /// 修改密码接口的按用户限流
    pub password_rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(
        user_service: Arc<UserService>,
        message_service: Arc<MessageService>,
        jwt_service: Arc<JwtService>,
        password_rate_limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            user_service,
            message_service,
            jwt_service,
            password_rate_limiter,
        }
    }
}
