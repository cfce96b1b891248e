//! 主应用程序入口
//!
//! 启动顺序：日志 → 配置 → 数据库连接池 → 迁移 → 服务装配 → 监听。
//! 迁移失败直接退出，不提供降级运行模式。

use std::sync::Arc;
use std::time::Duration;

use application::{
    MessageService, MessageServiceDependencies, SystemClock, UserService, UserServiceDependencies,
};
use config::AppConfig;
use infrastructure::{
    create_pg_pool, BcryptPasswordHasher, PgMessageRepository, PgUserRepository, MIGRATOR,
};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, JwtService, RateLimiter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 关键配置缺失时这里直接panic，拒绝带着不安全默认值启动
    let config = AppConfig::from_env();
    config.validate()?;

    tracing::info!(
        database = config.database.url.split('@').next_back().unwrap_or("unknown"),
        "连接数据库"
    );
    let pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;

    // 迁移在接收流量之前执行，按文件名升序，每个脚本只执行一次
    MIGRATOR.run(&pool).await?;

    // 仓储和服务只构造一次，按句柄注入
    let user_repository = Arc::new(PgUserRepository::new(pool.clone()));
    let message_repository = Arc::new(PgMessageRepository::new(pool));
    let password_hasher = Arc::new(BcryptPasswordHasher::new(config.server.bcrypt_cost));
    let clock = Arc::new(SystemClock);

    let user_service = Arc::new(UserService::new(UserServiceDependencies {
        user_repository,
        password_hasher,
        clock: clock.clone(),
    }));
    let message_service = Arc::new(MessageService::new(MessageServiceDependencies {
        message_repository,
        clock,
    }));

    let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
    let password_rate_limiter = Arc::new(RateLimiter::new(
        Duration::from_secs(config.rate_limit.window_secs),
        config.rate_limit.max_requests,
    ));

    let state = AppState::new(
        user_service,
        message_service,
        jwt_service,
        password_rate_limiter,
    );

    let app = router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("消息服务启动在 http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
