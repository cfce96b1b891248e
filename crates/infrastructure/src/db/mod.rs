//! 数据库连接与迁移

use sqlx::{postgres::PgPoolOptions, PgPool};

pub mod repositories;

pub type DbPool = PgPool;

/// 内嵌的迁移器：按文件名升序执行 `migrations/` 下的SQL脚本，
/// 每个脚本只记录执行一次。
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
