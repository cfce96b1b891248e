//! 基础设施层实现。
//!
//! 提供PostgreSQL仓储和bcrypt密码哈希适配器，实现应用/领域层定义的接口。

pub mod db;
pub mod password;

pub use db::repositories::{PgMessageRepository, PgUserRepository};
pub use db::{create_pg_pool, DbPool, MIGRATOR};
pub use password::BcryptPasswordHasher;
