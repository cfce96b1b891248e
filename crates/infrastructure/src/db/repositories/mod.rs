//! Repository实现模块
//!
//! 包含所有数据访问层的具体实现

mod message_repository_impl;
mod user_repository_impl;

pub use message_repository_impl::PgMessageRepository;
pub use user_repository_impl::PgUserRepository;

use domain::DomainError;

pub(crate) fn map_sqlx_err(err: sqlx::Error) -> DomainError {
    DomainError::database_error(err.to_string())
}

/// 数据库里的行不满足领域约束时的错误（正常情况下不应发生）
pub(crate) fn corrupt_row(err: DomainError) -> DomainError {
    DomainError::database_error(format!("corrupt row: {err}"))
}
