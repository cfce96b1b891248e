//! 领域模型错误定义
//!
//! 定义了系统中所有可能的错误类型，提供清晰的错误上下文。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 验证错误
    #[error("validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    /// 资源不存在错误
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// 资源已存在错误
    #[error("{resource} already exists: {identifier}")]
    AlreadyExists {
        resource: String,
        identifier: String,
    },

    /// 权限错误
    #[error("permission denied: {action}")]
    PermissionDenied { action: String },

    /// 存储层错误
    #[error("database error: {message}")]
    Database { message: String },
}

impl DomainError {
    /// 创建验证错误
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 创建资源不存在错误
    pub fn not_found(resource: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    /// 创建资源已存在错误
    pub fn already_exists(resource: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::AlreadyExists {
            resource: resource.into(),
            identifier: identifier.into(),
        }
    }

    /// 创建权限错误
    pub fn permission_denied(action: impl Into<String>) -> Self {
        Self::PermissionDenied {
            action: action.into(),
        }
    }

    /// 创建存储层错误
    pub fn database_error(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;
