use domain::DomainError;
use thiserror::Error;

use crate::password::PasswordHasherError;

/// 应用层错误
///
/// 领域错误原样向上传递，由 web 层映射为HTTP状态码。
/// `Authentication` 统一表示凭据校验失败，不区分"用户不存在"
/// 和"密码错误"，避免泄露账号是否存在。
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("password error: {0}")]
    Password(#[from] PasswordHasherError),
    #[error("authentication failed")]
    Authentication,
}

/// 应用层结果类型
pub type ApplicationResult<T> = Result<T, ApplicationError>;
