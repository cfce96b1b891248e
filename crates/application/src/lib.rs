//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理输入校验
//! 以及对外部适配器（密码哈希、时钟）的抽象，
//! 具体实现由 infrastructure 构造后注入。

pub mod clock;
pub mod dto;
pub mod error;
pub mod password;
pub mod services;

pub use clock::{Clock, SystemClock};
pub use dto::{MessageDto, MessagePageDto, MessageStatsDto, PaginationDto, UserDto};
pub use error::ApplicationError;
pub use password::{PasswordHasher, PasswordHasherError};
pub use services::{
    AuthenticateUserRequest, ChangePasswordRequest, MessageService, MessageServiceDependencies,
    RegisterUserRequest, SendMessageRequest, UpdateUserRequest, UserService,
    UserServiceDependencies,
};
