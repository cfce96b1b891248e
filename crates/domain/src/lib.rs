//! 消息系统核心领域模型
//!
//! 包含用户、消息两个核心实体，以及相关的业务规则和Repository接口。

pub mod errors;
pub mod message;
pub mod repositories;
pub mod user;
pub mod value_objects;

// 重新导出常用类型
pub use errors::{DomainError, DomainResult};
pub use message::{Message, MessageScope, MessageType};
pub use repositories::{
    MessageRepository, MessageStats, PaginatedResult, Pagination, UserRepository,
    DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
pub use user::User;
pub use value_objects::{MessageContent, MessageId, PasswordHash, RoomId, UserEmail, UserId, Username};
