//! 用户Repository接口定义

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::DomainResult;
use crate::user::User;
use crate::value_objects::UserId;

/// 用户Repository接口
///
/// 查找类操作按精确（区分大小写）匹配，未命中返回 `Ok(None)`。
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 创建新用户。底层唯一约束冲突映射为 `AlreadyExists`。
    async fn create(&self, user: &User) -> DomainResult<User>;

    /// 根据ID查找用户
    async fn find_by_id(&self, id: UserId) -> DomainResult<Option<User>>;

    /// 根据邮箱查找用户
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>>;

    /// 根据用户名查找用户
    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>>;

    /// 全部用户，按注册时间倒序
    async fn find_all(&self) -> DomainResult<Vec<User>>;

    /// 在线用户，按最近活跃时间倒序
    async fn find_online(&self) -> DomainResult<Vec<User>>;

    /// 持久化用户名/邮箱/密码/头像的变更
    async fn update(&self, user: &User) -> DomainResult<User>;

    /// 切换在线状态并刷新 last_seen，用户不存在时返回 `None`
    async fn update_online_status(
        &self,
        id: UserId,
        is_online: bool,
        last_seen: DateTime<Utc>,
    ) -> DomainResult<Option<User>>;

    /// 检查邮箱是否已被占用
    async fn email_exists(&self, email: &str) -> DomainResult<bool>;

    /// 检查用户名是否已被占用
    async fn username_exists(&self, username: &str) -> DomainResult<bool>;

    /// 用户总数
    async fn count(&self) -> DomainResult<u64>;
}
