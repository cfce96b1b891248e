//! 消息Repository接口定义

use async_trait::async_trait;

use crate::errors::DomainResult;
use crate::message::Message;
use crate::repositories::{PaginatedResult, Pagination};
use crate::value_objects::{MessageId, RoomId, UserId};

/// 单个用户的消息统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageStats {
    pub total_sent: u64,
    pub total_received: u64,
    pub total_edited: u64,
}

/// 消息Repository接口
///
/// 排序约定：会话和回复按时间升序（阅读顺序），
/// 房间、个人信箱和搜索按时间倒序（最新优先）。
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: &Message) -> DomainResult<Message>;

    async fn find_by_id(&self, id: MessageId) -> DomainResult<Option<Message>>;

    /// 两个用户之间的私聊历史，升序，带精确总数
    async fn conversation(
        &self,
        user_a: UserId,
        user_b: UserId,
        pagination: Pagination,
    ) -> DomainResult<PaginatedResult<Message>>;

    /// 房间历史，倒序，带精确总数
    async fn room_messages(
        &self,
        room: &RoomId,
        pagination: Pagination,
    ) -> DomainResult<PaginatedResult<Message>>;

    /// 用户收发的全部消息（信箱），倒序，带精确总数
    async fn user_messages(
        &self,
        user: UserId,
        pagination: Pagination,
    ) -> DomainResult<PaginatedResult<Message>>;

    /// 持久化编辑结果（正文、编辑标记和时间戳）
    async fn update(&self, message: &Message) -> DomainResult<Message>;

    /// 仅当 id 与发送者同时匹配才删除；返回是否有行被删除。
    /// 行不存在与发送者不匹配不做区分。
    async fn delete(&self, id: MessageId, sender: UserId) -> DomainResult<bool>;

    /// 每个私聊对端的最新一条消息，按时间倒序，最多 `limit` 个会话。
    /// 时间戳完全相同时的先后顺序不作保证。
    async fn recent_conversations(&self, user: UserId, limit: i64)
        -> DomainResult<Vec<Message>>;

    /// 子串搜索（不区分大小写，不做分词）。
    /// 给定 `scope_user` 时限定在该用户收发的消息内。倒序。
    async fn search(
        &self,
        term: &str,
        scope_user: Option<UserId>,
        limit: i64,
    ) -> DomainResult<Vec<Message>>;

    /// 回复给定消息的所有消息，升序
    async fn replies(&self, message_id: MessageId) -> DomainResult<Vec<Message>>;

    /// 私聊消息总数（分页用）
    async fn count_conversation(&self, user_a: UserId, user_b: UserId) -> DomainResult<u64>;

    /// 房间消息总数（分页用）
    async fn count_room(&self, room: &RoomId) -> DomainResult<u64>;

    /// 发送/接收/已编辑三项独立计数
    async fn user_stats(&self, user: UserId) -> DomainResult<MessageStats>;
}
