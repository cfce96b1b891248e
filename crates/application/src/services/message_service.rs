//! 消息处理服务
//!
//! 实现消息的核心业务逻辑：发送（私聊/房间/广播/回复）、
//! 查询（会话、房间、信箱、搜索、回复、统计）、编辑与删除。

use std::sync::Arc;

use domain::{
    DomainError, Message, MessageContent, MessageId, MessageRepository, MessageScope,
    MessageStats, MessageType, PaginatedResult, Pagination, RoomId, UserId,
};
use uuid::Uuid;

use crate::{clock::Clock, error::ApplicationError};

/// 最近会话列表的默认/最大条数
const DEFAULT_CONVERSATION_DIGEST: i64 = 10;
const MAX_CONVERSATION_DIGEST: i64 = 50;

/// 搜索结果的默认/最大条数
const DEFAULT_SEARCH_LIMIT: i64 = 20;
const MAX_SEARCH_LIMIT: i64 = 100;

#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    /// 发送者，由认证层填入，不信任请求体
    pub from_user: Uuid,
    pub to_user: Option<Uuid>,
    pub room: Option<String>,
    pub message: String,
    pub message_type: Option<MessageType>,
    pub reply_to: Option<Uuid>,
}

pub struct MessageServiceDependencies {
    pub message_repository: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct MessageService {
    deps: MessageServiceDependencies,
}

impl MessageService {
    pub fn new(deps: MessageServiceDependencies) -> Self {
        Self { deps }
    }

    /// 发送消息。收件人和房间互斥，两者都缺省则是全局广播；
    /// `system` 类型保留给服务端，客户端不可用。
    pub async fn send(&self, request: SendMessageRequest) -> Result<Message, ApplicationError> {
        let content = MessageContent::parse(request.message)?;

        let message_type = request.message_type.unwrap_or(MessageType::Text);
        if message_type == MessageType::System {
            return Err(DomainError::validation(
                "messageType",
                "system messages cannot be sent by clients",
            )
            .into());
        }

        let room = request.room.map(RoomId::parse).transpose()?;
        let scope = MessageScope::resolve(request.to_user.map(UserId::from), room)?;

        let from_user = UserId::from(request.from_user);
        let now = self.deps.clock.now();

        let message = match request.reply_to {
            Some(reply_to) => Message::reply(
                from_user,
                MessageId::from(reply_to),
                content,
                message_type,
                scope,
                now,
            ),
            None => match scope {
                MessageScope::Direct(to_user) => {
                    Message::direct(from_user, to_user, content, message_type, now)
                }
                MessageScope::Room(room) => {
                    Message::room(from_user, room, content, message_type, now)
                }
                MessageScope::Broadcast => {
                    Message::broadcast(from_user, content, message_type, now)
                }
            },
        };

        if !message.is_valid_for_sending() {
            return Err(DomainError::validation("message", "not valid for sending").into());
        }

        let stored = self.deps.message_repository.create(&message).await?;
        tracing::debug!(message_id = %stored.id, "message stored");
        Ok(stored)
    }

    pub async fn get_message(&self, message_id: Uuid) -> Result<Message, ApplicationError> {
        let message = self
            .deps
            .message_repository
            .find_by_id(MessageId::from(message_id))
            .await?
            .ok_or_else(|| DomainError::not_found("message", message_id))?;
        Ok(message)
    }

    /// 两个用户的私聊历史，升序（阅读顺序）
    pub async fn conversation(
        &self,
        user_a: Uuid,
        user_b: Uuid,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Message>, ApplicationError> {
        let page = self
            .deps
            .message_repository
            .conversation(UserId::from(user_a), UserId::from(user_b), pagination)
            .await?;
        Ok(page)
    }

    /// 房间历史，倒序（最新优先）
    pub async fn room_messages(
        &self,
        room: String,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Message>, ApplicationError> {
        let room = RoomId::parse(room)?;
        let page = self
            .deps
            .message_repository
            .room_messages(&room, pagination)
            .await?;
        Ok(page)
    }

    /// 用户信箱（收发的全部消息），倒序
    pub async fn user_messages(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Message>, ApplicationError> {
        let page = self
            .deps
            .message_repository
            .user_messages(UserId::from(user_id), pagination)
            .await?;
        Ok(page)
    }

    /// 每个私聊对端的最新一条消息
    pub async fn recent_conversations(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, ApplicationError> {
        let limit = limit
            .unwrap_or(DEFAULT_CONVERSATION_DIGEST)
            .clamp(1, MAX_CONVERSATION_DIGEST);
        let messages = self
            .deps
            .message_repository
            .recent_conversations(UserId::from(user_id), limit)
            .await?;
        Ok(messages)
    }

    /// 子串搜索，可选限定在某个用户收发的消息内
    pub async fn search(
        &self,
        term: String,
        scope_user: Option<Uuid>,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, ApplicationError> {
        let term = term.trim().to_owned();
        if term.is_empty() {
            return Err(DomainError::validation("q", "search term cannot be empty").into());
        }
        let limit = limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT);
        let messages = self
            .deps
            .message_repository
            .search(&term, scope_user.map(UserId::from), limit)
            .await?;
        Ok(messages)
    }

    /// 指定消息的回复列表，升序
    pub async fn replies(&self, message_id: Uuid) -> Result<Vec<Message>, ApplicationError> {
        let messages = self
            .deps
            .message_repository
            .replies(MessageId::from(message_id))
            .await?;
        Ok(messages)
    }

    pub async fn stats(&self, user_id: Uuid) -> Result<MessageStats, ApplicationError> {
        let stats = self
            .deps
            .message_repository
            .user_stats(UserId::from(user_id))
            .await?;
        Ok(stats)
    }

    /// 编辑消息。
    ///
    /// 消息不存在和消息属于他人统一返回"不存在"，不泄露消息归属；
    /// 发送者本人但超出24小时窗口（或系统消息）返回权限错误。
    /// 内容没有变化时直接返回原消息，不更新编辑时间戳。
    pub async fn update_message(
        &self,
        message_id: Uuid,
        requester: Uuid,
        new_content: String,
    ) -> Result<Message, ApplicationError> {
        let content = MessageContent::parse(new_content)?;
        let requester = UserId::from(requester);

        let mut message = self
            .deps
            .message_repository
            .find_by_id(MessageId::from(message_id))
            .await?
            .ok_or_else(|| DomainError::not_found("message", message_id))?;

        if message.from_user != requester {
            return Err(DomainError::not_found("message", message_id).into());
        }

        let now = self.deps.clock.now();
        if !message.can_edit(requester, now) {
            return Err(DomainError::permission_denied("edit message").into());
        }

        if !message.edit(content, now) {
            return Ok(message);
        }

        let stored = self.deps.message_repository.update(&message).await?;
        Ok(stored)
    }

    /// 删除消息，只限发送者本人。没有命中任何行时报"不存在"。
    pub async fn delete_message(
        &self,
        message_id: Uuid,
        requester: Uuid,
    ) -> Result<(), ApplicationError> {
        let deleted = self
            .deps
            .message_repository
            .delete(MessageId::from(message_id), UserId::from(requester))
            .await?;
        if !deleted {
            return Err(DomainError::not_found("message", message_id).into());
        }
        Ok(())
    }
}
