//! 对外数据传输对象
//!
//! 字段名序列化为 camelCase，与HTTP接口的字段约定保持一致。
//! `UserDto` 是用户的公开投影，永远不包含密码哈希。

use chrono::{DateTime, Utc};
use domain::{Message, MessageStats, MessageType, PaginatedResult, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub is_online: bool,
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: Uuid::from(user.id),
            username: user.username.as_str().to_owned(),
            email: user.email.as_str().to_owned(),
            avatar: user.avatar.clone(),
            is_online: user.is_online,
            last_seen: user.last_seen,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: Uuid,
    pub from_user: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_user: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_from_message: Option<String>,
    pub message: String,
    pub message_date: DateTime<Utc>,
    pub message_type: MessageType,
    pub is_edited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Uuid>,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: Uuid::from(message.id),
            from_user: Uuid::from(message.from_user),
            to_user: message.scope.to_user().map(Uuid::from),
            room_from_message: message.scope.room().map(|room| room.as_str().to_owned()),
            message: message.content.as_str().to_owned(),
            message_date: message.message_date,
            message_type: message.message_type,
            is_edited: message.is_edited,
            edited_at: message.edited_at,
            reply_to: message.reply_to.map(Uuid::from),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDto {
    pub limit: i64,
    pub offset: i64,
    pub total: u64,
    pub has_more: bool,
}

/// 分页消息列表（列表 + 分页元数据）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePageDto {
    pub messages: Vec<MessageDto>,
    pub pagination: PaginationDto,
}

impl From<&PaginatedResult<Message>> for MessagePageDto {
    fn from(page: &PaginatedResult<Message>) -> Self {
        Self {
            messages: page.items.iter().map(MessageDto::from).collect(),
            pagination: PaginationDto {
                limit: page.limit,
                offset: page.offset,
                total: page.total,
                has_more: page.has_more,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStatsDto {
    pub total_sent: u64,
    pub total_received: u64,
    pub total_edited: u64,
}

impl From<MessageStats> for MessageStatsDto {
    fn from(stats: MessageStats) -> Self {
        Self {
            total_sent: stats.total_sent,
            total_received: stats.total_received,
            total_edited: stats.total_edited,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{MessageContent, RoomId, UserId};

    #[test]
    fn message_dto_flattens_scope() {
        let now = Utc::now();
        let from = UserId::generate();
        let room = Message::room(
            from,
            RoomId::parse("general").unwrap(),
            MessageContent::parse("hi").unwrap(),
            MessageType::Text,
            now,
        );
        let dto = MessageDto::from(&room);
        assert_eq!(dto.room_from_message.as_deref(), Some("general"));
        assert!(dto.to_user.is_none());

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["roomFromMessage"], "general");
        assert_eq!(json["messageType"], "text");
        assert!(json.get("toUser").is_none());
    }
}
