//! 消息Repository实现

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    errors::{DomainError, DomainResult},
    Message, MessageContent, MessageId, MessageRepository, MessageScope, MessageStats,
    MessageType, PaginatedResult, Pagination, RoomId, UserId,
};
use sqlx::{query, query_as, query_scalar, FromRow, Row};
use uuid::Uuid;

use crate::db::repositories::{corrupt_row, map_sqlx_err};
use crate::db::DbPool;

/// 数据库消息模型
#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    from_user: Uuid,
    to_user: Option<Uuid>,
    room: Option<String>,
    message: String,
    message_date: DateTime<Utc>,
    message_type: String,
    is_edited: bool,
    edited_at: Option<DateTime<Utc>>,
    reply_to: Option<Uuid>,
}

impl TryFrom<MessageRecord> for Message {
    type Error = DomainError;

    fn try_from(record: MessageRecord) -> Result<Self, Self::Error> {
        let room = record.room.map(RoomId::parse).transpose().map_err(corrupt_row)?;
        // 表上的CHECK约束保证 to_user/room 不会同时出现
        let scope = MessageScope::resolve(record.to_user.map(UserId::from), room)
            .map_err(corrupt_row)?;
        let content = MessageContent::parse(record.message).map_err(corrupt_row)?;
        let message_type = MessageType::from_str(&record.message_type).map_err(corrupt_row)?;

        Ok(Message::from_storage(
            MessageId::from(record.id),
            UserId::from(record.from_user),
            scope,
            content,
            message_type,
            record.message_date,
            record.is_edited,
            record.edited_at,
            record.reply_to.map(MessageId::from),
        ))
    }
}

/// 转义 LIKE 模式里的元字符，搜索词只做字面子串匹配
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// 消息Repository的PostgreSQL实现
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: DbPool,
}

impl PgMessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn collect(records: Vec<MessageRecord>) -> DomainResult<Vec<Message>> {
        records.into_iter().map(Message::try_from).collect()
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: &Message) -> DomainResult<Message> {
        let record = query_as::<_, MessageRecord>(
            r#"
            INSERT INTO messages (id, from_user, to_user, room, message, message_date, message_type, is_edited, edited_at, reply_to)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, from_user, to_user, room, message, message_date, message_type, is_edited, edited_at, reply_to
            "#,
        )
        .bind(Uuid::from(message.id))
        .bind(Uuid::from(message.from_user))
        .bind(message.scope.to_user().map(Uuid::from))
        .bind(message.scope.room().map(|room| room.as_str()))
        .bind(message.content.as_str())
        .bind(message.message_date)
        .bind(message.message_type.as_str())
        .bind(message.is_edited)
        .bind(message.edited_at)
        .bind(message.reply_to.map(Uuid::from))
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Message::try_from(record)
    }

    async fn find_by_id(&self, id: MessageId) -> DomainResult<Option<Message>> {
        let record = query_as::<_, MessageRecord>(
            r#"
            SELECT id, from_user, to_user, room, message, message_date, message_type, is_edited, edited_at, reply_to
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Message::try_from).transpose()
    }

    async fn conversation(
        &self,
        user_a: UserId,
        user_b: UserId,
        pagination: Pagination,
    ) -> DomainResult<PaginatedResult<Message>> {
        let total = self.count_conversation(user_a, user_b).await?;

        let records = query_as::<_, MessageRecord>(
            r#"
            SELECT id, from_user, to_user, room, message, message_date, message_type, is_edited, edited_at, reply_to
            FROM messages
            WHERE (from_user = $1 AND to_user = $2) OR (from_user = $2 AND to_user = $1)
            ORDER BY message_date ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(Uuid::from(user_a))
        .bind(Uuid::from(user_b))
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(PaginatedResult::new(
            Self::collect(records)?,
            total,
            pagination,
        ))
    }

    async fn room_messages(
        &self,
        room: &RoomId,
        pagination: Pagination,
    ) -> DomainResult<PaginatedResult<Message>> {
        let total = self.count_room(room).await?;

        let records = query_as::<_, MessageRecord>(
            r#"
            SELECT id, from_user, to_user, room, message, message_date, message_type, is_edited, edited_at, reply_to
            FROM messages
            WHERE room = $1
            ORDER BY message_date DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(room.as_str())
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(PaginatedResult::new(
            Self::collect(records)?,
            total,
            pagination,
        ))
    }

    async fn user_messages(
        &self,
        user: UserId,
        pagination: Pagination,
    ) -> DomainResult<PaginatedResult<Message>> {
        let total: i64 =
            query_scalar("SELECT COUNT(*) FROM messages WHERE from_user = $1 OR to_user = $1")
                .bind(Uuid::from(user))
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_err)?;

        let records = query_as::<_, MessageRecord>(
            r#"
            SELECT id, from_user, to_user, room, message, message_date, message_type, is_edited, edited_at, reply_to
            FROM messages
            WHERE from_user = $1 OR to_user = $1
            ORDER BY message_date DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(Uuid::from(user))
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(PaginatedResult::new(
            Self::collect(records)?,
            total as u64,
            pagination,
        ))
    }

    async fn update(&self, message: &Message) -> DomainResult<Message> {
        let record = query_as::<_, MessageRecord>(
            r#"
            UPDATE messages
            SET message = $2, is_edited = $3, edited_at = $4
            WHERE id = $1
            RETURNING id, from_user, to_user, room, message, message_date, message_type, is_edited, edited_at, reply_to
            "#,
        )
        .bind(Uuid::from(message.id))
        .bind(message.content.as_str())
        .bind(message.is_edited)
        .bind(message.edited_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .ok_or_else(|| DomainError::not_found("message", message.id))?;

        Message::try_from(record)
    }

    async fn delete(&self, id: MessageId, sender: UserId) -> DomainResult<bool> {
        let result = query("DELETE FROM messages WHERE id = $1 AND from_user = $2")
            .bind(Uuid::from(id))
            .bind(Uuid::from(sender))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn recent_conversations(
        &self,
        user: UserId,
        limit: i64,
    ) -> DomainResult<Vec<Message>> {
        // 每个私聊对端取最新一条消息；时间戳完全相同时不保证顺序
        let records = query_as::<_, MessageRecord>(
            r#"
            SELECT m.id, m.from_user, m.to_user, m.room, m.message, m.message_date, m.message_type, m.is_edited, m.edited_at, m.reply_to
            FROM messages m
            INNER JOIN (
                SELECT
                    CASE WHEN from_user = $1 THEN to_user ELSE from_user END AS counterpart,
                    MAX(message_date) AS last_message_date
                FROM messages
                WHERE (from_user = $1 OR to_user = $1) AND to_user IS NOT NULL
                GROUP BY counterpart
            ) latest ON (
                (m.from_user = $1 AND m.to_user = latest.counterpart) OR
                (m.from_user = latest.counterpart AND m.to_user = $1)
            ) AND m.message_date = latest.last_message_date
            ORDER BY m.message_date DESC
            LIMIT $2
            "#,
        )
        .bind(Uuid::from(user))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Self::collect(records)
    }

    async fn search(
        &self,
        term: &str,
        scope_user: Option<UserId>,
        limit: i64,
    ) -> DomainResult<Vec<Message>> {
        let pattern = like_pattern(term);

        let records = match scope_user {
            Some(user) => {
                query_as::<_, MessageRecord>(
                    r#"
                    SELECT id, from_user, to_user, room, message, message_date, message_type, is_edited, edited_at, reply_to
                    FROM messages
                    WHERE message ILIKE $1 AND (from_user = $2 OR to_user = $2)
                    ORDER BY message_date DESC
                    LIMIT $3
                    "#,
                )
                .bind(&pattern)
                .bind(Uuid::from(user))
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                query_as::<_, MessageRecord>(
                    r#"
                    SELECT id, from_user, to_user, room, message, message_date, message_type, is_edited, edited_at, reply_to
                    FROM messages
                    WHERE message ILIKE $1
                    ORDER BY message_date DESC
                    LIMIT $2
                    "#,
                )
                .bind(&pattern)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_sqlx_err)?;

        Self::collect(records)
    }

    async fn replies(&self, message_id: MessageId) -> DomainResult<Vec<Message>> {
        let records = query_as::<_, MessageRecord>(
            r#"
            SELECT id, from_user, to_user, room, message, message_date, message_type, is_edited, edited_at, reply_to
            FROM messages
            WHERE reply_to = $1
            ORDER BY message_date ASC
            "#,
        )
        .bind(Uuid::from(message_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Self::collect(records)
    }

    async fn count_conversation(&self, user_a: UserId, user_b: UserId) -> DomainResult<u64> {
        let count: i64 = query_scalar(
            r#"
            SELECT COUNT(*) FROM messages
            WHERE (from_user = $1 AND to_user = $2) OR (from_user = $2 AND to_user = $1)
            "#,
        )
        .bind(Uuid::from(user_a))
        .bind(Uuid::from(user_b))
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(count as u64)
    }

    async fn count_room(&self, room: &RoomId) -> DomainResult<u64> {
        let count: i64 = query_scalar("SELECT COUNT(*) FROM messages WHERE room = $1")
            .bind(room.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(count as u64)
    }

    async fn user_stats(&self, user: UserId) -> DomainResult<MessageStats> {
        let row = query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE from_user = $1) AS total_sent,
                COUNT(*) FILTER (WHERE to_user = $1) AS total_received,
                COUNT(*) FILTER (WHERE from_user = $1 AND is_edited) AS total_edited
            FROM messages
            "#,
        )
        .bind(Uuid::from(user))
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(MessageStats {
            total_sent: row.get::<i64, _>("total_sent") as u64,
            total_received: row.get::<i64, _>("total_received") as u64,
            total_edited: row.get::<i64, _>("total_edited") as u64,
        })
    }
}
