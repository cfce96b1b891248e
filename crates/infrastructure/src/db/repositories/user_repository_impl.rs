//! 用户Repository实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    errors::{DomainError, DomainResult},
    PasswordHash, User, UserEmail, UserId, UserRepository, Username,
};
use sqlx::{query_as, query_scalar, FromRow};
use uuid::Uuid;

use crate::db::repositories::{corrupt_row, map_sqlx_err};
use crate::db::DbPool;

/// 数据库用户模型
#[derive(Debug, FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    email: String,
    password: String,
    avatar: Option<String>,
    is_online: bool,
    last_seen: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRecord> for User {
    type Error = DomainError;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId::from(record.id),
            username: Username::parse(record.username).map_err(corrupt_row)?,
            email: UserEmail::parse(record.email).map_err(corrupt_row)?,
            password: PasswordHash::new(record.password).map_err(corrupt_row)?,
            avatar: record.avatar,
            is_online: record.is_online,
            last_seen: record.last_seen,
            created_at: record.created_at,
        })
    }
}

/// 用户Repository的PostgreSQL实现
#[derive(Clone)]
pub struct PgUserRepository {
    pool: DbPool,
}

impl PgUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &User) -> DomainResult<User> {
        let record = query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, username, email, password, avatar, is_online, last_seen, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, username, email, password, avatar, is_online, last_seen, created_at
            "#,
        )
        .bind(Uuid::from(user.id))
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(user.password.as_str())
        .bind(&user.avatar)
        .bind(user.is_online)
        .bind(user.last_seen)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match &err {
            // 唯一约束兜底：并发注册时前置检查可能漏掉
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DomainError::already_exists("user", user.email.as_str())
            }
            _ => map_sqlx_err(err),
        })?;

        User::try_from(record)
    }

    async fn find_by_id(&self, id: UserId) -> DomainResult<Option<User>> {
        let record = query_as::<_, UserRecord>(
            r#"
            SELECT id, username, email, password, avatar, is_online, last_seen, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let record = query_as::<_, UserRecord>(
            r#"
            SELECT id, username, email, password, avatar, is_online, last_seen, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let record = query_as::<_, UserRecord>(
            r#"
            SELECT id, username, email, password, avatar, is_online, last_seen, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn find_all(&self) -> DomainResult<Vec<User>> {
        let records = query_as::<_, UserRecord>(
            r#"
            SELECT id, username, email, password, avatar, is_online, last_seen, created_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(User::try_from).collect()
    }

    async fn find_online(&self) -> DomainResult<Vec<User>> {
        let records = query_as::<_, UserRecord>(
            r#"
            SELECT id, username, email, password, avatar, is_online, last_seen, created_at
            FROM users
            WHERE is_online
            ORDER BY last_seen DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(User::try_from).collect()
    }

    async fn update(&self, user: &User) -> DomainResult<User> {
        let record = query_as::<_, UserRecord>(
            r#"
            UPDATE users
            SET username = $2, email = $3, password = $4, avatar = $5
            WHERE id = $1
            RETURNING id, username, email, password, avatar, is_online, last_seen, created_at
            "#,
        )
        .bind(Uuid::from(user.id))
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(user.password.as_str())
        .bind(&user.avatar)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .ok_or_else(|| DomainError::not_found("user", user.id))?;

        User::try_from(record)
    }

    async fn update_online_status(
        &self,
        id: UserId,
        is_online: bool,
        last_seen: DateTime<Utc>,
    ) -> DomainResult<Option<User>> {
        let record = query_as::<_, UserRecord>(
            r#"
            UPDATE users
            SET is_online = $2, last_seen = $3
            WHERE id = $1
            RETURNING id, username, email, password, avatar, is_online, last_seen, created_at
            "#,
        )
        .bind(Uuid::from(id))
        .bind(is_online)
        .bind(last_seen)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn email_exists(&self, email: &str) -> DomainResult<bool> {
        let exists: bool = query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(exists)
    }

    async fn username_exists(&self, username: &str) -> DomainResult<bool> {
        let exists: bool =
            query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_err)?;
        Ok(exists)
    }

    async fn count(&self) -> DomainResult<u64> {
        let count: i64 = query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(count as u64)
    }
}
