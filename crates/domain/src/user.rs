use chrono::{DateTime, Duration, Utc};

use crate::value_objects::{PasswordHash, UserEmail, UserId, Username};

/// 用户实体
///
/// `password` 永远不会被序列化到对外的响应中。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: UserEmail,
    #[serde(skip_serializing)]
    pub password: PasswordHash,
    pub avatar: Option<String>,
    pub is_online: bool,
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// 注册新用户：初始为离线状态，时间戳统一取注册时刻。
    pub fn register(
        id: UserId,
        username: Username,
        email: UserEmail,
        password: PasswordHash,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            email,
            password,
            avatar: None,
            is_online: false,
            last_seen: now,
            created_at: now,
        }
    }

    pub fn set_online(&mut self, now: DateTime<Utc>) {
        self.is_online = true;
        self.last_seen = now;
    }

    pub fn set_offline(&mut self, now: DateTime<Utc>) {
        self.is_online = false;
        self.last_seen = now;
    }

    /// 合并更新资料，只有传入的字段才会被修改。
    pub fn update_profile(
        &mut self,
        username: Option<Username>,
        email: Option<UserEmail>,
        avatar: Option<String>,
    ) {
        if let Some(new_username) = username {
            self.username = new_username;
        }
        if let Some(new_email) = email {
            self.email = new_email;
        }
        if let Some(new_avatar) = avatar {
            self.avatar = Some(new_avatar);
        }
    }

    pub fn set_password(&mut self, password: PasswordHash) {
        self.password = password;
    }

    pub fn display_name(&self) -> &str {
        self.username.as_str()
    }

    /// 最近 `minutes` 分钟内是否有活动
    pub fn is_recently_active(&self, now: DateTime<Utc>, minutes: i64) -> bool {
        self.last_seen > now - Duration::minutes(minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_user(now: DateTime<Utc>) -> User {
        User::register(
            UserId::from(Uuid::new_v4()),
            Username::parse("tester").unwrap(),
            UserEmail::parse("tester@example.com").unwrap(),
            PasswordHash::new("$2b$12$abcdefghijklmnopqrstuv").unwrap(),
            now,
        )
    }

    #[test]
    fn register_starts_offline() {
        let now = Utc::now();
        let user = test_user(now);

        assert!(!user.is_online);
        assert_eq!(user.last_seen, now);
        assert_eq!(user.created_at, now);
        assert!(user.avatar.is_none());
    }

    #[test]
    fn online_status_refreshes_last_seen() {
        let now = Utc::now();
        let mut user = test_user(now);

        let later = now + Duration::minutes(5);
        user.set_online(later);
        assert!(user.is_online);
        assert_eq!(user.last_seen, later);

        let even_later = later + Duration::minutes(5);
        user.set_offline(even_later);
        assert!(!user.is_online);
        assert_eq!(user.last_seen, even_later);
    }

    #[test]
    fn update_profile_merges_only_given_fields() {
        let now = Utc::now();
        let mut user = test_user(now);

        user.update_profile(None, None, Some("avatar.png".to_string()));
        assert_eq!(user.username.as_str(), "tester");
        assert_eq!(user.avatar.as_deref(), Some("avatar.png"));

        user.update_profile(Some(Username::parse("renamed").unwrap()), None, None);
        assert_eq!(user.username.as_str(), "renamed");
        assert_eq!(user.avatar.as_deref(), Some("avatar.png"));
    }

    #[test]
    fn recently_active_window() {
        let now = Utc::now();
        let mut user = test_user(now);

        user.set_offline(now - Duration::minutes(10));
        assert!(!user.is_recently_active(now, 5));
        assert!(user.is_recently_active(now, 15));
        assert_eq!(user.display_name(), "tester");
    }

    #[test]
    fn password_hash_never_serialized() {
        let user = test_user(Utc::now());
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("username").is_some());
    }
}
