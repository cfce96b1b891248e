use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{MessageContent, MessageId, RoomId, UserId, MAX_MESSAGE_CHARS};

/// 消息发出后允许编辑的时间窗口
pub const EDIT_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    File,
    System,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::File => "file",
            MessageType::System => "system",
        }
    }
}

impl std::str::FromStr for MessageType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(MessageType::Text),
            "image" => Ok(MessageType::Image),
            "file" => Ok(MessageType::File),
            "system" => Ok(MessageType::System),
            other => Err(DomainError::validation(
                "message_type",
                format!("unknown message type: {other}"),
            )),
        }
    }
}

/// 消息的寻址方式。
///
/// 私聊、房间和广播消息互斥，由枚举在构造期保证，
/// 不存在同时带收件人和房间的消息。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageScope {
    /// 发给单个用户的私聊消息
    Direct(UserId),
    /// 发到指定房间的消息
    Room(RoomId),
    /// 不带收件人也不带房间的全局消息
    Broadcast,
}

impl MessageScope {
    /// 从可选的收件人/房间对解析寻址方式，两者同时出现视为非法请求。
    pub fn resolve(to_user: Option<UserId>, room: Option<RoomId>) -> Result<Self, DomainError> {
        match (to_user, room) {
            (Some(_), Some(_)) => Err(DomainError::validation(
                "scope",
                "toUser and roomFromMessage are mutually exclusive",
            )),
            (Some(to), None) => Ok(MessageScope::Direct(to)),
            (None, Some(room)) => Ok(MessageScope::Room(room)),
            (None, None) => Ok(MessageScope::Broadcast),
        }
    }

    pub fn to_user(&self) -> Option<UserId> {
        match self {
            MessageScope::Direct(user) => Some(*user),
            _ => None,
        }
    }

    pub fn room(&self) -> Option<&RoomId> {
        match self {
            MessageScope::Room(room) => Some(room),
            _ => None,
        }
    }
}

/// 消息实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub from_user: UserId,
    pub scope: MessageScope,
    pub content: MessageContent,
    pub message_type: MessageType,
    pub message_date: DateTime<Utc>,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub reply_to: Option<MessageId>,
}

impl Message {
    fn new(
        from_user: UserId,
        scope: MessageScope,
        content: MessageContent,
        message_type: MessageType,
        reply_to: Option<MessageId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            from_user,
            scope,
            content,
            message_type,
            message_date: now,
            is_edited: false,
            edited_at: None,
            reply_to,
        }
    }

    /// 私聊消息
    pub fn direct(
        from_user: UserId,
        to_user: UserId,
        content: MessageContent,
        message_type: MessageType,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(
            from_user,
            MessageScope::Direct(to_user),
            content,
            message_type,
            None,
            now,
        )
    }

    /// 房间消息
    pub fn room(
        from_user: UserId,
        room: RoomId,
        content: MessageContent,
        message_type: MessageType,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(
            from_user,
            MessageScope::Room(room),
            content,
            message_type,
            None,
            now,
        )
    }

    /// 全局广播消息
    pub fn broadcast(
        from_user: UserId,
        content: MessageContent,
        message_type: MessageType,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(
            from_user,
            MessageScope::Broadcast,
            content,
            message_type,
            None,
            now,
        )
    }

    /// 系统消息：发送者固定为系统标识，类型强制为 `System`。
    pub fn system(content: MessageContent, room: Option<RoomId>, now: DateTime<Utc>) -> Self {
        let scope = match room {
            Some(room) => MessageScope::Room(room),
            None => MessageScope::Broadcast,
        };
        Self::new(
            UserId::SYSTEM,
            scope,
            content,
            MessageType::System,
            None,
            now,
        )
    }

    /// 对已有消息的回复
    pub fn reply(
        from_user: UserId,
        reply_to: MessageId,
        content: MessageContent,
        message_type: MessageType,
        scope: MessageScope,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(from_user, scope, content, message_type, Some(reply_to), now)
    }

    /// 从持久化数据重建实体
    #[allow(clippy::too_many_arguments)]
    pub fn from_storage(
        id: MessageId,
        from_user: UserId,
        scope: MessageScope,
        content: MessageContent,
        message_type: MessageType,
        message_date: DateTime<Utc>,
        is_edited: bool,
        edited_at: Option<DateTime<Utc>>,
        reply_to: Option<MessageId>,
    ) -> Self {
        Self {
            id,
            from_user,
            scope,
            content,
            message_type,
            message_date,
            is_edited,
            edited_at,
            reply_to,
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self.scope, MessageScope::Direct(_))
    }

    pub fn is_room(&self) -> bool {
        matches!(self.scope, MessageScope::Room(_))
    }

    pub fn is_broadcast(&self) -> bool {
        matches!(self.scope, MessageScope::Broadcast)
    }

    pub fn is_system(&self) -> bool {
        self.message_type == MessageType::System
    }

    pub fn is_reply(&self) -> bool {
        self.reply_to.is_some()
    }

    /// 发送前的最终校验。正文和类型由构造期的值对象保证，
    /// 这里额外确认发送者：普通消息必须带真实用户。
    pub fn is_valid_for_sending(&self) -> bool {
        !self.content.as_str().is_empty()
            && self.content.char_count() <= MAX_MESSAGE_CHARS
            && (self.is_system() || !self.from_user.is_system())
    }

    /// 只有发送者本人、非系统消息、且在24小时窗口内才可编辑。
    pub fn can_edit(&self, user: UserId, now: DateTime<Utc>) -> bool {
        self.from_user == user
            && !self.is_system()
            && !self.is_older_than(now, EDIT_WINDOW_HOURS)
    }

    /// 删除只限发送者本人，没有时间限制。
    pub fn can_delete(&self, user: UserId) -> bool {
        self.from_user == user
    }

    pub fn is_older_than(&self, now: DateTime<Utc>, hours: i64) -> bool {
        self.message_date < now - Duration::hours(hours)
    }

    /// 编辑正文。内容没有变化时什么都不做，返回是否发生了修改。
    pub fn edit(&mut self, new_content: MessageContent, now: DateTime<Utc>) -> bool {
        if self.content == new_content {
            return false;
        }
        self.content = new_content;
        self.is_edited = true;
        self.edited_at = Some(now);
        true
    }

    /// 截断预览，超长时按字符边界截断并追加省略标记。
    pub fn preview(&self, max_len: usize) -> String {
        let body = self.content.as_str();
        if body.chars().count() <= max_len {
            return body.to_string();
        }
        let mut preview: String = body.chars().take(max_len).collect();
        preview.push_str("...");
        preview
    }

    /// 人类可读的消息年龄
    pub fn age_of(&self, now: DateTime<Utc>) -> String {
        let elapsed = now - self.message_date;
        let minutes = elapsed.num_minutes();
        let hours = elapsed.num_hours();
        let days = elapsed.num_days();

        if days > 0 {
            format!("{} day{} ago", days, if days > 1 { "s" } else { "" })
        } else if hours > 0 {
            format!("{} hour{} ago", hours, if hours > 1 { "s" } else { "" })
        } else if minutes > 0 {
            format!("{} minute{} ago", minutes, if minutes > 1 { "s" } else { "" })
        } else {
            "just now".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(body: &str) -> MessageContent {
        MessageContent::parse(body).unwrap()
    }

    #[test]
    fn scope_resolution_is_mutually_exclusive() {
        let to = UserId::generate();
        let room = RoomId::parse("general").unwrap();

        assert_eq!(
            MessageScope::resolve(Some(to), None).unwrap(),
            MessageScope::Direct(to)
        );
        assert_eq!(
            MessageScope::resolve(None, Some(room.clone())).unwrap(),
            MessageScope::Room(room.clone())
        );
        assert_eq!(
            MessageScope::resolve(None, None).unwrap(),
            MessageScope::Broadcast
        );
        assert!(MessageScope::resolve(Some(to), Some(room)).is_err());
    }

    #[test]
    fn factories_classify_messages() {
        let now = Utc::now();
        let alice = UserId::generate();
        let bob = UserId::generate();
        let room = RoomId::parse("general").unwrap();

        let direct = Message::direct(alice, bob, content("hi"), MessageType::Text, now);
        assert!(direct.is_direct());
        assert!(!direct.is_edited);
        assert_eq!(direct.scope.to_user(), Some(bob));
        assert_eq!(direct.message_date, now);

        let room_msg = Message::room(alice, room.clone(), content("hi"), MessageType::Image, now);
        assert!(room_msg.is_room());
        assert_eq!(room_msg.message_type, MessageType::Image);

        let broadcast = Message::broadcast(alice, content("hi"), MessageType::Text, now);
        assert!(broadcast.is_broadcast());

        let system = Message::system(content("maintenance"), Some(room), now);
        assert!(system.is_system());
        assert!(system.from_user.is_system());
        assert!(system.is_valid_for_sending());

        let reply = Message::reply(
            bob,
            direct.id,
            content("hello"),
            MessageType::Text,
            MessageScope::Direct(alice),
            now,
        );
        assert!(reply.is_reply());
        assert_eq!(reply.reply_to, Some(direct.id));
    }

    #[test]
    fn edit_window_is_24_hours() {
        let now = Utc::now();
        let alice = UserId::generate();
        let bob = UserId::generate();
        let message = Message::direct(alice, bob, content("hi"), MessageType::Text, now);

        assert!(message.can_edit(alice, now + Duration::hours(23)));
        assert!(!message.can_edit(alice, now + Duration::hours(25)));
        // 其他用户永远不能编辑
        assert!(!message.can_edit(bob, now));
    }

    #[test]
    fn system_messages_are_never_editable() {
        let now = Utc::now();
        let message = Message::system(content("notice"), None, now);
        assert!(!message.can_edit(UserId::SYSTEM, now));
    }

    #[test]
    fn delete_has_no_time_limit() {
        let now = Utc::now();
        let alice = UserId::generate();
        let message = Message::broadcast(alice, content("hi"), MessageType::Text, now);

        assert!(message.can_delete(alice));
        assert!(!message.can_delete(UserId::generate()));
    }

    #[test]
    fn edit_with_identical_content_is_a_noop() {
        let now = Utc::now();
        let alice = UserId::generate();
        let mut message = Message::broadcast(alice, content("hi"), MessageType::Text, now);

        assert!(!message.edit(content("hi"), now + Duration::minutes(1)));
        assert!(!message.is_edited);
        assert!(message.edited_at.is_none());

        let first_edit = now + Duration::minutes(2);
        assert!(message.edit(content("hi there"), first_edit));
        assert!(message.is_edited);
        assert_eq!(message.edited_at, Some(first_edit));

        // 再次提交同样的内容不会更新 edited_at
        assert!(!message.edit(content("hi there"), now + Duration::minutes(3)));
        assert_eq!(message.edited_at, Some(first_edit));
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let now = Utc::now();
        let alice = UserId::generate();
        let short = Message::broadcast(alice, content("short"), MessageType::Text, now);
        assert_eq!(short.preview(50), "short");

        let long = Message::broadcast(alice, content(&"多".repeat(60)), MessageType::Text, now);
        let preview = long.preview(50);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 53);
    }

    #[test]
    fn message_age_is_humanized() {
        let now = Utc::now();
        let alice = UserId::generate();
        let message = Message::broadcast(alice, content("hi"), MessageType::Text, now);

        assert_eq!(message.age_of(now + Duration::seconds(30)), "just now");
        assert_eq!(message.age_of(now + Duration::minutes(1)), "1 minute ago");
        assert_eq!(message.age_of(now + Duration::hours(3)), "3 hours ago");
        assert_eq!(message.age_of(now + Duration::days(2)), "2 days ago");
    }
}
