//! 消息服务单元测试
//!
//! 覆盖发送分类、排序约定、分页、编辑/删除权限和统计。

#[cfg(test)]
mod message_service_tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use domain::{DomainError, MessageType, Pagination};
    use uuid::Uuid;

    use crate::error::ApplicationError;
    use crate::services::message_service::*;
    use crate::services::tests::{FixedClock, InMemoryMessageRepository};

    struct TestContext {
        service: MessageService,
        clock: Arc<FixedClock>,
    }

    fn create_test_context() -> TestContext {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let service = MessageService::new(MessageServiceDependencies {
            message_repository: Arc::new(InMemoryMessageRepository::new()),
            clock: clock.clone(),
        });
        TestContext { service, clock }
    }

    fn direct_request(from: Uuid, to: Uuid, body: &str) -> SendMessageRequest {
        SendMessageRequest {
            from_user: from,
            to_user: Some(to),
            room: None,
            message: body.to_string(),
            message_type: None,
            reply_to: None,
        }
    }

    fn room_request(from: Uuid, room: &str, body: &str) -> SendMessageRequest {
        SendMessageRequest {
            from_user: from,
            to_user: None,
            room: Some(room.to_string()),
            message: body.to_string(),
            message_type: None,
            reply_to: None,
        }
    }

    #[tokio::test]
    async fn test_send_classifies_messages() {
        let ctx = create_test_context();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let direct = ctx
            .service
            .send(direct_request(alice, bob, "hello"))
            .await
            .unwrap();
        assert!(direct.is_direct());
        assert_eq!(direct.message_type, MessageType::Text);

        let room = ctx
            .service
            .send(room_request(alice, "general", "hello room"))
            .await
            .unwrap();
        assert!(room.is_room());

        let broadcast = ctx
            .service
            .send(SendMessageRequest {
                from_user: alice,
                to_user: None,
                room: None,
                message: "hello all".to_string(),
                message_type: Some(MessageType::Image),
                reply_to: None,
            })
            .await
            .unwrap();
        assert!(broadcast.is_broadcast());
        assert_eq!(broadcast.message_type, MessageType::Image);
    }

    #[tokio::test]
    async fn test_send_rejects_ambiguous_addressing() {
        let ctx = create_test_context();

        let result = ctx
            .service
            .send(SendMessageRequest {
                from_user: Uuid::new_v4(),
                to_user: Some(Uuid::new_v4()),
                room: Some("general".to_string()),
                message: "hi".to_string(),
                message_type: None,
                reply_to: None,
            })
            .await;

        assert!(matches!(
            result.err().unwrap(),
            ApplicationError::Domain(DomainError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_send_rejects_system_type_from_clients() {
        let ctx = create_test_context();

        let result = ctx
            .service
            .send(SendMessageRequest {
                from_user: Uuid::new_v4(),
                to_user: None,
                room: None,
                message: "fake notice".to_string(),
                message_type: Some(MessageType::System),
                reply_to: None,
            })
            .await;

        assert!(matches!(
            result.err().unwrap(),
            ApplicationError::Domain(DomainError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_send_validates_body() {
        let ctx = create_test_context();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        assert!(ctx
            .service
            .send(direct_request(alice, bob, "   "))
            .await
            .is_err());
        assert!(ctx
            .service
            .send(direct_request(alice, bob, &"x".repeat(1001)))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_conversation_is_ascending_and_paginated() {
        let ctx = create_test_context();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        // 5条交替的私聊消息，时间逐条递增
        for i in 0..5 {
            let (from, to) = if i % 2 == 0 { (alice, bob) } else { (bob, alice) };
            ctx.service
                .send(direct_request(from, to, &format!("msg-{i}")))
                .await
                .unwrap();
            ctx.clock.advance(Duration::seconds(1));
        }

        let page = ctx
            .service
            .conversation(alice, bob, Pagination::new(2, 0))
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 5);
        assert!(page.has_more);
        assert_eq!(page.items[0].content.as_str(), "msg-0");
        assert_eq!(page.items[1].content.as_str(), "msg-1");

        let last = ctx
            .service
            .conversation(alice, bob, Pagination::new(2, 4))
            .await
            .unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(!last.has_more);
    }

    #[tokio::test]
    async fn test_ordering_asymmetry_between_listings() {
        let ctx = create_test_context();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        ctx.service
            .send(room_request(alice, "general", "first"))
            .await
            .unwrap();
        ctx.clock.advance(Duration::seconds(1));
        ctx.service
            .send(room_request(alice, "general", "second"))
            .await
            .unwrap();
        ctx.clock.advance(Duration::seconds(1));
        ctx.service
            .send(direct_request(alice, bob, "dm-1"))
            .await
            .unwrap();
        ctx.clock.advance(Duration::seconds(1));
        ctx.service
            .send(direct_request(bob, alice, "dm-2"))
            .await
            .unwrap();

        // 房间和信箱：最新优先
        let room = ctx
            .service
            .room_messages("general".to_string(), Pagination::default())
            .await
            .unwrap();
        assert_eq!(room.items[0].content.as_str(), "second");
        assert_eq!(room.items[1].content.as_str(), "first");

        let mailbox = ctx
            .service
            .user_messages(alice, Pagination::default())
            .await
            .unwrap();
        assert_eq!(mailbox.items[0].content.as_str(), "dm-2");

        // 会话：阅读顺序
        let conversation = ctx
            .service
            .conversation(alice, bob, Pagination::default())
            .await
            .unwrap();
        assert_eq!(conversation.items[0].content.as_str(), "dm-1");
        assert_eq!(conversation.items[1].content.as_str(), "dm-2");
    }

    #[tokio::test]
    async fn test_replies_are_ascending() {
        let ctx = create_test_context();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let root = ctx
            .service
            .send(room_request(alice, "general", "root"))
            .await
            .unwrap();

        for i in 0..3 {
            ctx.clock.advance(Duration::seconds(1));
            ctx.service
                .send(SendMessageRequest {
                    from_user: bob,
                    to_user: None,
                    room: Some("general".to_string()),
                    message: format!("reply-{i}"),
                    message_type: None,
                    reply_to: Some(root.id.into()),
                })
                .await
                .unwrap();
        }

        let replies = ctx.service.replies(root.id.into()).await.unwrap();
        assert_eq!(replies.len(), 3);
        assert!(replies.iter().all(|m| m.reply_to == Some(root.id)));
        assert_eq!(replies[0].content.as_str(), "reply-0");
        assert_eq!(replies[2].content.as_str(), "reply-2");
    }

    #[tokio::test]
    async fn test_update_message_by_owner_within_window() {
        let ctx = create_test_context();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let message = ctx
            .service
            .send(direct_request(alice, bob, "original"))
            .await
            .unwrap();

        ctx.clock.advance(Duration::hours(1));
        let edited = ctx
            .service
            .update_message(message.id.into(), alice, "first edit".to_string())
            .await
            .unwrap();
        assert!(edited.is_edited);
        assert_eq!(edited.content.as_str(), "first edit");
        let first_edited_at = edited.edited_at.unwrap();

        // 同样的内容再次提交：不变，edited_at 保持不变
        ctx.clock.advance(Duration::hours(1));
        let unchanged = ctx
            .service
            .update_message(message.id.into(), alice, "first edit".to_string())
            .await
            .unwrap();
        assert_eq!(unchanged.edited_at, Some(first_edited_at));

        // 窗口内第二次编辑仍然允许
        let second = ctx
            .service
            .update_message(message.id.into(), alice, "second edit".to_string())
            .await
            .unwrap();
        assert!(second.is_edited);
        assert!(second.edited_at.unwrap() > first_edited_at);
    }

    #[tokio::test]
    async fn test_update_message_by_non_owner_reports_not_found() {
        let ctx = create_test_context();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let message = ctx
            .service
            .send(direct_request(alice, bob, "original"))
            .await
            .unwrap();

        let result = ctx
            .service
            .update_message(message.id.into(), bob, "hijacked".to_string())
            .await;
        assert!(matches!(
            result.err().unwrap(),
            ApplicationError::Domain(DomainError::NotFound { .. })
        ));

        // 原消息保持不变
        let stored = ctx.service.get_message(message.id.into()).await.unwrap();
        assert_eq!(stored.content.as_str(), "original");
        assert!(!stored.is_edited);
    }

    #[tokio::test]
    async fn test_update_message_outside_window_is_denied() {
        let ctx = create_test_context();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let message = ctx
            .service
            .send(direct_request(alice, bob, "original"))
            .await
            .unwrap();

        ctx.clock.advance(Duration::hours(25));
        let result = ctx
            .service
            .update_message(message.id.into(), alice, "too late".to_string())
            .await;

        assert!(matches!(
            result.err().unwrap(),
            ApplicationError::Domain(DomainError::PermissionDenied { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_message_is_owner_scoped() {
        let ctx = create_test_context();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let message = ctx
            .service
            .send(direct_request(alice, bob, "to delete"))
            .await
            .unwrap();

        // 非发送者删除：报不存在，消息仍然可取
        let result = ctx.service.delete_message(message.id.into(), bob).await;
        assert!(matches!(
            result.err().unwrap(),
            ApplicationError::Domain(DomainError::NotFound { .. })
        ));
        assert!(ctx.service.get_message(message.id.into()).await.is_ok());

        // 发送者删除成功，之后查询报不存在
        ctx.service
            .delete_message(message.id.into(), alice)
            .await
            .unwrap();
        assert!(matches!(
            ctx.service
                .get_message(message.id.into())
                .await
                .err()
                .unwrap(),
            ApplicationError::Domain(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_recent_conversations_digest() {
        let ctx = create_test_context();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let carol = Uuid::new_v4();

        ctx.service
            .send(direct_request(alice, bob, "to bob 1"))
            .await
            .unwrap();
        ctx.clock.advance(Duration::seconds(1));
        ctx.service
            .send(direct_request(alice, carol, "to carol"))
            .await
            .unwrap();
        ctx.clock.advance(Duration::seconds(1));
        ctx.service
            .send(direct_request(bob, alice, "to bob 2"))
            .await
            .unwrap();

        let digest = ctx
            .service
            .recent_conversations(alice, None)
            .await
            .unwrap();

        // 每个对端一条，最近的会话在前
        assert_eq!(digest.len(), 2);
        assert_eq!(digest[0].content.as_str(), "to bob 2");
        assert_eq!(digest[1].content.as_str(), "to carol");
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_scoped() {
        let ctx = create_test_context();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let carol = Uuid::new_v4();

        ctx.service
            .send(direct_request(alice, bob, "Deployment finished"))
            .await
            .unwrap();
        ctx.clock.advance(Duration::seconds(1));
        ctx.service
            .send(direct_request(carol, bob, "deployment pending"))
            .await
            .unwrap();
        ctx.clock.advance(Duration::seconds(1));
        ctx.service
            .send(direct_request(alice, bob, "unrelated"))
            .await
            .unwrap();

        let all = ctx
            .service
            .search("DEPLOY".to_string(), None, None)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        // 倒序：最新的命中在前
        assert_eq!(all[0].content.as_str(), "deployment pending");

        let scoped = ctx
            .service
            .search("deploy".to_string(), Some(alice), None)
            .await
            .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].content.as_str(), "Deployment finished");

        let empty = ctx.service.search("   ".to_string(), None, None).await;
        assert!(empty.is_err());
    }

    #[tokio::test]
    async fn test_user_stats_counts() {
        let ctx = create_test_context();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let sent = ctx
            .service
            .send(direct_request(alice, bob, "one"))
            .await
            .unwrap();
        ctx.service
            .send(direct_request(alice, bob, "two"))
            .await
            .unwrap();
        ctx.service
            .send(direct_request(bob, alice, "three"))
            .await
            .unwrap();
        ctx.service
            .update_message(sent.id.into(), alice, "one (edited)".to_string())
            .await
            .unwrap();

        let stats = ctx.service.stats(alice).await.unwrap();
        assert_eq!(stats.total_sent, 2);
        assert_eq!(stats.total_received, 1);
        assert_eq!(stats.total_edited, 1);
    }
}
