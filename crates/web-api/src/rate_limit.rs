//! 按用户限流
//!
//! 固定窗口计数器，按用户ID分键。与参考实现不同，这里的映射是
//! 有界的：容量达到上限时先清理已过期的窗口，仍然满则淘汰
//! 最早重置的条目，保证内存不会无限增长。

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::error::ApiError;

/// 映射的容量上限
const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// 超出限额，`retry_after` 是到窗口重置的剩余秒数（向上取整）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimited {
    pub retry_after: u64,
}

impl From<RateLimited> for ApiError {
    fn from(value: RateLimited) -> Self {
        ApiError::too_many_requests(value.retry_after)
    }
}

#[derive(Debug)]
struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    max_entries: usize,
    entries: Mutex<HashMap<Uuid, WindowEntry>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self::with_capacity(window, max_requests, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(window: Duration, max_requests: u32, max_entries: usize) -> Self {
        Self {
            window,
            max_requests,
            max_entries: max_entries.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// 记录一次请求。窗口内超过限额时返回 `RateLimited`。
    pub fn check(&self, user_id: Uuid) -> Result<(), RateLimited> {
        self.check_at(user_id, Instant::now())
    }

    fn check_at(&self, user_id: Uuid, now: Instant) -> Result<(), RateLimited> {
        let mut entries = self.entries.lock().unwrap();

        if !entries.contains_key(&user_id) && entries.len() >= self.max_entries {
            entries.retain(|_, entry| entry.reset_at > now);
            if entries.len() >= self.max_entries {
                if let Some(oldest) = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.reset_at)
                    .map(|(id, _)| *id)
                {
                    entries.remove(&oldest);
                }
            }
        }

        let entry = entries.entry(user_id).or_insert(WindowEntry {
            count: 0,
            reset_at: now + self.window,
        });

        // 窗口到期后计数归零
        if entry.reset_at <= now {
            entry.count = 0;
            entry.reset_at = now + self.window;
        }

        if entry.count >= self.max_requests {
            let remaining = entry.reset_at.saturating_duration_since(now);
            return Err(RateLimited {
                retry_after: remaining.as_secs_f64().ceil() as u64,
            });
        }

        entry.count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_max_requests_per_window() {
        let limiter = RateLimiter::new(Duration::from_secs(900), 5);
        let user = Uuid::new_v4();
        let now = Instant::now();

        for _ in 0..5 {
            assert!(limiter.check_at(user, now).is_ok());
        }

        let rejected = limiter.check_at(user, now).unwrap_err();
        assert!(rejected.retry_after >= 1);
        assert!(rejected.retry_after <= 900);
    }

    #[test]
    fn counter_resets_after_window_elapses() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 2);
        let user = Uuid::new_v4();
        let now = Instant::now();

        assert!(limiter.check_at(user, now).is_ok());
        assert!(limiter.check_at(user, now).is_ok());
        assert!(limiter.check_at(user, now).is_err());

        let after_window = now + Duration::from_secs(61);
        assert!(limiter.check_at(user, after_window).is_ok());
    }

    #[test]
    fn retry_after_shrinks_with_elapsed_time() {
        let limiter = RateLimiter::new(Duration::from_secs(100), 1);
        let user = Uuid::new_v4();
        let now = Instant::now();

        assert!(limiter.check_at(user, now).is_ok());
        let rejected = limiter
            .check_at(user, now + Duration::from_secs(40))
            .unwrap_err();
        assert_eq!(rejected.retry_after, 60);
    }

    #[test]
    fn users_are_limited_independently() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        let now = Instant::now();

        assert!(limiter.check_at(Uuid::new_v4(), now).is_ok());
        assert!(limiter.check_at(Uuid::new_v4(), now).is_ok());
    }

    #[test]
    fn map_is_bounded_by_eviction() {
        let limiter = RateLimiter::with_capacity(Duration::from_secs(60), 1, 2);
        let now = Instant::now();

        let first = Uuid::new_v4();
        assert!(limiter.check_at(first, now).is_ok());
        assert!(limiter
            .check_at(Uuid::new_v4(), now + Duration::from_secs(1))
            .is_ok());
        // 容量已满且没有过期条目：最早重置的 first 被淘汰
        assert!(limiter
            .check_at(Uuid::new_v4(), now + Duration::from_secs(2))
            .is_ok());

        // first 的窗口被淘汰后重新计数，不会被旧条目拒绝
        assert!(limiter
            .check_at(first, now + Duration::from_secs(3))
            .is_ok());
    }
}
