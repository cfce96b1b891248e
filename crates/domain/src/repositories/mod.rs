//! Repository接口定义
//!
//! 数据访问层的抽象接口：内层定义接口，外层（infrastructure）实现接口。
//! 查询不到数据用 `Ok(None)` 表达，错误只用于真正的存储故障。

pub mod message_repository;
pub mod user_repository;

pub use message_repository::{MessageRepository, MessageStats};
pub use user_repository::UserRepository;

/// 分页参数（limit/offset 风格）
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 100;

impl Pagination {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
            offset: offset.max(0),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT, 0)
    }
}

/// 分页结果，带精确总数
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        let has_more = (pagination.offset as u64 + items.len() as u64) < total;
        Self {
            items,
            total,
            limit: pagination.limit,
            offset: pagination.offset,
            has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_limits() {
        let p = Pagination::new(0, -5);
        assert_eq!(p.limit, 1);
        assert_eq!(p.offset, 0);

        let p = Pagination::new(1000, 10);
        assert_eq!(p.limit, MAX_PAGE_LIMIT);
        assert_eq!(p.offset, 10);
    }

    #[test]
    fn has_more_uses_exact_total() {
        let page = PaginatedResult::new(vec![1, 2], 5, Pagination::new(2, 0));
        assert!(page.has_more);

        let last_page = PaginatedResult::new(vec![5], 5, Pagination::new(2, 4));
        assert!(!last_page.has_more);

        let empty = PaginatedResult::<i32>::new(vec![], 0, Pagination::default());
        assert!(!empty.has_more);
    }
}
