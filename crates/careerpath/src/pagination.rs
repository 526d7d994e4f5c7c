use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Offset/limit window accepted by the list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

/// Envelope metadata returned beside every paginated collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

/// Apply an offset/limit window to an already-filtered collection.
pub fn paginate<T>(items: Vec<T>, params: PageParams) -> (Vec<T>, PageInfo) {
    let total = items.len();
    let start = params.offset.min(total);
    let end = start.saturating_add(params.limit).min(total);
    let info = PageInfo {
        total,
        limit: params.limit,
        offset: params.offset,
        has_more: end < total,
    };

    let page = items.into_iter().skip(start).take(end - start).collect();
    (page, info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_windows_and_flags_remaining() {
        let items: Vec<u32> = (0..10).collect();
        let (page, info) = paginate(
            items,
            PageParams {
                limit: 3,
                offset: 4,
            },
        );
        assert_eq!(page, vec![4, 5, 6]);
        assert_eq!(info.total, 10);
        assert!(info.has_more);
    }

    #[test]
    fn paginate_past_the_end_yields_empty_page() {
        let items: Vec<u32> = (0..3).collect();
        let (page, info) = paginate(
            items,
            PageParams {
                limit: 5,
                offset: 10,
            },
        );
        assert!(page.is_empty());
        assert!(!info.has_more);
        assert_eq!(info.total, 3);
    }
}
