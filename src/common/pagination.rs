// src/common/pagination.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Página (começa em 1)
    pub page: Option<i64>,
    /// Itens por página (máx. 100)
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .filter(|l| *l >= 1)
            .map(|l| l.min(MAX_LIMIT))
            .unwrap_or(DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total_items: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_items: i64, params: &PageParams) -> Self {
        let limit = params.limit();
        Self {
            items,
            total_pages: (total_items + limit - 1) / limit,
            current_page: params.page(),
            total_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_params_are_missing_or_invalid() {
        let params = PageParams::default();
        assert_eq!((params.page(), params.limit(), params.offset()), (1, 10, 0));

        let params = PageParams { page: Some(0), limit: Some(-5) };
        assert_eq!((params.page(), params.limit()), (1, 10));
    }

    #[test]
    fn limit_is_capped_and_offset_follows_page() {
        let params = PageParams { page: Some(3), limit: Some(500) };
        assert_eq!(params.limit(), MAX_LIMIT);
        assert_eq!(params.offset(), 200);
    }

    #[test]
    fn total_pages_rounds_up() {
        let params = PageParams { page: Some(2), limit: Some(10) };
        let page = Page::new(vec![1, 2, 3], 21, &params);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 2);

        let empty: Page<i32> = Page::new(vec![], 0, &params);
        assert_eq!(empty.total_pages, 0);
    }
}
