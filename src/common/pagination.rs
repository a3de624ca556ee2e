// src/common/pagination.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

// Os parâmetros chegam como texto para que valores inválidos caiam no padrão
// em vez de rejeitar a requisição.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// Página (>= 1, padrão 1)
    pub page: Option<String>,
    /// Itens por página (>= 1, padrão 10)
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: if page == 0 { DEFAULT_PAGE } else { page },
            limit: if limit == 0 { DEFAULT_LIMIT } else { limit },
        }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// `skip` e `limit` já convertidos para o tipo que o Postgres espera.
    pub fn sql_window(&self) -> (i64, i64) {
        let offset = i64::try_from(self.skip()).unwrap_or(i64::MAX);
        let limit = i64::try_from(self.limit).unwrap_or(i64::MAX);
        (offset, limit)
    }
}

fn parse_positive(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| *value > 0)
        .map(|value| value as u64)
        .unwrap_or(default)
}

impl From<PaginationQuery> for PageRequest {
    fn from(query: PaginationQuery) -> Self {
        Self {
            page: parse_positive(query.page.as_deref(), DEFAULT_PAGE),
            limit: parse_positive(query.limit.as_deref(), DEFAULT_LIMIT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub total: u64,
    pub total_pages: u64,
    pub page: u64,
    pub limit: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(total: u64, request: PageRequest) -> Self {
        let total_pages = total.div_ceil(request.limit);
        Self {
            total,
            total_pages,
            page: request.page,
            limit: request.limit,
            has_next: request.page < total_pages,
            has_prev: request.page > 1,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(total, request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>) -> PaginationQuery {
        PaginationQuery {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn defaults_when_missing() {
        assert_eq!(PageRequest::from(query(None, None)), PageRequest::new(1, 10));
    }

    #[test]
    fn clamps_non_positive_and_garbage() {
        assert_eq!(PageRequest::from(query(Some("0"), Some("-5"))), PageRequest::new(1, 10));
        assert_eq!(PageRequest::from(query(Some("abc"), Some("2.5"))), PageRequest::new(1, 10));
        assert_eq!(PageRequest::from(query(Some("3"), Some("25"))), PageRequest::new(3, 25));
    }

    #[test]
    fn skip_is_zero_based() {
        assert_eq!(PageRequest::new(1, 10).skip(), 0);
        assert_eq!(PageRequest::new(3, 10).skip(), 20);
        assert_eq!(PageRequest::new(u64::MAX, u64::MAX).sql_window().0, i64::MAX);
    }

    #[test]
    fn first_and_last_page_flags() {
        let first = PaginationMeta::new(25, PageRequest::new(1, 10));
        assert_eq!(first.total_pages, 3);
        assert!(first.has_next);
        assert!(!first.has_prev);

        let last = PaginationMeta::new(25, PageRequest::new(3, 10));
        assert!(!last.has_next);
        assert!(last.has_prev);
    }

    #[test]
    fn empty_collection_has_no_pages() {
        let meta = PaginationMeta::new(0, PageRequest::default());
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }
}
