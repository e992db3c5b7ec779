use axum::{
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::Serialize;

pub const TOTAL_COUNT_HEADER: HeaderName = HeaderName::from_static("x-total-count");

/// Page number (1-based) and page size of a list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: i64,
    pub limit: i64,
}

impl Paging {
    pub fn new(page: i64, limit: i64) -> Self {
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// A page of results with the total number of matches.
///
/// Serializes as `{ items, total, page, limit }`; the total is repeated in
/// the `X-Total-Count` header.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, paging: Paging) -> Self {
        Self {
            items,
            total,
            page: paging.page,
            limit: paging.limit,
        }
    }

    pub fn empty(paging: Paging) -> Self {
        Self::new(Vec::new(), 0, paging)
    }
}

impl<T: Serialize> IntoResponse for Paginated<T> {
    fn into_response(self) -> Response {
        let total = HeaderValue::from(self.total);
        let mut response = axum::Json(self).into_response();
        response.headers_mut().insert(TOTAL_COUNT_HEADER, total);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        assert_eq!(Paging::new(1, 10).offset(), 0);
        assert_eq!(Paging::new(3, 25).offset(), 50);
    }

    #[test]
    fn test_offset_saturates() {
        assert_eq!(Paging::new(i64::MAX, 10).offset(), i64::MAX);
    }
}
