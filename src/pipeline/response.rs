use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{SearchParams, SearchResult};
use crate::error::{Error, ErrorResponse};

pub trait ResponseBuilder<R: SearchResult, P: SearchParams>: Send + Sync + 'static {
    type Body: Serialize;

    fn build_search_response(&self, results: R, total: i64, params: &P) -> Self::Body;

    fn build_error_response(&self, err: &Error) -> (StatusCode, ErrorResponse);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationDetails {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

impl PaginationDetails {
    pub fn new(total: i64, limit: i64, offset: i64, returned: usize) -> Self {
        let returned = i64::try_from(returned).unwrap_or(i64::MAX);
        Self {
            total,
            limit,
            offset,
            has_more: offset.saturating_add(returned) < total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CountResponse {
    pub count: i64,
}

/// Wraps results in the `{data, pagination}` envelope and maps errors through
/// [`Error::to_error_response`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResponseBuilder;

impl<R, P> ResponseBuilder<R, P> for DefaultResponseBuilder
where
    R: SearchResult,
    P: SearchParams,
{
    type Body = SearchResponse<R::Item>;

    fn build_search_response(&self, results: R, total: i64, params: &P) -> Self::Body {
        let pagination = PaginationDetails::new(total, params.limit(), params.offset(), results.len());
        SearchResponse {
            data: results.into_items(),
            pagination,
        }
    }

    fn build_error_response(&self, err: &Error) -> (StatusCode, ErrorResponse) {
        (err.status_code(), err.to_error_response())
    }
}
