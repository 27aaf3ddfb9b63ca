//! Reusable search request pipeline.
//!
//! A resource plugs in a request type, a parameter type, a result collection and a
//! [`SearchService`]; [`SearchHandler`] then runs parse, validate, convert, execute and
//! respond for both the paginated search and the count-only variant.

pub mod handler;
pub mod parser;
pub mod response;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

pub use handler::SearchHandler;
pub use parser::{QueryRequestParser, RequestParser};
pub use response::{DefaultResponseBuilder, PaginationDetails, ResponseBuilder, SearchResponse};

/// Transport-level input that can validate itself and be turned into parameters.
pub trait SearchRequest: Send + Sync + 'static {
    type Params: SearchParams;

    /// Collects every violation instead of stopping at the first one.
    fn validate(&self) -> Result<()>;

    fn to_search_params(&self) -> Result<Self::Params>;
}

pub trait SearchParams: Send + Sync + 'static {
    fn limit(&self) -> i64;
    fn offset(&self) -> i64;
}

/// One page of results, ready for serialization.
pub trait SearchResult: Send + 'static {
    type Item: Serialize + Send;

    fn items(&self) -> &[Self::Item];

    fn into_items(self) -> Vec<Self::Item>;

    /// Number of items on this page, not the total number of matches.
    fn len(&self) -> usize {
        self.items().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
pub trait SearchService<P: SearchParams>: Send + Sync + 'static {
    type Output: SearchResult;

    /// Returns the requested page and the total number of matches.
    async fn execute_search(&self, params: &P) -> Result<(Self::Output, i64)>;

    async fn execute_search_count(&self, params: &P) -> Result<i64>;
}
