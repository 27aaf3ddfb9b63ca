use axum::{extract::Query, http::Uri};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

pub trait RequestParser<R>: Send + Sync + 'static {
    fn parse(&self, uri: &Uri) -> Result<R>;
}

/// Deserializes the request from the URI query string.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryRequestParser;

impl<R: DeserializeOwned> RequestParser<R> for QueryRequestParser {
    fn parse(&self, uri: &Uri) -> Result<R> {
        Query::<R>::try_from_uri(uri)
            .map(|Query(request)| request)
            .map_err(|rejection| Error::Parse(rejection.body_text()))
    }
}
