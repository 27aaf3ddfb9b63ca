use std::marker::PhantomData;

use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use serde::de::DeserializeOwned;

use super::{
    response::CountResponse, DefaultResponseBuilder, QueryRequestParser, RequestParser,
    ResponseBuilder, SearchRequest, SearchService,
};
use crate::error::{Error, Result};

/// Drives one resource's search endpoints. Every invocation emits exactly one response;
/// the first failing stage ends it.
pub struct SearchHandler<Req, Svc, Parser = QueryRequestParser, Builder = DefaultResponseBuilder> {
    parser: Parser,
    service: Svc,
    response_builder: Builder,
    _request: PhantomData<fn() -> Req>,
}

impl<Req, Svc> SearchHandler<Req, Svc>
where
    Req: SearchRequest + DeserializeOwned,
    Svc: SearchService<Req::Params>,
{
    /// Query-string parsing and the `{data, pagination}` envelope.
    pub fn with_defaults(service: Svc) -> Self {
        Self::new(QueryRequestParser, service, DefaultResponseBuilder)
    }
}

impl<Req, Svc, Parser, Builder> SearchHandler<Req, Svc, Parser, Builder>
where
    Req: SearchRequest,
    Svc: SearchService<Req::Params>,
    Parser: RequestParser<Req>,
    Builder: ResponseBuilder<Svc::Output, Req::Params>,
{
    pub fn new(parser: Parser, service: Svc, response_builder: Builder) -> Self {
        Self {
            parser,
            service,
            response_builder,
            _request: PhantomData,
        }
    }

    pub fn service(&self) -> &Svc {
        &self.service
    }

    pub async fn handle_search(&self, uri: &Uri) -> Response {
        let params = match self.prepare(uri) {
            Ok(params) => params,
            Err(err) => return self.error_response(err),
        };

        match self.service.execute_search(&params).await {
            Ok((results, total)) => {
                let body = self
                    .response_builder
                    .build_search_response(results, total, &params);
                (StatusCode::OK, Json(body)).into_response()
            }
            Err(err) => self.error_response(err),
        }
    }

    pub async fn handle_search_count(&self, uri: &Uri) -> Response {
        let params = match self.prepare(uri) {
            Ok(params) => params,
            Err(err) => return self.error_response(err),
        };

        match self.service.execute_search_count(&params).await {
            Ok(count) => (StatusCode::OK, Json(CountResponse { count })).into_response(),
            Err(err) => self.error_response(err),
        }
    }

    fn prepare(&self, uri: &Uri) -> Result<Req::Params> {
        let request = self.parser.parse(uri)?;
        request.validate()?;
        request.to_search_params()
    }

    fn error_response(&self, err: Error) -> Response {
        let (status, body) = self.response_builder.build_error_response(&err);
        if status.is_server_error() {
            tracing::error!(component = "pipeline", error = %err, "search failed");
        } else {
            tracing::debug!(component = "pipeline", status = status.as_u16(), error = %err, "search rejected");
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::to_bytes;
    use serde::Deserialize;
    use serde_json::Value as JsonValue;

    use super::*;
    use crate::pipeline::{SearchParams, SearchResult};

    #[derive(Debug, Deserialize)]
    struct NameRequest {
        q: String,
        #[serde(default)]
        limit: i64,
        #[serde(default)]
        offset: i64,
        since: Option<String>,
    }

    struct NameParams {
        q: String,
        limit: i64,
        offset: i64,
    }

    impl SearchParams for NameParams {
        fn limit(&self) -> i64 {
            self.limit
        }

        fn offset(&self) -> i64 {
            self.offset
        }
    }

    impl SearchRequest for NameRequest {
        type Params = NameParams;

        fn validate(&self) -> Result<()> {
            let mut errors = Vec::new();
            if self.q.trim().is_empty() {
                errors.push("q is empty".to_string());
            }
            if self.limit > 50 {
                errors.push("limit too large".to_string());
            }
            if errors.is_empty() {
                Ok(())
            } else {
                Err(Error::Validation(errors))
            }
        }

        fn to_search_params(&self) -> Result<NameParams> {
            if let Some(since) = &self.since {
                chrono::NaiveDate::parse_from_str(since, "%Y-%m-%d").map_err(|source| {
                    Error::Conversion {
                        field: "since",
                        value: since.clone(),
                        source,
                    }
                })?;
            }
            Ok(NameParams {
                q: self.q.clone(),
                limit: if self.limit <= 0 { 2 } else { self.limit },
                offset: self.offset.max(0),
            })
        }
    }

    struct Names(Vec<String>);

    impl SearchResult for Names {
        type Item = String;

        fn items(&self) -> &[String] {
            &self.0
        }

        fn into_items(self) -> Vec<String> {
            self.0
        }
    }

    #[derive(Default)]
    struct NameService {
        searches: AtomicUsize,
        counts: AtomicUsize,
    }

    const NAMES: [&str; 3] = ["ana", "andres", "maria"];

    #[async_trait]
    impl SearchService<NameParams> for NameService {
        type Output = Names;

        async fn execute_search(&self, params: &NameParams) -> Result<(Names, i64)> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            if params.q == "explode" {
                return Err(Error::Internal("connection reset by peer".into()));
            }
            let matches: Vec<String> = NAMES
                .iter()
                .filter(|name| name.contains(params.q.as_str()))
                .map(|name| name.to_string())
                .collect();
            let total = matches.len() as i64;
            let page = matches
                .into_iter()
                .skip(params.offset as usize)
                .take(params.limit as usize)
                .collect();
            Ok((Names(page), total))
        }

        async fn execute_search_count(&self, params: &NameParams) -> Result<i64> {
            self.counts.fetch_add(1, Ordering::SeqCst);
            Ok(NAMES.iter().filter(|name| name.contains(params.q.as_str())).count() as i64)
        }
    }

    fn handler() -> SearchHandler<NameRequest, NameService> {
        SearchHandler::with_defaults(NameService::default())
    }

    async fn body_json(response: Response) -> JsonValue {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn search_wraps_page_in_pagination_envelope() {
        let handler = handler();
        let uri: Uri = "/names?q=an&limit=1".parse().unwrap();

        let response = handler.handle_search(&uri).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["data"], serde_json::json!(["ana"]));
        assert_eq!(body["pagination"]["total"], 2);
        assert_eq!(body["pagination"]["limit"], 1);
        assert_eq!(body["pagination"]["offset"], 0);
        assert_eq!(body["pagination"]["has_more"], true);
    }

    #[tokio::test]
    async fn parse_failure_stops_before_the_service() {
        let handler = handler();
        let uri: Uri = "/names?limit=1".parse().unwrap();

        let response = handler.handle_search(&uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "INVALID_REQUEST");
        assert_eq!(handler.service().searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn validation_failure_reports_all_violations() {
        let handler = handler();
        let uri: Uri = "/names?q=%20&limit=99".parse().unwrap();

        let response = handler.handle_search(&uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(
            body["error"]["details"],
            serde_json::json!(["q is empty", "limit too large"])
        );
        assert_eq!(handler.service().searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn conversion_failure_is_a_bad_request() {
        let handler = handler();
        let uri: Uri = "/names?q=an&since=yesterday".parse().unwrap();

        let response = handler.handle_search(&uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "CONVERSION_ERROR");
        assert_eq!(handler.service().searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn service_failure_is_an_opaque_500() {
        let handler = handler();
        let uri: Uri = "/names?q=explode".parse().unwrap();

        let response = handler.handle_search(&uri).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert!(!body.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn count_only_calls_the_count_operation() {
        let handler = handler();
        let uri: Uri = "/names/count?q=a".parse().unwrap();

        let response = handler.handle_search_count(&uri).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({"count": 3}));
        assert_eq!(handler.service().counts.load(Ordering::SeqCst), 1);
        assert_eq!(handler.service().searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn count_runs_the_same_validation() {
        let handler = handler();
        let uri: Uri = "/names/count?q=".parse().unwrap();

        let response = handler.handle_search_count(&uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(handler.service().counts.load(Ordering::SeqCst), 0);
    }
}
