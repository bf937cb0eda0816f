use crate::errors::{DrainError, LogIngestError};
use crate::metrics_defs::{REQUEST_DURATION, REQUESTS};
use crate::router::{RouteMatch, Router};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Limited};
use hyper::body::{Body, Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use shared::http::{full_body, make_error_response, make_text_response};
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

type DrainResponse = Response<BoxBody<Bytes, LogIngestError>>;

/// Hyper service dispatching requests to the drains.
pub struct DrainService {
    router: Router,
    max_body_size: usize,
}

impl DrainService {
    pub fn new(router: Router, max_body_size: usize) -> Self {
        Self {
            router,
            max_body_size,
        }
    }
}

impl Service<Request<Incoming>> for DrainService {
    type Response = DrainResponse;
    type Error = LogIngestError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let span = tracing::info_span!(
            "request",
            request_id = %Uuid::new_v4(),
            method = %req.method(),
            path = %req.uri().path(),
            drain = tracing::field::Empty,
            project_id = tracing::field::Empty,
        );
        let router = self.router.clone();
        let max_body_size = self.max_body_size;

        Box::pin(handle_request(router, max_body_size, req).instrument(span))
    }
}

/// Routes the request, runs the matched drain and turns its outcome into a
/// response. Drain failures are answered with a 400 carrying the error text.
pub async fn handle_request<B>(
    router: Router,
    max_body_size: usize,
    req: Request<B>,
) -> Result<DrainResponse, LogIngestError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let drain = match router.route(&req) {
        RouteMatch::Drain(drain) => drain,
        RouteMatch::MethodNotAllowed => {
            return Ok(make_error_response(StatusCode::METHOD_NOT_ALLOWED));
        }
        RouteMatch::NotFound => return Ok(make_error_response(StatusCode::NOT_FOUND)),
    };
    tracing::Span::current().record("drain", drain.name());

    let start = Instant::now();
    let result = match read_body(req, max_body_size).await {
        Ok(req) => drain.handle(req).await,
        Err(e) => Err(e),
    };

    let response = match result {
        Ok(response) => response.map(full_body),
        Err(e) => {
            tracing::error!(error = %e, kind = e.kind(), "Drain request failed");
            make_text_response(StatusCode::BAD_REQUEST, e.to_string())
        }
    };

    shared::counter!(
        REQUESTS,
        "drain" => drain.name(),
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);
    shared::histogram!(REQUEST_DURATION, "drain" => drain.name())
        .record(start.elapsed().as_secs_f64());

    Ok(response)
}

/// Collects the whole body, refusing anything above `limit` bytes.
async fn read_body<B>(req: Request<B>, limit: usize) -> Result<Request<Bytes>, DrainError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = req.into_parts();
    let bytes = Limited::new(body, limit)
        .collect()
        .await
        .map_err(|e| DrainError::BodyReadError(e.to_string()))?
        .to_bytes();
    Ok(Request::from_parts(parts, bytes))
}
