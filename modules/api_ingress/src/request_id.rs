use axum::http::Request;
use axum::{body::Body, middleware::Next, response::Response};
use modkit::XRequestId;
use tower_http::request_id::{MakeRequestId, RequestId};

pub use modkit::api::request::request_id_header as header;

#[derive(Clone, Default)]
pub struct MakeReqId;

impl MakeRequestId for MakeReqId {
    fn make_request_id<B>(&mut self, _req: &Request<B>) -> Option<RequestId> {
        let id = nanoid::nanoid!();
        Some(RequestId::new(id.parse().ok()?))
    }
}

/// Middleware that stores request_id in Request.extensions and records it in the current span
pub async fn push_req_id_to_extensions(mut req: Request<Body>, next: Next) -> Response {
    let rid = XRequestId::from_headers(req.headers()).unwrap_or_else(|| XRequestId("n/a".into()));

    tracing::Span::current().record("request_id", tracing::field::display(rid.as_str()));
    req.extensions_mut().insert(rid);

    next.run(req).await
}

/// Create trace layer with proper typing
#[allow(clippy::type_complexity)]
pub fn create_trace_layer() -> tower_http::trace::TraceLayer<
    tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>,
    impl Fn(&Request<Body>) -> tracing::Span + Clone,
> {
    use tower_http::trace::TraceLayer;

    TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        let rid = XRequestId::from_headers(req.headers());
        tracing::info_span!(
            "http_request",
            method = %req.method(),
            uri = %req.uri().path(),
            version = ?req.version(),
            request_id = %rid.as_ref().map_or("n/a", XRequestId::as_str),
        )
    })
}
