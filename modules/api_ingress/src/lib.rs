//! HTTP host: wraps module routes in the shared middleware stack, publishes
//! the OpenAPI document and serves until cancelled.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::header;
use axum::response::IntoResponse;
use axum::{middleware::from_fn, routing::get, Json, Router};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;

pub struct ApiIngress {
    config: ApiIngressConfig,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    /// Address to listen on: `bind_addr` when configured, else `host:port`.
    pub fn bind_addr(&self, host: &str, port: u16) -> Result<SocketAddr> {
        let raw = match &self.config.bind_addr {
            Some(addr) => addr.clone(),
            None => format!("{host}:{port}"),
        };
        raw.parse()
            .with_context(|| format!("Invalid bind address '{raw}'"))
    }

    /// Build the HTTP router around the module routes.
    pub fn build_router(&self, routes: Router, openapi: &utoipa::openapi::OpenApi) -> Result<Router> {
        let mut router = routes
            .route("/health", get(web::health_check))
            .fallback(web::not_found);

        if self.config.enable_docs {
            // Build once, serve as static JSON (no per-request parsing)
            let doc = Arc::new(serde_json::to_value(openapi).context("OpenAPI serialization")?);
            tracing::info!(
                operations = openapi.paths.paths.len(),
                "Publishing OpenAPI document"
            );
            router = router
                .route(
                    "/openapi.json",
                    get(move || {
                        let doc = doc.clone();
                        async move {
                            ([(header::CACHE_CONTROL, "no-store")], Json((*doc).clone()))
                                .into_response()
                        }
                    }),
                )
                .route("/docs", get(web::serve_docs));
        }

        // Layers wrap everything added before them; the last one is outermost.
        // Outermost to innermost:
        // PropagateRequestId -> SetRequestId -> Trace -> push_req_id_to_extensions -> Timeout -> CORS -> BodyLimit
        router = router.layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes));

        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        router = router.layer(TimeoutLayer::new(Duration::from_secs(
            self.config.request_timeout_secs,
        )));

        router = router.layer(from_fn(request_id::push_req_id_to_extensions));
        router = router.layer(request_id::create_trace_layer());

        let x_request_id = request_id::header();
        router = router.layer(SetRequestIdLayer::new(
            x_request_id.clone(),
            request_id::MakeReqId,
        ));
        router = router.layer(PropagateRequestIdLayer::new(x_request_id));

        Ok(router)
    }

    /// Bind and serve `router` until `cancel` fires, then drain in-flight requests.
    pub async fn serve(
        &self,
        router: Router,
        addr: SocketAddr,
        cancel: CancellationToken,
    ) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        self.serve_on(listener, router, cancel).await
    }

    pub async fn serve_on(
        &self,
        listener: tokio::net::TcpListener,
        router: Router,
        cancel: CancellationToken,
    ) -> Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!("HTTP server bound on {}", addr);

        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_prefers_explicit_setting() {
        let ingress = ApiIngress::new(ApiIngressConfig {
            bind_addr: Some("0.0.0.0:9999".into()),
            ..ApiIngressConfig::default()
        });
        assert_eq!(
            ingress.bind_addr("127.0.0.1", 8087).unwrap(),
            "0.0.0.0:9999".parse().unwrap()
        );

        let ingress = ApiIngress::new(ApiIngressConfig::default());
        assert_eq!(
            ingress.bind_addr("127.0.0.1", 8087).unwrap(),
            "127.0.0.1:8087".parse().unwrap()
        );
        assert!(ingress.bind_addr("not a host", 1).is_err());
    }
}
