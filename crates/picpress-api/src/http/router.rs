//! Router construction and server host for the API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    handler::HandlerWithoutStateExt,
    http::{
        HeaderName, Method, Request,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::Response,
    routing::{get, post},
};
use picpress_telemetry::{build_sha, set_request_context};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{Span, info};

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::clear::clear_data;
use crate::http::constants::{HEADER_CONVERTED, HEADER_FAILED, HEADER_REQUEST_ID};
use crate::http::convert::convert;
use crate::http::health::{health, metrics, not_found};
use crate::http::telemetry::HttpMetricsLayer;
use crate::state::ApiState;

/// Axum router wrapper that hosts the picpress HTTP surface.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Build the router over shared state.
    ///
    /// `static_dir` serves the browser client for every unmatched `GET`; without it, unmatched
    /// requests receive a 404 problem.
    #[must_use]
    pub fn new(state: ApiState, static_dir: Option<PathBuf>) -> Self {
        let body_limit = state.limits.max_body_bytes;
        let telemetry = state.telemetry.clone();
        let state = Arc::new(state);

        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE])
            .expose_headers([
                CONTENT_DISPOSITION,
                HeaderName::from_static(HEADER_CONVERTED),
                HeaderName::from_static(HEADER_FAILED),
            ]);
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let method = request.method().clone();
                let uri_path = request.uri().path();
                let request_id = request
                    .headers()
                    .get(HEADER_REQUEST_ID)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default()
                    .to_string();

                let span = tracing::info_span!(
                    "http.request",
                    method = %method,
                    route = tracing::field::Empty,
                    request_id = tracing::field::Empty,
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                );
                set_request_context(&span, request_id, uri_path.to_string());
                span
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(|response: &Response, latency: Duration, span: &Span| {
                let status = response.status().as_u16();
                span.record("status_code", status);
                let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                span.record("latency_ms", latency_ms);
            });
        let layered = ServiceBuilder::new()
            // Outermost, so generated ids are visible to the propagate layer.
            .layer(picpress_telemetry::set_request_id_layer())
            .layer(picpress_telemetry::propagate_request_id_layer())
            .layer(trace_layer)
            .layer(cors_layer);

        let router = Self::routes(body_limit)
            .route_layer(HttpMetricsLayer::new(telemetry));
        let router = Self::mount_fallback(router, static_dir)
            .layer(layered)
            .with_state(state);

        Self { router }
    }

    fn routes(body_limit: usize) -> Router<Arc<ApiState>> {
        Router::new()
            .route(
                "/convert",
                post(convert).layer(DefaultBodyLimit::max(body_limit)),
            )
            .route("/clear-data", post(clear_data))
            .route("/health", get(health))
            .route("/metrics", get(metrics))
    }

    fn mount_fallback(
        router: Router<Arc<ApiState>>,
        static_dir: Option<PathBuf>,
    ) -> Router<Arc<ApiState>> {
        match static_dir {
            Some(dir) => {
                info!(path = %dir.display(), "serving static assets");
                let assets = ServeDir::new(dir)
                    .call_fallback_on_method_not_allowed(true)
                    .not_found_service(not_found.into_service());
                router.fallback_service(assets)
            }
            None => router.fallback(not_found),
        }
    }

    /// Serve on the supplied address until the process is stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind or the server terminates unexpectedly.
    pub async fn serve(self, addr: SocketAddr) -> ApiServerResult<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        info!(%addr, "picpress listening");
        axum::serve(listener, self.router.into_make_service())
            .await
            .map_err(|source| ApiServerError::Serve { source })
    }

    /// Clone the assembled router, e.g. to drive it in-process.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}
