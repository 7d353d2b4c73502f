//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with a single dispatching fallback handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Bind server to listener and shut down gracefully

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::request;
use crate::lifecycle::Application;

/// Application state injected into the handler.
#[derive(Clone)]
struct AppState {
    app: Arc<Application>,
    max_body_bytes: usize,
}

/// HTTP boundary for a bootstrapped application.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(app: Application, config: &AppConfig) -> Self {
        let state = AppState {
            app: Arc::new(app),
            max_body_bytes: config.listener.max_body_bytes,
        };
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        // Outermost first: the request id is set before tracing sees the request.
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(middleware)
    }

    /// The configured router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` completes, then drain.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Convert, dispatch, and render one request.
async fn dispatch_handler(State(state): State<AppState>, req: Request<Body>) -> Response {
    let inbound = match request::into_inbound(req, state.max_body_bytes).await {
        Ok(inbound) => inbound,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected request before dispatch");
            return e.into_response();
        }
    };

    let request_id = inbound.request_id.clone();
    let verb = inbound.verb;
    let path = inbound.path.clone();

    match state.app.handle(inbound).await {
        Ok(reply) => reply.into_response(),
        Err(err) => {
            if err.status() >= 500 {
                tracing::error!(
                    request_id = %request_id,
                    verb = %verb,
                    path = %path,
                    error = %err,
                    "Request failed"
                );
            } else {
                tracing::debug!(
                    request_id = %request_id,
                    status = err.status(),
                    error = %err,
                    "Request rejected"
                );
            }
            err.into_response()
        }
    }
}
