//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, CORS, metrics, limits, panics)
//! - Own the background tasks that live as long as the server
//! - Serve until shutdown, then drain

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::brackets::ValidationService;
use crate::cache::CacheHandle;
use crate::config::ServiceConfig;
use crate::error::ErrorBody;
use crate::health::{ClusterHealthChecker, HealthMonitor};
use crate::http::handlers;
use crate::http::middleware::track_metrics;
use crate::http::request::{request_id_layers, RequestIdExt};
use crate::stats::{self, StatsRecorder, StatsSender, StatsWorker};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub validator: Arc<ValidationService>,
    pub health: Arc<ClusterHealthChecker>,
    pub recorder: Arc<StatsRecorder>,
    /// `None` when stats recording is disabled.
    pub stats: Option<StatsSender>,
}

/// HTTP server for the bracket validation service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
    health: Arc<ClusterHealthChecker>,
    stats_worker: Option<StatsWorker>,
}

impl HttpServer {
    /// Create a server whose cache client is built from configuration.
    pub fn new(config: ServiceConfig) -> Self {
        let cache = Arc::new(CacheHandle::from_config(&config.cache));
        Self::with_cache(config, cache)
    }

    /// Create a server on top of an existing cache handle.
    pub fn with_cache(config: ServiceConfig, cache: Arc<CacheHandle>) -> Self {
        let validator = Arc::new(ValidationService::from_config(&config.validation));
        let health = Arc::new(ClusterHealthChecker::from_config(cache.clone(), &config.cache));
        let recorder = Arc::new(StatsRecorder::new(cache, &config.stats));

        let (sender, stats_worker) = if config.stats.enabled {
            let (sender, worker) = stats::channel(
                recorder.clone(),
                config.stats.queue_capacity,
                config.stats.drain_timeout(),
            );
            (Some(sender), Some(worker))
        } else {
            (None, None)
        };

        let state = AppState {
            validator,
            health: health.clone(),
            recorder,
            stats: sender,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            health,
            stats_worker,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers listed first wrap the ones after them.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let (set_request_id, propagate_request_id) = request_id_layers();

        let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = request.request_id().unwrap_or("-"),
            )
        });

        let middleware = ServiceBuilder::new()
            .layer(set_request_id)
            .layer(trace)
            .layer(propagate_request_id)
            .layer(cors_layer())
            .layer(middleware::from_fn(track_metrics))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(CatchPanicLayer::custom(handle_panic));

        Router::new()
            .route("/validate", post(handlers::validate))
            .route("/status", get(handlers::cluster_status))
            .route("/stats", get(handlers::stats))
            .route("/health", get(handlers::liveness))
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(middleware)
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Returns after `shutdown` fires and in-flight requests and queued
    /// stats events have drained.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let stats_task = self
            .stats_worker
            .map(|worker| tokio::spawn(worker.run(shutdown.resubscribe())));

        if self.config.health_check.monitor_enabled {
            let monitor = HealthMonitor::new(self.health.clone(), self.config.health_check.clone());
            tokio::spawn(monitor.run(shutdown.resubscribe()));
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        if let Some(task) = stats_task {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Stats worker ended abnormally");
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(86400))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(detail = %detail, "Handler panicked");

    let mut response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new("Internal server error")),
    )
        .into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
