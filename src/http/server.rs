//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the rewrite handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Resolve identities and rewrite paths
//! - Serve rewritten paths from the document root
//! - Apply routing table updates from the config watcher

use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceExt;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ConfigError, DatabaseConfig, RouterConfig};
use crate::http::request::{self, MakeRequestUuidV4, X_REQUEST_ID};
use crate::http::response;
use crate::observability::metrics;
use crate::routing::rewriter::{is_directory, substitute_prefix};
use crate::routing::{resolve_within, rewrite, RewriteDecision, RoutingTable};
use crate::store::MembershipStore;

/// Application state injected into handlers.
pub struct AppState<S> {
    pub table: Arc<ArcSwap<RoutingTable>>,
    pub store: Arc<S>,
    pub resolve_timeout: Duration,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            store: self.store.clone(),
            resolve_timeout: self.resolve_timeout,
        }
    }
}

/// HTTP server for the identity router.
pub struct HttpServer {
    router: Router,
    config: RouterConfig,
    table: Arc<ArcSwap<RoutingTable>>,
}

impl HttpServer {
    /// Create a new HTTP server resolving identities against `store`.
    pub fn new<S: MembershipStore>(config: RouterConfig, store: Arc<S>) -> Result<Self, ConfigError> {
        let table = RoutingTable::from_config(&config.rewrite).map_err(ConfigError::Validation)?;
        let table = Arc::new(ArcSwap::from_pointee(table));

        let state = AppState {
            table: table.clone(),
            store,
            resolve_timeout: Duration::from_millis(config.timeouts.resolve_ms),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            table,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router<S: MembershipStore>(config: &RouterConfig, state: AppState<S>) -> Router {
        Router::new()
            .route("/{*path}", any(rewrite_handler::<S>))
            .route("/", any(rewrite_handler::<S>))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configuration updates received on `config_updates` replace the routing
    /// table for subsequent requests. Returns once `shutdown` fires and
    /// in-flight requests have drained.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<RouterConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            location = %self.table.load().location,
            rules = self.table.load().rules.len(),
            "HTTP server starting"
        );

        let table = self.table.clone();
        let database = self.config.database.clone();
        let mut reload_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(new_config) => apply_update(&table, &database, &new_config),
                        None => break,
                    },
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Snapshot of the routing table currently in effect.
    pub fn routing_table(&self) -> Arc<RoutingTable> {
        self.table.load_full()
    }
}

/// Swap in the routing table from a reloaded configuration.
fn apply_update(table: &ArcSwap<RoutingTable>, database: &DatabaseConfig, config: &RouterConfig) {
    if config.database != *database {
        tracing::warn!("Database settings changed; they take effect after a restart");
    }

    match RoutingTable::from_config(&config.rewrite) {
        Ok(new_table) => {
            tracing::info!(
                location = %new_table.location,
                rules = new_table.rules.len(),
                "Routing table reloaded"
            );
            table.store(Arc::new(new_table));
        }
        Err(errors) => {
            for error in errors {
                tracing::error!(error = %error, "Rejected routing table update");
            }
        }
    }
}

/// Main handler.
/// Resolves the identity, then redirects or serves the rewritten path.
async fn rewrite_handler<S: MembershipStore>(
    State(state): State<AppState<S>>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request::request_id(request.headers());
    let table = state.table.load_full();
    let path = request.uri().path().to_string();

    // 1. Boundary checks
    if !table.covers(&path) {
        tracing::warn!(
            request_id = %request_id,
            path = %path,
            location = %table.location,
            "Request outside virtual location"
        );
        metrics::record_request(404, "outside_location", start_time);
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }

    let Some(identity) = request::identity(request.headers(), &table.identity_header) else {
        tracing::warn!(
            request_id = %request_id,
            header = %table.identity_header,
            "Request carries no authenticated identity"
        );
        metrics::record_request(401, "unauthenticated", start_time);
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    };

    // 2. Resolve
    let resolution = match resolve_within(
        state.store.as_ref(),
        &identity,
        &table.rules,
        state.resolve_timeout,
    )
    .await
    {
        Ok(resolution) => resolution,
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                identity = %identity,
                error = %e,
                "Identity resolution failed"
            );
            metrics::record_resolution("error");
            let response = response::resolve_error(&e);
            metrics::record_request(response.status().as_u16(), "error", start_time);
            return response;
        }
    };
    metrics::record_resolution(resolution.label());

    // 3. Rewrite
    let destination = resolution.destination_or(&table.default_destination);
    let candidate = substitute_prefix(&path, &table.location, destination);
    let is_dir = is_directory(&table.document_root, &candidate).await;

    match rewrite(&path, &table.location, destination, is_dir) {
        RewriteDecision::ClientRedirect(target) => {
            let location = response::with_query(&target, request.uri().query());
            tracing::debug!(
                request_id = %request_id,
                identity = %identity,
                location = %location,
                "Directory without trailing slash, redirecting"
            );
            metrics::record_request(301, "redirect", start_time);
            response::permanent_redirect(&location)
        }
        RewriteDecision::InternalRewrite(new_path) => {
            let target = response::with_query(&new_path, request.uri().query());
            let uri = match target.parse::<Uri>() {
                Ok(uri) => uri,
                Err(e) => {
                    tracing::error!(
                        request_id = %request_id,
                        target = %target,
                        error = %e,
                        "Rewritten path is not a valid URI"
                    );
                    metrics::record_request(500, "error", start_time);
                    return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
                        .into_response();
                }
            };

            tracing::debug!(
                request_id = %request_id,
                identity = %identity,
                resolution = resolution.label(),
                from = %path,
                to = %new_path,
                "Rewriting request"
            );

            let (mut parts, body) = request.into_parts();
            parts.uri = uri;
            let response = serve_file(&table, Request::from_parts(parts, body)).await;
            metrics::record_request(response.status().as_u16(), "rewrite", start_time);
            response
        }
    }
}

/// Hand a rewritten request to the static file service.
async fn serve_file(table: &RoutingTable, request: Request<Body>) -> Response {
    let result: Result<_, Infallible> = ServeDir::new(&table.document_root).oneshot(request).await;
    match result {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}
