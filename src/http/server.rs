//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, body limit, server header)
//! - Run the accept loop and spawn one connection actor per socket
//! - Route upgrade requests to push channels, `GET`/`HEAD` to static files
//!   and `POST /api/count` to job submission

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ws::WebSocketUpgrade, FromRequestParts, Request, State},
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::channel::run_session;
use crate::config::{ResolvedPaths, ServerConfig};
use crate::http::connection::HttpConnection;
use crate::http::files::serve_file;
use crate::http::jobs::{self, JOB_PATH};
use crate::http::request::is_websocket_upgrade;
use crate::http::response::{bad_request, UNSUPPORTED};
use crate::lifecycle::Shutdown;
use crate::net::{ActorKind, ConnectionTracker, Listener, ListenerError};
use crate::registry::Registry;

/// Value of the `Server` response header.
const SERVER_NAME: &str = concat!("chcount-server/", env!("CARGO_PKG_VERSION"));

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub tracker: ConnectionTracker,
    pub shutdown: Shutdown,
    pub config: Arc<ServerConfig>,
}

/// HTTP server: acceptor plus per-connection actors.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig, paths: ResolvedPaths, shutdown: Shutdown) -> Self {
        let state = AppState {
            registry: Arc::new(Registry::new(paths)),
            tracker: ConnectionTracker::new(),
            shutdown,
            config: Arc::new(config),
        };

        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let body_limit = state.config.http.body_limit_bytes;

        Router::new()
            .route(JOB_PATH, post(jobs::submit).fallback(route_request))
            .fallback(route_request)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(SetResponseHeaderLayer::if_not_present(
                        header::SERVER,
                        HeaderValue::from_static(SERVER_NAME),
                    ))
                    .layer(DefaultBodyLimit::disable())
                    .layer(RequestBodyLimitLayer::new(body_limit)),
            )
    }

    /// Run the acceptor until shutdown or a fatal accept error.
    ///
    /// Connection actors spawned here outlive this call; use
    /// [`ConnectionTracker::wait_for_drain`] to wait for them.
    pub async fn run(self, listener: Listener) -> Result<(), ListenerError> {
        let addr = listener.local_addr().map_err(ListenerError::Accept)?;
        tracing::info!(address = %addr, "HTTP server starting");

        let idle_timeout = Duration::from_secs(self.state.config.http.idle_timeout_secs);
        let Self { router, state } = self;

        listener
            .serve(state.shutdown.subscribe(), |stream, peer, permit| {
                let connection = HttpConnection {
                    stream,
                    peer,
                    permit,
                    guard: state.tracker.track(ActorKind::Http),
                };
                tokio::spawn(connection.serve(
                    router.clone(),
                    idle_timeout,
                    state.shutdown.subscribe(),
                ));
            })
            .await?;

        tracing::info!("HTTP server stopped accepting");
        Ok(())
    }

    /// Shared state (registry, tracker, config).
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Everything except job submission: upgrades, static files, or 400.
async fn route_request(State(state): State<AppState>, request: Request) -> Response {
    let (mut parts, _body) = request.into_parts();

    if is_websocket_upgrade(&parts.method, &parts.headers) {
        return match WebSocketUpgrade::from_request_parts(&mut parts, &state).await {
            Ok(ws) => open_channel(ws, state),
            Err(rejection) => rejection.into_response(),
        };
    }

    match parts.method {
        Method::GET | Method::HEAD => {
            serve_file(state.registry.docs_root(), &parts.method, parts.uri.path()).await
        }
        _ => bad_request(UNSUPPORTED),
    }
}

/// Complete the WebSocket handshake and hand the socket to a channel session.
fn open_channel(ws: WebSocketUpgrade, state: AppState) -> Response {
    ws.on_failed_upgrade(|e| tracing::warn!(error = %e, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| {
            let guard = state.tracker.track(ActorKind::Channel);
            run_session(socket, state.registry, state.shutdown.subscribe(), guard)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{self, StatusCode};
    use tower::ServiceExt;

    fn server(dir: &std::path::Path) -> HttpServer {
        server_with(dir, ServerConfig::default())
    }

    fn server_with(dir: &std::path::Path, config: ServerConfig) -> HttpServer {
        let paths = ResolvedPaths {
            docs: dir.to_path_buf(),
            tmp_storage: dir.to_path_buf(),
            worker_executable: dir.join("worker"),
        };
        HttpServer::new(config, paths, Shutdown::new())
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn unknown_id_is_rejected_without_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());

        let request = http::Request::post(JOB_PATH)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(format!(
                r#"{{"id":"{}","data":"aaa"}}"#,
                uuid::Uuid::new_v4()
            )))
            .unwrap();

        let response = server.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Unknown id");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(server.state().tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn wrong_content_type_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());

        let request = http::Request::post(JOB_PATH)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("{}"))
            .unwrap();
        let response = server.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, UNSUPPORTED);

        let request = http::Request::delete("/index.html").body(Body::empty()).unwrap();
        let response = server.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, UNSUPPORTED);
    }

    #[tokio::test]
    async fn malformed_body_reports_reason() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());

        let request = http::Request::post(JOB_PATH)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = server.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_text(response).await,
            "Request body is not in valid json format"
        );
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());

        let request = http::Request::post(JOB_PATH)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(vec![b' '; 20_001]))
            .unwrap();
        let response = server.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn stalled_body_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig::default();
        config.http.idle_timeout_secs = 1;
        let server = server_with(dir.path(), config);

        let stalled = futures_util::stream::pending::<Result<axum::body::Bytes, std::io::Error>>();
        let request = http::Request::post(JOB_PATH)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from_stream(stalled))
            .unwrap();

        let response = tokio::time::timeout(
            Duration::from_secs(5),
            server.router.clone().oneshot(request),
        )
        .await
        .expect("handler waited on the body past the idle timeout")
        .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(response.headers()[header::CONNECTION], "close");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn get_serves_docs_and_sets_headers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>hi</h1>").unwrap();
        let server = server(dir.path());

        let request = http::Request::get("/").body(Body::empty()).unwrap();
        let response = server.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
        assert_eq!(response.headers()[header::SERVER], SERVER_NAME);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_text(response).await, "<h1>hi</h1>");
    }

    #[tokio::test]
    async fn get_on_job_path_falls_through_to_files() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());

        let request = http::Request::get(JOB_PATH).body(Body::empty()).unwrap();
        let response = server.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
