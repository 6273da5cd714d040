//! Ephemeral static file server for a built site.
//!
//! The server binds a fresh loopback port for every batch and serves the site
//! directory exactly as the build wrote it. [`with_server`] scopes its
//! lifetime to one async body: the listener is shut down once the body
//! settles, whether it succeeded or not.

use std::{
    future::Future,
    io,
    net::{Ipv4Addr, SocketAddr},
    path::{Component, Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{
        HeaderValue, StatusCode, Uri,
        header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use percent_encoding::percent_decode_str;
use thiserror::Error;
use tokio::{fs, net::TcpListener, sync::oneshot, task::JoinHandle};
use tracing::{debug, error, info, warn};
use url::Url;

const INDEX_FILE: &str = "index.html";
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind static server")]
    Bind(#[source] io::Error),
    #[error("static server stopped with an error")]
    Serve(#[source] io::Error),
    #[error("static server task failed: {0}")]
    Task(String),
    #[error("invalid static server url")]
    Url(#[from] url::ParseError),
}

/// Running static server bound to an ephemeral loopback port.
///
/// Dropping the handle aborts the serving task; [`StaticServer::shutdown`]
/// stops it gracefully.
#[derive(Debug)]
pub struct StaticServer {
    base_url: Url,
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<io::Result<()>>,
}

impl StaticServer {
    /// Bind port 0 on the loopback interface and start serving `site_dir`.
    pub async fn start(site_dir: &Path) -> Result<Self, ServerError> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .map_err(ServerError::Bind)?;
        let local_addr = listener.local_addr().map_err(ServerError::Bind)?;
        let base_url = Url::parse(&format!("http://localhost:{}", local_addr.port()))?;

        let router = build_router(site_dir.to_path_buf());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        info!(
            target = "sitepdf::server",
            op = "server::start",
            addr = %local_addr,
            root = %site_dir.display(),
            "Static server listening"
        );

        Ok(Self {
            base_url,
            local_addr,
            shutdown: Some(shutdown_tx),
            task,
        })
    }

    /// `http://localhost:<port>`
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for the serving task to finish.
    ///
    /// Connections still open after the grace period are dropped with the
    /// task.
    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        let result = match tokio::time::timeout(SHUTDOWN_GRACE, &mut self.task).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(err))) => Err(ServerError::Serve(err)),
            Ok(Err(err)) => Err(ServerError::Task(err.to_string())),
            Err(_) => {
                warn!(
                    target = "sitepdf::server",
                    op = "server::shutdown",
                    addr = %self.local_addr,
                    grace_ms = SHUTDOWN_GRACE.as_millis() as u64,
                    "Static server did not drain in time; aborting"
                );
                self.task.abort();
                let _ = (&mut self.task).await;
                Ok(())
            }
        };

        debug!(
            target = "sitepdf::server",
            op = "server::shutdown",
            addr = %self.local_addr,
            "Static server closed"
        );
        result
    }
}

impl Drop for StaticServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Serve `site_dir` for the duration of `body`.
///
/// `body` receives the server's base URL. The server is closed after `body`
/// completes; a failure of `body` is returned as is, after the server has been
/// closed.
pub async fn with_server<F, Fut, T, E>(site_dir: &Path, body: F) -> Result<T, E>
where
    F: FnOnce(Url) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<ServerError>,
{
    let server = StaticServer::start(site_dir).await?;
    let outcome = body(server.base_url().clone()).await;
    let closed = server.shutdown().await;

    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => Err(err.into()),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            warn!(
                target = "sitepdf::server",
                op = "server::shutdown",
                error = %close_err,
                "Static server shutdown failed after body failure"
            );
            Err(err)
        }
    }
}

#[derive(Debug)]
struct SiteRoot {
    root: PathBuf,
}

fn build_router(root: PathBuf) -> Router {
    let state = Arc::new(SiteRoot { root });
    Router::new()
        .route("/", get(serve_static))
        .route("/{*path}", get(serve_static))
        .with_state(state)
}

async fn serve_static(State(site): State<Arc<SiteRoot>>, uri: Uri) -> Response {
    const SOURCE: &str = "infra::server::serve_static";

    let Some(relative) = resolve_request_path(uri.path()) else {
        debug!(target = SOURCE, path = %uri.path(), "Rejected request path");
        return StatusCode::NOT_FOUND.into_response();
    };
    let candidate = site.root.join(relative);

    match fs::metadata(&candidate).await {
        Ok(meta) if meta.is_dir() => {
            if uri.path().ends_with('/') {
                serve_file(&candidate.join(INDEX_FILE)).await
            } else {
                redirect_to_directory(&uri)
            }
        }
        Ok(_) => serve_file(&candidate).await,
        Err(err) => {
            debug!(
                target = SOURCE,
                path = %uri.path(),
                error = %err,
                "Static file not found"
            );
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

async fn serve_file(path: &Path) -> Response {
    const SOURCE: &str = "infra::server::serve_file";

    match fs::read(path).await {
        Ok(data) => build_file_response(path, Bytes::from(data)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!(
                target = SOURCE,
                path = %path.display(),
                error = %err,
                "failed to read static file"
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn build_file_response(path: &Path, bytes: Bytes) -> Response {
    let length = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&length.to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }

    response
}

fn redirect_to_directory(uri: &Uri) -> Response {
    let location = match uri.query() {
        Some(query) => format!("{}/?{query}", uri.path()),
        None => format!("{}/", uri.path()),
    };

    let mut response = StatusCode::MOVED_PERMANENTLY.into_response();
    if let Ok(value) = HeaderValue::from_str(&location) {
        response.headers_mut().insert(LOCATION, value);
    }
    response
}

/// Decode a request path into a path relative to the site root.
///
/// Returns `None` for undecodable paths and anything that could leave the
/// root.
fn resolve_request_path(request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
    let trimmed = decoded.trim_start_matches('/');
    if trimmed.contains('\0') {
        return None;
    }

    let relative = Path::new(trimmed);
    let escapes = relative.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return None;
    }

    Some(relative.to_path_buf())
}
