//! # Site Serve
//!
//! Serves a directory of pre-downloaded site content over HTTP for local
//! browsing.
//!
//! Every response carries `Cache-Control: no-store, no-cache, must-revalidate`
//! so edits to the files on disk show up on the next reload. Directories are
//! answered with their `index.html`, or with a generated listing when there
//! is none.
//!
//! ## Example
//!
//! ```no_run
//! use site_serve::{ServerConfig, serve};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::new("/srv/site", 8000);
//!     serve(&config).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod listing;

use std::{
    future::Future,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::{
    Router,
    http::{HeaderValue, header},
    routing::{MethodRouter, get},
};
use tokio::net::TcpListener;
use tower_http::{
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, error, info};

pub use config::{Args, DEFAULT_PORT, ServerConfig};
pub use error::ServeError;

/// Value forced onto the `Cache-Control` header of every response.
pub const NO_CACHE: &str = "no-store, no-cache, must-revalidate";

/// Builds the request handler for files under `root`.
///
/// Files are served by [`ServeDir`], directories without an `index.html`
/// fall through to [`listing::list_directory`], and the no-cache header is
/// set on whatever comes back.
pub fn router(root: impl Into<PathBuf>) -> Router {
    let root: Arc<Path> = Arc::from(root.into());

    let listing: MethodRouter = get(listing::list_directory).with_state(Arc::clone(&root));
    let files = ServeDir::new(&*root).fallback(listing);

    Router::new()
        .fallback_service(files)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(NO_CACHE),
        ))
}

/// Binds a TCP listener on `addr`. There is no retry on another port.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServeError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })
}

/// Runs the accept loop on `listener` until `shutdown` completes, then waits
/// for in-flight requests and returns.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    root: impl Into<PathBuf>,
    shutdown: F,
) -> Result<(), ServeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(root))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Starts the server described by `config` and blocks until Ctrl+C.
///
/// # Errors
///
/// Returns [`ServeError::Bind`] if the port cannot be bound, or
/// [`ServeError::Io`] if the accept loop fails.
pub async fn serve(config: &ServerConfig) -> Result<(), ServeError> {
    let listener = bind(config.bind_addr()).await?;
    info!(addr = %config.bind_addr(), root = %config.root.display(), "listening");
    println!("{}", banner(config));

    serve_with_shutdown(listener, config.root.clone(), shutdown_signal()).await?;

    println!("\nServer stopped");
    Ok(())
}

/// Completes when the process receives Ctrl+C.
pub async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// Startup text shown on the console.
pub fn banner(config: &ServerConfig) -> String {
    format!(
        "Local site server running\n  URL: http://localhost:{}\n  Dir: {}\nPress Ctrl+C to stop",
        config.port,
        config.root.display()
    )
}
