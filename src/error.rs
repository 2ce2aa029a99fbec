//! Errors raised while starting or running the server.

use std::{io, net::SocketAddr};

/// Startup and accept-loop failures. Per-request failures never reach this
/// type; they are answered with an HTTP status instead.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("cannot determine the directory to serve")]
    RootDirectory(#[source] io::Error),
    #[error("cannot bind to {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("server error")]
    Io(#[from] io::Error),
}
