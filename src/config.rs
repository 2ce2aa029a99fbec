//! Command-line configuration for the server.

use std::{
    env,
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use clap::Parser;

use crate::error::ServeError;

/// Port used when none is given on the command line.
pub const DEFAULT_PORT: u16 = 8000;

/// Serves the directory containing this executable over HTTP with caching disabled.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(version, about)]
pub struct Args {
    /// Port to listen on (1-65535).
    #[arg(value_parser = clap::value_parser!(u16).range(1..), default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

/// Settings fixed at startup and shared read-only by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Directory all request paths are resolved against.
    pub root: PathBuf,
    /// TCP port the listener binds on every interface.
    pub port: u16,
}

impl ServerConfig {
    pub fn new(root: impl Into<PathBuf>, port: u16) -> Self {
        Self {
            root: root.into(),
            port,
        }
    }

    /// Builds the configuration from parsed arguments, rooted at the
    /// directory that holds the running executable.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError::RootDirectory`] if the executable path cannot be
    /// determined or has no parent directory.
    pub fn from_args(args: &Args) -> Result<Self, ServeError> {
        Ok(Self::new(executable_dir()?, args.port))
    }

    /// Address the listener binds: all interfaces on the configured port.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

/// Returns the canonical directory containing the current executable.
pub fn executable_dir() -> Result<PathBuf, ServeError> {
    let exe = env::current_exe().map_err(ServeError::RootDirectory)?;
    let exe = exe.canonicalize().unwrap_or(exe);
    exe.parent().map(PathBuf::from).ok_or_else(|| {
        ServeError::RootDirectory(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} has no parent directory", exe.display()),
        ))
    })
}
