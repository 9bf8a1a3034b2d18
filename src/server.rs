//! TCP server for handling HTTP connections.
//!
//! Accepts incoming connections and hands each one to its own task, which
//! owns the socket until the connection closes. A semaphore caps the
//! number of connections served at once.

use crate::config::Config;
use crate::connection::handle_connection;
use crate::http::Router;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, info_span, Instrument};

/// Listen backlog passed to `listen(2)`.
const BACKLOG: i32 = 1024;

/// Server instance
pub struct Server {
    config: Config,
    router: Arc<Router>,
    connection_limit: Arc<Semaphore>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        let router = Arc::new(Router::new(config.directory.clone()));
        let connection_limit = Arc::new(Semaphore::new(config.max_connections));

        Server {
            config,
            router,
            connection_limit,
        }
    }

    /// Bind the configured listen address.
    pub fn bind(&self) -> io::Result<TcpListener> {
        let addr: SocketAddr = self
            .config
            .listen
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        TcpListener::from_std(create_listener(addr)?)
    }

    /// Bind and begin accepting connections
    pub async fn run(&self) -> io::Result<()> {
        let listener = self.bind()?;
        self.serve(listener).await
    }

    /// Accept connections on `listener` until the process stops.
    ///
    /// Failures on one connection are contained in that connection's task;
    /// accept errors are logged and the loop carries on.
    pub async fn serve(&self, listener: TcpListener) -> io::Result<()> {
        info!(
            address = %listener.local_addr()?,
            directory = ?self.config.directory,
            max_connections = self.config.max_connections,
            read_timeout_ms = self.config.read_timeout.as_millis() as u64,
            "Server listening"
        );

        loop {
            // Wait for a connection slot
            let permit = match self.connection_limit.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return Ok(()),
            };

            match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!(peer = %addr, "New connection");

                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(peer = %addr, error = %e, "Failed to set TCP_NODELAY");
                    }

                    let router = Arc::clone(&self.router);
                    let read_timeout = self.config.read_timeout;
                    let span = info_span!("connection", peer = %addr);

                    tokio::spawn(
                        async move {
                            handle_connection(stream, router, read_timeout).await;
                            drop(permit);
                        }
                        .instrument(span),
                    );
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}

/// Create a non-blocking listening socket with `SO_REUSEADDR`.
fn create_listener(addr: SocketAddr) -> io::Result<std::net::TcpListener> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(BACKLOG)?;

    Ok(socket.into())
}
