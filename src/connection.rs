//! Connection state machine.
//!
//! Each accepted socket is driven by one [`Connection`], which owns the
//! socket and its [`Accumulator`] exclusively:
//!
//! ```text
//!            read >= 1 byte             framer: incomplete
//! Reading ----------------------> Draining ------------------> Reading
//!   |  ^                            |  |
//!   |  +-- idle timeout (re-arm)    |  +-- complete: parse, dispatch,
//!   |                               |      write, consume, loop
//!   +-- EOF / read error --> Closed <-- framing/parse/write error
//! ```

use crate::buffer::Accumulator;
use crate::http::{frame, parse_request, Frame, FrameError, ParseError, Router};
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace, warn};

/// Current state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// Waiting for bytes, bounded by the idle timeout.
    Reading,
    /// Dispatching every complete request in the buffer.
    Draining,
    /// Terminal; the socket is released.
    Closed,
}

/// Why a connection was torn down.
#[derive(Debug)]
pub enum ConnectionError {
    Io(io::Error),
    Frame(FrameError),
    Parse(ParseError),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::Io(e) => write!(f, "I/O error: {e}"),
            ConnectionError::Frame(e) => write!(f, "framing error: {e}"),
            ConnectionError::Parse(e) => write!(f, "parse error: {e}"),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConnectionError::Io(e) => Some(e),
            ConnectionError::Frame(e) => Some(e),
            ConnectionError::Parse(e) => Some(e),
        }
    }
}

impl From<io::Error> for ConnectionError {
    fn from(e: io::Error) -> Self {
        ConnectionError::Io(e)
    }
}

impl From<FrameError> for ConnectionError {
    fn from(e: FrameError) -> Self {
        ConnectionError::Frame(e)
    }
}

impl From<ParseError> for ConnectionError {
    fn from(e: ParseError) -> Self {
        ConnectionError::Parse(e)
    }
}

/// A single client connection.
pub struct Connection<S> {
    stream: S,
    buffer: Accumulator,
    state: ConnState,
    router: Arc<Router>,
    read_timeout: Duration,
    /// Requests answered so far.
    served: u64,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a new connection in the initial reading state.
    pub fn new(stream: S, router: Arc<Router>, read_timeout: Duration) -> Self {
        Self {
            stream,
            buffer: Accumulator::new(),
            state: ConnState::Reading,
            router,
            read_timeout,
            served: 0,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> ConnState {
        self.state
    }

    /// Number of responses written.
    pub fn served(&self) -> u64 {
        self.served
    }

    /// Drive the connection until it closes.
    ///
    /// Returns `Ok(())` when the peer closes the stream and an error for
    /// any fatal I/O, framing, or parse failure. Either way the state is
    /// [`ConnState::Closed`] afterwards.
    pub async fn run(&mut self) -> Result<(), ConnectionError> {
        let result = self.run_inner().await;
        self.state = ConnState::Closed;
        result
    }

    async fn run_inner(&mut self) -> Result<(), ConnectionError> {
        loop {
            match self.state {
                ConnState::Reading => self.read().await?,
                ConnState::Draining => self.drain().await?,
                ConnState::Closed => return Ok(()),
            }
        }
    }

    /// One timed read; stays in `Reading` on idle timeout.
    async fn read(&mut self) -> Result<(), ConnectionError> {
        match tokio::time::timeout(self.read_timeout, self.buffer.fill(&mut self.stream)).await {
            Err(_elapsed) => {
                trace!(pending = self.buffer.len(), "Read timed out, re-arming");
            }
            Ok(Ok(0)) => {
                trace!(pending = self.buffer.len(), "Connection closed by client");
                self.state = ConnState::Closed;
            }
            Ok(Ok(n)) => {
                trace!(bytes = n, "Read");
                self.state = ConnState::Draining;
            }
            Ok(Err(e)) => return Err(e.into()),
        }
        Ok(())
    }

    /// Answer every complete request currently buffered, oldest first.
    async fn drain(&mut self) -> Result<(), ConnectionError> {
        loop {
            let framed = frame(self.buffer.as_slice())?;
            let (Frame::Complete { head_len, .. }, Some(total)) = (framed, framed.total_len())
            else {
                break;
            };

            let request = parse_request(self.buffer.consume(total), head_len)?;
            let response = self.router.dispatch(&request).await;

            debug!(
                method = %request.method,
                path = %request.path,
                version = %request.version,
                status = response.status.code(),
                "Request served"
            );

            self.stream.write_all(&response.encode()).await?;
            self.served += 1;
        }

        self.stream.flush().await?;
        self.state = ConnState::Reading;
        Ok(())
    }
}

/// Run a connection to completion, logging how it ended.
pub async fn handle_connection<S>(stream: S, router: Arc<Router>, read_timeout: Duration)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut conn = Connection::new(stream, router, read_timeout);

    match conn.run().await {
        Ok(()) => debug!(served = conn.served(), "Connection closed"),
        Err(ConnectionError::Io(e)) => {
            debug!(served = conn.served(), error = %e, "Connection error")
        }
        Err(e) => warn!(served = conn.served(), error = %e, "Closing connection"),
    }
}
