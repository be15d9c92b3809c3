//! Socket Module
//!
//! Socket error types and the mapping from OS failures to the portable
//! [`ErrorKind`] taxonomy.

use entities_socket_handles::{ErrorKind, HandleTableError, SocketId};
use std::io;
use thiserror::Error;

/// Socket error types
///
/// Carries the underlying OS error where there is one, so logs keep the detail
/// that [`ErrorKind`] deliberately throws away.
#[derive(Debug, Error)]
pub enum SocketError {
    /// Network subsystem startup failed
    #[error("network subsystem startup failed with code {0}")]
    Startup(i32),
    /// Creating the OS socket failed
    #[error("failed to create socket: {0}")]
    Create(#[source] io::Error),
    /// Host is not a numeric IPv4 address
    #[error("invalid IPv4 address `{0}`")]
    InvalidAddress(String),
    /// Port outside 1-65535
    #[error("port {0} is outside 1-65535")]
    InvalidPort(i32),
    /// Switching blocking mode or setting a socket option failed
    #[error("failed to configure socket: {0}")]
    Configure(#[source] io::Error),
    /// Reading a socket property failed
    #[error("failed to query socket: {0}")]
    Query(#[source] io::Error),
    /// The connect call failed immediately
    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),
    /// The readiness wait itself failed
    #[error("readiness wait failed: {0}")]
    Poll(#[source] io::Error),
    /// The bounded wait expired before the socket became ready
    #[error("timed out")]
    Timeout,
    /// The socket signalled readiness with a pending error
    #[error("connection refused: {0}")]
    Refused(#[source] io::Error),
    /// The handle table has no free slot
    #[error("socket table is full ({capacity} active sockets)")]
    TableFull { capacity: usize },
    /// The identifier is not registered
    #[error("socket id {0} is not registered")]
    InvalidSocket(SocketId),
    /// Sending failed
    #[error("send failed: {0}")]
    Send(#[source] io::Error),
    /// Receiving failed
    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),
    /// The peer shut the stream down in an orderly way
    #[error("connection closed by peer")]
    Closed,
}

impl SocketError {
    /// Portable error kind reported to the caller
    pub fn kind(&self) -> ErrorKind {
        match self {
            SocketError::Connect(err) | SocketError::Send(err) => map_io_error(err),
            SocketError::Receive(err) => map_recv_error(err),
            SocketError::Timeout => ErrorKind::Timeout,
            SocketError::Refused(_) => ErrorKind::ConnectionRefused,
            SocketError::Closed => ErrorKind::Closed,
            SocketError::InvalidSocket(_) => ErrorKind::InvalidSocket,
            SocketError::Startup(_)
            | SocketError::Create(_)
            | SocketError::InvalidAddress(_)
            | SocketError::InvalidPort(_)
            | SocketError::Configure(_)
            | SocketError::Query(_)
            | SocketError::Poll(_)
            | SocketError::TableFull { .. } => ErrorKind::Unknown,
        }
    }
}

impl From<HandleTableError> for SocketError {
    fn from(err: HandleTableError) -> Self {
        match err {
            HandleTableError::TableFull { capacity } => SocketError::TableFull { capacity },
            HandleTableError::InvalidId(id) => SocketError::InvalidSocket(id),
        }
    }
}

/// Map an OS error from connect or send to an [`ErrorKind`]
///
/// - refused → `ConnectionRefused`
/// - timed out → `Timeout`
/// - reset, aborted or broken pipe → `Closed`
/// - anything else → `Unknown`
pub fn map_io_error(err: &io::Error) -> ErrorKind {
    match err.kind() {
        io::ErrorKind::ConnectionRefused => ErrorKind::ConnectionRefused,
        io::ErrorKind::TimedOut => ErrorKind::Timeout,
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => ErrorKind::Closed,
        _ => ErrorKind::Unknown,
    }
}

/// Map an OS error from a receive to an [`ErrorKind`]
///
/// An expired receive timeout surfaces as `EAGAIN`/`EWOULDBLOCK` on Unix, so
/// `WouldBlock` is reported as `Timeout` on a blocking socket.
pub fn map_recv_error(err: &io::Error) -> ErrorKind {
    match err.kind() {
        io::ErrorKind::WouldBlock => ErrorKind::Timeout,
        _ => map_io_error(err),
    }
}

/// Whether a non-blocking connect reported "operation in progress"
///
/// `EAGAIN` from `connect(2)` is an immediate failure on Unix, not a pending
/// connect.
#[cfg(unix)]
pub(crate) fn is_in_progress(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EINPROGRESS)
}

/// Whether a non-blocking connect reported "operation in progress"
///
/// Winsock reports a pending connect as `WSAEWOULDBLOCK`.
#[cfg(not(unix))]
pub(crate) fn is_in_progress(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
}
