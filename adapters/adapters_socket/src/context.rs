//! Socket Context Module
//!
//! Provides [`SocketContext`], an explicit owner for a handle table of open
//! TCP connections. Each operation resolves its identifier through the table,
//! performs one OS call from [`crate::tcp`] and reports an
//! [`OperationResult`].

use crate::socket::SocketError;
use crate::tcp;
use entities_socket_handles::{HandleTable, HandleTableConfig, OperationResult, SocketId};
use socket2::Socket;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Socket context
///
/// Owns every socket it connected. Dropping the context closes them all.
///
/// The table sits behind a mutex that is only held for bookkeeping, never
/// across a blocking OS call: operations clone the socket's `Arc` and release
/// the lock before connecting, sending or receiving. Operations on one
/// identifier are still expected to be issued sequentially by the caller.
pub struct SocketContext {
    table: Mutex<HandleTable<Arc<Socket>>>,
}

impl SocketContext {
    /// Create a context with the default capacity of 256 sockets
    pub fn new() -> Self {
        Self::with_config(HandleTableConfig::default())
    }

    /// Create a context with a custom configuration
    pub fn with_config(config: HandleTableConfig) -> Self {
        Self {
            table: Mutex::new(HandleTable::with_config(config)),
        }
    }

    fn table(&self) -> MutexGuard<'_, HandleTable<Arc<Socket>>> {
        // The table holds no invariant a panicking holder could break halfway.
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, id: SocketId) -> Result<Arc<Socket>, SocketError> {
        let table = self.table();
        let socket = table.get(id)?;
        Ok(Arc::clone(socket))
    }

    /// Connect to `host:port`
    ///
    /// # Arguments
    ///
    /// * `host` - Numeric IPv4 address, e.g. `"127.0.0.1"`
    /// * `port` - Destination port, 1-65535
    /// * `timeout_ms` - Connect timeout; `0` waits indefinitely
    ///
    /// # Returns
    ///
    /// `{true, id, None}` on success. On failure the socket created for the
    /// attempt has already been closed.
    pub fn connect(&self, host: &str, port: i32, timeout_ms: i32) -> OperationResult {
        outcome("connect", self.try_connect(host, port, timeout_ms))
    }

    /// Connect, reporting the full error
    pub fn try_connect(
        &self,
        host: &str,
        port: i32,
        timeout_ms: i32,
    ) -> Result<SocketId, SocketError> {
        let addr = tcp::parse_destination(host, port)?;
        let socket = tcp::connect(addr, tcp::timeout_from_ms(timeout_ms))?;

        let registered = self.table().allocate(Arc::new(socket));
        match registered {
            Ok(id) => {
                debug!(id, %addr, "socket opened");
                Ok(id)
            }
            Err(rejected) => {
                let reason = rejected.reason();
                drop(rejected.into_descriptor());
                Err(reason.into())
            }
        }
    }

    /// Send up to `data.len()` bytes on `id`
    ///
    /// Returns `{true, bytes_sent, None}`; a partial send is not retried.
    pub fn send(&self, id: SocketId, data: &[u8]) -> OperationResult {
        outcome("send", self.try_send(id, data).map(byte_count))
    }

    /// Send, reporting the full error
    pub fn try_send(&self, id: SocketId, data: &[u8]) -> Result<usize, SocketError> {
        let socket = self.resolve(id)?;
        tcp::send(&socket, data)
    }

    /// Receive up to `buf.len()` bytes on `id`
    ///
    /// A positive `timeout_ms` becomes the socket's persistent receive timeout.
    /// An orderly shutdown by the peer reports `{false, 0, Closed}`.
    pub fn receive(&self, id: SocketId, buf: &mut [u8], timeout_ms: i32) -> OperationResult {
        outcome("receive", self.try_receive(id, buf, timeout_ms).map(byte_count))
    }

    /// Receive, reporting the full error
    pub fn try_receive(
        &self,
        id: SocketId,
        buf: &mut [u8],
        timeout_ms: i32,
    ) -> Result<usize, SocketError> {
        let socket = self.resolve(id)?;
        tcp::receive(&socket, buf, tcp::timeout_from_ms(timeout_ms))
    }

    /// Close `id`
    ///
    /// Closing an identifier that is not open reports `InvalidSocket`, so a
    /// second close of the same identifier fails.
    pub fn close(&self, id: SocketId) -> OperationResult {
        outcome("close", self.try_close(id).map(|()| 0))
    }

    /// Close, reporting the full error
    pub fn try_close(&self, id: SocketId) -> Result<(), SocketError> {
        let socket = self
            .table()
            .take(id)
            .ok_or(SocketError::InvalidSocket(id))?;
        drop(socket);
        debug!(id, "socket closed");
        Ok(())
    }

    /// Close every open socket
    ///
    /// # Returns
    /// Number of sockets closed
    pub fn close_all(&self) -> usize {
        let closed = self.table().clear();
        if closed > 0 {
            debug!(closed, "closed all sockets");
        }
        closed
    }

    /// Whether `id` refers to an open socket
    pub fn is_open(&self, id: SocketId) -> bool {
        self.table().contains(id)
    }

    /// Number of open sockets
    pub fn active_count(&self) -> usize {
        self.table().active_count()
    }

    /// Maximum number of simultaneously open sockets
    pub fn capacity(&self) -> usize {
        self.table().capacity()
    }

    /// Identifiers of all open sockets
    pub fn open_ids(&self) -> Vec<SocketId> {
        self.table().ids()
    }

    /// Remote address of `id`
    pub fn peer_addr(&self, id: SocketId) -> Result<SocketAddr, SocketError> {
        let socket = self.resolve(id)?;
        let addr = socket.peer_addr().map_err(SocketError::Query)?;
        addr.as_socket()
            .ok_or_else(|| SocketError::InvalidAddress(format!("{addr:?}")))
    }

    /// Local address of `id`
    pub fn local_addr(&self, id: SocketId) -> Result<SocketAddr, SocketError> {
        let socket = self.resolve(id)?;
        let addr = socket.local_addr().map_err(SocketError::Query)?;
        addr.as_socket()
            .ok_or_else(|| SocketError::InvalidAddress(format!("{addr:?}")))
    }
}

impl Default for SocketContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SocketContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table();
        f.debug_struct("SocketContext")
            .field("active", &table.active_count())
            .field("capacity", &table.capacity())
            .finish()
    }
}

/// Fold a typed result into the operation triple, logging failures
fn outcome(operation: &'static str, result: Result<i32, SocketError>) -> OperationResult {
    match result {
        Ok(value) => OperationResult::ok(value),
        Err(err) => {
            let kind = err.kind();
            warn!(operation, error = %err, code = kind.code(), "socket operation failed");
            OperationResult::failed(kind)
        }
    }
}

/// Byte counts cross the C boundary as `int`
fn byte_count(bytes: usize) -> i32 {
    i32::try_from(bytes).unwrap_or(i32::MAX)
}
