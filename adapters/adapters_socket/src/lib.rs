//! Adapters Layer: TCP Client Sockets
//!
//! Provides the blocking-with-timeout TCP client used by the flat C interface.
//! This crate implements socket operations with the `socket2` crate for safe,
//! cross-platform socket handling, and a small readiness wait over `poll(2)`
//! (`WSAPoll` on Windows) for timeout-bounded connects.
//!
//! ## Overview
//!
//! The `adapters_socket` crate provides:
//! - **Connect**: non-blocking connect with a readiness wait bounded by a timeout
//! - **Send / Receive**: single blocking calls that report partial transfers as-is
//! - **Close**: releases the OS socket through the handle table
//! - **Error mapping**: OS failures normalized into [`ErrorKind`]
//!
//! ## Architecture
//!
//! [`SocketContext`] owns a [`HandleTable`] of live sockets. Every operation
//! resolves its identifier through the table, performs one OS call and reports
//! an [`OperationResult`]. Contexts are independent; the C facade keeps one
//! process-wide default context and lets hosts create their own.
//!
//! ## See Also
//!
//! - [`entities_socket_handles`](../entities_socket_handles/index.html): handle table
//!   and error codes
//! - [`api_facades`](../api_facades/index.html): C function signatures
//!
//! [`HandleTable`]: entities_socket_handles::HandleTable

pub mod context;
pub mod platform;
pub mod readiness;
pub mod socket;
pub mod tcp;

pub use context::SocketContext;
pub use entities_socket_handles::{
    ErrorKind, HandleTableConfig, OperationResult, SocketId, DEFAULT_MAX_SOCKETS,
};
pub use readiness::Readiness;
pub use socket::{map_io_error, map_recv_error, SocketError};
