//! Entities Layer: Socket Handles
//!
//! Provides the portable data model shared by every layer of the TCP client:
//! the socket handle table, the error-code taxonomy that crosses the C boundary,
//! and the uniform operation result triple.
//!
//! ## Overview
//!
//! - **[`handle_table`]**: registry mapping opaque integer identifiers to live
//!   OS socket descriptors
//! - **[`error_kind`]**: the six-value error enumeration with its fixed wire codes
//! - **[`operation_result`]**: the `(success, value, error)` triple returned by
//!   every socket operation
//!
//! ## Architecture
//!
//! This crate has no OS dependencies. The descriptor type stored in the table is
//! generic; the adapters layer instantiates it with real sockets, and releasing a
//! slot drops (and therefore closes) the descriptor.
//!
//! ## See Also
//!
//! - [`adapters_socket`](../adapters_socket/index.html): OS socket operations
//! - [`api_facades`](../api_facades/index.html): flat C interface

pub mod error_kind;
pub mod handle_table;
pub mod operation_result;

pub use error_kind::{ErrorKind, UnknownErrorCode};
pub use handle_table::{
    HandleTable, HandleTableConfig, HandleTableError, Rejected, SocketId, DEFAULT_MAX_SOCKETS,
};
pub use operation_result::OperationResult;
