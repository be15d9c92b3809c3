//! Context Facades
//!
//! C interface for hosts that manage their own socket tables. A context is
//! created with [`tcp_context_new`], passed as the first argument to every
//! `tcp_context_*` operation and released with [`tcp_context_free`], which
//! closes every socket it still owns.
//!
//! Identifiers are scoped to the context that issued them.

use crate::common_facades::{connect_with, receive_with, send_with, write_result};
use adapters_socket::SocketContext;
use entities_socket_handles::{ErrorKind, HandleTableConfig, OperationResult};
use std::ffi::{c_char, c_int};
use tracing::debug;

/// Create a socket context
///
/// # Arguments
///
/// * `max_sockets` - Maximum simultaneously open sockets; `<= 0` selects the
///   default of 256
///
/// # Returns
///
/// Owned pointer to release with [`tcp_context_free`]
#[no_mangle]
pub extern "C" fn tcp_context_new(max_sockets: c_int) -> *mut SocketContext {
    let max_sockets = usize::try_from(max_sockets).unwrap_or(0);
    let context = SocketContext::with_config(HandleTableConfig::with_max_sockets(max_sockets));
    debug!(capacity = context.capacity(), "socket context created");
    Box::into_raw(Box::new(context))
}

/// Release a socket context, closing its open sockets
///
/// # Safety
///
/// `context` must be null or a pointer returned by [`tcp_context_new`] that
/// has not already been freed.
#[no_mangle]
pub unsafe extern "C" fn tcp_context_free(context: *mut SocketContext) {
    if context.is_null() {
        return;
    }
    let context = Box::from_raw(context);
    let closed = context.close_all();
    debug!(closed, "socket context freed");
}

/// Connect through `context`; see `tcp_socket_connect`
///
/// # Safety
///
/// `context` must be null or a live pointer from [`tcp_context_new`]. `host`
/// must be null or a NUL-terminated string. Out-pointers must be null or
/// writable.
#[no_mangle]
pub unsafe extern "C" fn tcp_context_connect(
    context: *const SocketContext,
    host: *const c_char,
    port: c_int,
    timeout_ms: c_int,
    out_success: *mut c_int,
    out_value: *mut c_int,
    out_error: *mut c_int,
) {
    let result = match context.as_ref() {
        Some(context) => connect_with(context, host, port, timeout_ms),
        None => OperationResult::failed(ErrorKind::Unknown),
    };
    write_result(result, out_success, out_value, out_error);
}

/// Send through `context`; see `tcp_socket_send`
///
/// # Safety
///
/// `context` must be null or a live pointer from [`tcp_context_new`]. `data`
/// must be valid for reading `length` bytes. Out-pointers must be null or
/// writable.
#[no_mangle]
pub unsafe extern "C" fn tcp_context_send(
    context: *const SocketContext,
    socket_id: c_int,
    data: *const u8,
    length: c_int,
    out_success: *mut c_int,
    out_value: *mut c_int,
    out_error: *mut c_int,
) {
    let result = match context.as_ref() {
        Some(context) => send_with(context, socket_id, data, length),
        None => OperationResult::failed(ErrorKind::Unknown),
    };
    write_result(result, out_success, out_value, out_error);
}

/// Receive through `context`; see `tcp_socket_receive`
///
/// # Safety
///
/// `context` must be null or a live pointer from [`tcp_context_new`].
/// `buffer` must be valid for writing `buffer_len` bytes. Out-pointers must be
/// null or writable.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn tcp_context_receive(
    context: *const SocketContext,
    socket_id: c_int,
    buffer: *mut u8,
    buffer_len: c_int,
    timeout_ms: c_int,
    out_success: *mut c_int,
    out_value: *mut c_int,
    out_error: *mut c_int,
) {
    let result = match context.as_ref() {
        Some(context) => receive_with(context, socket_id, buffer, buffer_len, timeout_ms),
        None => OperationResult::failed(ErrorKind::Unknown),
    };
    write_result(result, out_success, out_value, out_error);
}

/// Close a socket owned by `context`; see `tcp_socket_close`
///
/// # Safety
///
/// `context` must be null or a live pointer from [`tcp_context_new`].
/// Out-pointers must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn tcp_context_close(
    context: *const SocketContext,
    socket_id: c_int,
    out_success: *mut c_int,
    out_value: *mut c_int,
    out_error: *mut c_int,
) {
    let result = match context.as_ref() {
        Some(context) => context.close(socket_id),
        None => OperationResult::failed(ErrorKind::Unknown),
    };
    write_result(result, out_success, out_value, out_error);
}
