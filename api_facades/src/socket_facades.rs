//! Socket Facades
//!
//! Provides the flat C interface for TCP client sockets: connect, send,
//! receive and close. Each function reports its outcome through three `int`
//! out-parameters: a success flag (`0`/`1`), a value (socket id or byte
//! count) and an error code.
//!
//! ## Error Codes
//!
//! | Code | Meaning            |
//! |------|--------------------|
//! | 0    | none               |
//! | 1    | connection refused |
//! | 2    | timeout            |
//! | 3    | closed             |
//! | 4    | invalid socket     |
//! | 5    | unknown            |
//!
//! ## Examples
//!
//! ```c
//! int ok, id, err, n;
//! tcp_socket_connect("127.0.0.1", 8080, 500, &ok, &id, &err);
//! if (ok) {
//!     tcp_socket_send(id, (const unsigned char*)"PING", 4, &ok, &n, &err);
//!     tcp_socket_close(id, &ok, &n, &err);
//! }
//! ```
//!
//! These functions share one process-wide [`SocketContext`]. Hosts that want
//! isolated socket tables use the `tcp_context_*` family in
//! [`context_facades`](super::context_facades) instead.

use crate::common_facades::{connect_with, receive_with, send_with, write_result};
use adapters_socket::SocketContext;
use std::ffi::{c_char, c_int};
use std::sync::OnceLock;

static DEFAULT_CONTEXT: OnceLock<SocketContext> = OnceLock::new();

/// Get the process-wide socket context used by the `tcp_socket_*` functions
pub fn default_context() -> &'static SocketContext {
    DEFAULT_CONTEXT.get_or_init(SocketContext::new)
}

/// Connect to a TCP server
///
/// # Arguments
///
/// * `host` - NUL-terminated numeric IPv4 address, e.g. `"127.0.0.1"`
/// * `port` - Destination port, 1-65535
/// * `timeout_ms` - Connect timeout in milliseconds; `0` waits indefinitely
/// * `out_success`, `out_value`, `out_error` - Outcome; `out_value` receives
///   the new socket id
///
/// # Safety
///
/// `host` must be null or a valid NUL-terminated string. Each out-pointer must
/// be null or valid for writing one `int`.
#[no_mangle]
pub unsafe extern "C" fn tcp_socket_connect(
    host: *const c_char,
    port: c_int,
    timeout_ms: c_int,
    out_success: *mut c_int,
    out_value: *mut c_int,
    out_error: *mut c_int,
) {
    let result = connect_with(default_context(), host, port, timeout_ms);
    write_result(result, out_success, out_value, out_error);
}

/// Send bytes on an open socket
///
/// Performs a single send; `out_value` receives the number of bytes actually
/// sent, which may be less than `length`.
///
/// # Safety
///
/// `data` must be valid for reading `length` bytes. Each out-pointer must be
/// null or valid for writing one `int`.
#[no_mangle]
pub unsafe extern "C" fn tcp_socket_send(
    socket_id: c_int,
    data: *const u8,
    length: c_int,
    out_success: *mut c_int,
    out_value: *mut c_int,
    out_error: *mut c_int,
) {
    let result = send_with(default_context(), socket_id, data, length);
    write_result(result, out_success, out_value, out_error);
}

/// Receive bytes from an open socket
///
/// Performs a single receive of at most `buffer_len` bytes. A positive
/// `timeout_ms` becomes the socket's receive timeout and stays in effect for
/// later calls. An orderly shutdown by the peer reports error code 3.
///
/// # Safety
///
/// `buffer` must be valid for writing `buffer_len` bytes. Each out-pointer
/// must be null or valid for writing one `int`.
#[no_mangle]
pub unsafe extern "C" fn tcp_socket_receive(
    socket_id: c_int,
    buffer: *mut u8,
    buffer_len: c_int,
    timeout_ms: c_int,
    out_success: *mut c_int,
    out_value: *mut c_int,
    out_error: *mut c_int,
) {
    let result = receive_with(default_context(), socket_id, buffer, buffer_len, timeout_ms);
    write_result(result, out_success, out_value, out_error);
}

/// Close an open socket
///
/// Closing an id that is not open reports error code 4.
///
/// # Safety
///
/// Each out-pointer must be null or valid for writing one `int`.
#[no_mangle]
pub unsafe extern "C" fn tcp_socket_close(
    socket_id: c_int,
    out_success: *mut c_int,
    out_value: *mut c_int,
    out_error: *mut c_int,
) {
    let result = default_context().close(socket_id);
    write_result(result, out_success, out_value, out_error);
}
