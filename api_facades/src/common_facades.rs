//! Common Facades
//!
//! Argument decoding and out-parameter encoding shared by the socket facades.
//! Every facade funnels through these helpers so raw pointers are checked in
//! one place before any safe code sees them.

use adapters_socket::{ErrorKind, OperationResult, SocketContext, SocketId};
use std::ffi::{c_char, c_int, CStr};
use tracing::warn;

/// Write `result` into the caller's out-parameters
///
/// Null out-pointers are skipped.
///
/// # Safety
///
/// Each non-null pointer must be valid for a write of one `c_int`.
pub(crate) unsafe fn write_result(
    result: OperationResult,
    out_success: *mut c_int,
    out_value: *mut c_int,
    out_error: *mut c_int,
) {
    let (success, value, error) = result.to_raw();
    if !out_success.is_null() {
        *out_success = success;
    }
    if !out_value.is_null() {
        *out_value = value;
    }
    if !out_error.is_null() {
        *out_error = error;
    }
}

/// Borrow a NUL-terminated UTF-8 host string
///
/// # Safety
///
/// `host` must be null or point to a NUL-terminated string that stays alive
/// for `'a`.
unsafe fn host_str<'a>(host: *const c_char) -> Option<&'a str> {
    if host.is_null() {
        return None;
    }
    CStr::from_ptr(host).to_str().ok()
}

/// Borrow `length` bytes starting at `data`
///
/// # Safety
///
/// When `length > 0`, `data` must be valid for reads of `length` bytes.
unsafe fn byte_slice<'a>(data: *const u8, length: c_int) -> Option<&'a [u8]> {
    let length = usize::try_from(length).ok()?;
    if length == 0 {
        return Some(&[]);
    }
    if data.is_null() {
        return None;
    }
    Some(std::slice::from_raw_parts(data, length))
}

/// Mutably borrow `length` bytes starting at `buffer`
///
/// # Safety
///
/// When `length > 0`, `buffer` must be valid for writes of `length` bytes and
/// not aliased for `'a`.
unsafe fn byte_slice_mut<'a>(buffer: *mut u8, length: c_int) -> Option<&'a mut [u8]> {
    let length = usize::try_from(length).ok()?;
    if length == 0 {
        return Some(&mut []);
    }
    if buffer.is_null() {
        return None;
    }
    Some(std::slice::from_raw_parts_mut(buffer, length))
}

/// Connect through `context` with raw C arguments
///
/// # Safety
///
/// See [`host_str`].
pub(crate) unsafe fn connect_with(
    context: &SocketContext,
    host: *const c_char,
    port: c_int,
    timeout_ms: c_int,
) -> OperationResult {
    match host_str(host) {
        Some(host) => context.connect(host, port, timeout_ms),
        None => {
            warn!("connect called with a null or non-UTF-8 host");
            OperationResult::failed(ErrorKind::Unknown)
        }
    }
}

/// Send through `context` with raw C arguments
///
/// An unknown identifier is reported before the buffer is examined.
///
/// # Safety
///
/// See [`byte_slice`].
pub(crate) unsafe fn send_with(
    context: &SocketContext,
    socket_id: SocketId,
    data: *const u8,
    length: c_int,
) -> OperationResult {
    if !context.is_open(socket_id) {
        return OperationResult::failed(ErrorKind::InvalidSocket);
    }
    match byte_slice(data, length) {
        Some(data) => context.send(socket_id, data),
        None => {
            warn!(socket_id, length, "send called with an invalid buffer");
            OperationResult::failed(ErrorKind::Unknown)
        }
    }
}

/// Receive through `context` with raw C arguments
///
/// An unknown identifier is reported before the buffer is examined.
///
/// # Safety
///
/// See [`byte_slice_mut`].
pub(crate) unsafe fn receive_with(
    context: &SocketContext,
    socket_id: SocketId,
    buffer: *mut u8,
    buffer_len: c_int,
    timeout_ms: c_int,
) -> OperationResult {
    if !context.is_open(socket_id) {
        return OperationResult::failed(ErrorKind::InvalidSocket);
    }
    match byte_slice_mut(buffer, buffer_len) {
        Some(buffer) => context.receive(socket_id, buffer, timeout_ms),
        None => {
            warn!(socket_id, buffer_len, "receive called with an invalid buffer");
            OperationResult::failed(ErrorKind::Unknown)
        }
    }
}
