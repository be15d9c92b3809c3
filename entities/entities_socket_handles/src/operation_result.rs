//! Operation Result Module
//!
//! The uniform `(success, value, error)` shape returned by connect, send,
//! receive and close.

use crate::error_kind::ErrorKind;

/// Outcome of a socket operation
///
/// `value` carries the new identifier (connect), the number of bytes
/// transferred (send/receive), or `0` (close and every failure).
///
/// Exactly one of two states ever holds: `success` with `ErrorKind::None`, or
/// failure with a specific error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationResult {
    success: bool,
    value: i32,
    error: ErrorKind,
}

impl OperationResult {
    /// Successful outcome carrying `value`
    pub const fn ok(value: i32) -> Self {
        Self {
            success: true,
            value,
            error: ErrorKind::None,
        }
    }

    /// Failed outcome
    ///
    /// A failure can never carry `ErrorKind::None`; it is reported as
    /// `ErrorKind::Unknown` instead.
    pub const fn failed(error: ErrorKind) -> Self {
        let error = match error {
            ErrorKind::None => ErrorKind::Unknown,
            other => other,
        };
        Self {
            success: false,
            value: 0,
            error,
        }
    }

    pub const fn success(&self) -> bool {
        self.success
    }

    pub const fn value(&self) -> i32 {
        self.value
    }

    pub const fn error(&self) -> ErrorKind {
        self.error
    }

    /// Convert to a `Result`, dropping the redundant success flag
    pub fn into_result(self) -> Result<i32, ErrorKind> {
        if self.success {
            Ok(self.value)
        } else {
            Err(self.error)
        }
    }

    /// Triple as transmitted over the C boundary: `(success, value, error code)`
    pub const fn to_raw(&self) -> (i32, i32, i32) {
        (self.success as i32, self.value, self.error.code())
    }
}

impl From<Result<i32, ErrorKind>> for OperationResult {
    fn from(result: Result<i32, ErrorKind>) -> Self {
        match result {
            Ok(value) => Self::ok(value),
            Err(error) => Self::failed(error),
        }
    }
}
