//! Error Kind Module
//!
//! The closed error taxonomy reported by socket operations. The numeric codes are
//! part of the binary interface with the host and must never be renumbered.

use thiserror::Error;

/// Portable socket error kind
///
/// Every OS-specific failure is funneled into one of these six values before it
/// reaches the caller.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorKind {
    /// No error (only paired with a successful result)
    #[default]
    None = 0,
    /// The peer actively refused the connection
    ConnectionRefused = 1,
    /// A bounded wait expired
    Timeout = 2,
    /// The peer reset the connection or shut it down in an orderly way
    Closed = 3,
    /// The identifier is not present in the handle table
    InvalidSocket = 4,
    /// Any other failure
    Unknown = 5,
}

impl ErrorKind {
    /// All error kinds in wire-code order
    pub const ALL: [ErrorKind; 6] = [
        ErrorKind::None,
        ErrorKind::ConnectionRefused,
        ErrorKind::Timeout,
        ErrorKind::Closed,
        ErrorKind::InvalidSocket,
        ErrorKind::Unknown,
    ];

    /// Wire code transmitted across the C boundary
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Whether retrying the same operation can reasonably succeed
    ///
    /// Only a timeout is transient; refusals, closed streams and invalid
    /// identifiers call for abandoning the connection.
    pub const fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Timeout)
    }

    /// Short human-readable name
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::None => "none",
            ErrorKind::ConnectionRefused => "connection refused",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Closed => "closed",
            ErrorKind::InvalidSocket => "invalid socket",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A wire code outside `0..=5`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown socket error code {0}")]
pub struct UnknownErrorCode(pub i32);

impl TryFrom<i32> for ErrorKind {
    type Error = UnknownErrorCode;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ErrorKind::None),
            1 => Ok(ErrorKind::ConnectionRefused),
            2 => Ok(ErrorKind::Timeout),
            3 => Ok(ErrorKind::Closed),
            4 => Ok(ErrorKind::InvalidSocket),
            5 => Ok(ErrorKind::Unknown),
            other => Err(UnknownErrorCode(other)),
        }
    }
}

impl From<ErrorKind> for i32 {
    fn from(kind: ErrorKind) -> Self {
        kind.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_codes_are_fixed() {
        assert_eq!(ErrorKind::None.code(), 0);
        assert_eq!(ErrorKind::ConnectionRefused.code(), 1);
        assert_eq!(ErrorKind::Timeout.code(), 2);
        assert_eq!(ErrorKind::Closed.code(), 3);
        assert_eq!(ErrorKind::InvalidSocket.code(), 4);
        assert_eq!(ErrorKind::Unknown.code(), 5);
    }

    #[test]
    fn test_try_from_code() {
        for kind in ErrorKind::ALL {
            assert_eq!(ErrorKind::try_from(kind.code()), Ok(kind));
        }
        assert_eq!(ErrorKind::try_from(6), Err(UnknownErrorCode(6)));
        assert_eq!(ErrorKind::try_from(-1), Err(UnknownErrorCode(-1)));
    }

    #[test]
    fn test_only_timeout_is_retryable() {
        let retryable: Vec<_> = ErrorKind::ALL
            .iter()
            .filter(|kind| kind.is_retryable())
            .collect();
        assert_eq!(retryable, vec![&ErrorKind::Timeout]);
    }

    #[test]
    fn test_default_is_none() {
        assert_eq!(ErrorKind::default(), ErrorKind::None);
        assert_eq!(ErrorKind::Closed.to_string(), "closed");
    }
}
