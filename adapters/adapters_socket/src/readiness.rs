//! Readiness Module
//!
//! Bounded wait for a socket to become writable, which is how a pending
//! non-blocking connect reports completion. Backed by `poll(2)` on Unix and
//! `WSAPoll` on Windows.

use socket2::Socket;
use std::io;
use std::time::{Duration, Instant};
use tracing::trace;

/// Outcome of a readiness wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The socket signalled writability (or an error condition)
    Ready,
    /// The deadline passed first
    TimedOut,
}

/// Wait until `socket` is writable
///
/// # Arguments
///
/// * `socket` - Socket with a connect in progress
/// * `timeout` - Upper bound for the wait; `None` waits indefinitely
///
/// # Returns
///
/// * `Ok(Readiness::Ready)` - Writable, or an error is pending on the socket
/// * `Ok(Readiness::TimedOut)` - The timeout expired first
/// * `Err(io::Error)` - The wait itself failed
///
/// A wait interrupted by a signal resumes with whatever remains of the timeout.
pub fn wait_writable(socket: &Socket, timeout: Option<Duration>) -> io::Result<Readiness> {
    let deadline = timeout.map(|timeout| Instant::now() + timeout);
    loop {
        let wait_ms = remaining_ms(deadline);
        match sys::poll_writable(socket, wait_ms) {
            Ok(true) => return Ok(Readiness::Ready),
            Ok(false) => {
                // poll can wake up to a millisecond early; only trust the clock.
                if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                    trace!(?timeout, "readiness wait expired");
                    return Ok(Readiness::TimedOut);
                }
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                trace!("readiness wait interrupted, resuming");
            }
            Err(err) => return Err(err),
        }
    }
}

/// Milliseconds left until `deadline`, rounded up; `-1` means no deadline
fn remaining_ms(deadline: Option<Instant>) -> i32 {
    match deadline {
        None => -1,
        Some(deadline) => {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let ms = remaining.as_nanos().div_ceil(1_000_000);
            i32::try_from(ms).unwrap_or(i32::MAX)
        }
    }
}

#[cfg(unix)]
mod sys {
    use socket2::Socket;
    use std::io;
    use std::os::unix::io::AsRawFd;

    pub(super) fn poll_writable(socket: &Socket, timeout_ms: i32) -> io::Result<bool> {
        let mut pollfd = libc::pollfd {
            fd: socket.as_raw_fd(),
            events: libc::POLLOUT,
            revents: 0,
        };
        // SAFETY: `pollfd` is a single valid entry that outlives the call.
        let result = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };
        if result < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(result > 0)
    }
}

#[cfg(windows)]
mod sys {
    use socket2::Socket;
    use std::io;
    use std::os::windows::io::AsRawSocket;
    use windows_sys::Win32::Networking::WinSock::{
        WSAGetLastError, WSAPoll, POLLWRNORM, SOCKET_ERROR, WSAPOLLFD,
    };

    pub(super) fn poll_writable(socket: &Socket, timeout_ms: i32) -> io::Result<bool> {
        let mut pollfd = WSAPOLLFD {
            fd: socket.as_raw_socket() as _,
            events: POLLWRNORM as _,
            revents: 0,
        };
        // SAFETY: `pollfd` is a single valid entry that outlives the call.
        let result = unsafe { WSAPoll(&mut pollfd, 1, timeout_ms) };
        if result == SOCKET_ERROR {
            // SAFETY: reads thread-local Winsock state only.
            return Err(io::Error::from_raw_os_error(unsafe { WSAGetLastError() }));
        }
        Ok(result > 0)
    }
}
