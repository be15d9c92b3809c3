//! Platform Module
//!
//! One-time network subsystem startup. Windows needs `WSAStartup` before any
//! socket is created; other platforms need nothing. Safe to call before every
//! operation: only the first call does any work.

use crate::socket::SocketError;
use std::sync::OnceLock;
use tracing::debug;

static NETWORK_INIT: OnceLock<Result<(), i32>> = OnceLock::new();

/// Make sure the network subsystem is started
///
/// # Returns
///
/// * `Ok(())` - Subsystem ready
/// * `Err(SocketError::Startup)` - Startup failed; the failure is remembered
pub fn ensure_network_init() -> Result<(), SocketError> {
    match NETWORK_INIT.get_or_init(startup) {
        Ok(()) => Ok(()),
        Err(code) => Err(SocketError::Startup(*code)),
    }
}

#[cfg(windows)]
fn startup() -> Result<(), i32> {
    use windows_sys::Win32::Networking::WinSock::{WSAStartup, WSADATA};

    // SAFETY: WSADATA is plain data and WSAStartup only writes into it.
    let mut wsa_data: WSADATA = unsafe { std::mem::zeroed() };
    let result = unsafe { WSAStartup(0x0202, &mut wsa_data) };
    if result != 0 {
        return Err(result);
    }
    debug!("winsock 2.2 started");
    Ok(())
}

#[cfg(not(windows))]
fn startup() -> Result<(), i32> {
    debug!("network subsystem needs no startup on this platform");
    Ok(())
}
