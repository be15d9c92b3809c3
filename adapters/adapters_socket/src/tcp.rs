//! TCP Module
//!
//! The OS-level steps behind each operation: the timeout-bounded connect
//! protocol and single-call send and receive. Everything here works on a bare
//! `socket2::Socket`; identifier bookkeeping lives in [`crate::context`].

use crate::platform::ensure_network_init;
use crate::readiness::{wait_writable, Readiness};
use crate::socket::{is_in_progress, SocketError};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io::Read;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;
use tracing::{debug, trace};

/// Convert a millisecond timeout from the C boundary
///
/// Positive values bound the wait; zero and negative values mean "no bound".
pub fn timeout_from_ms(timeout_ms: i32) -> Option<Duration> {
    u64::try_from(timeout_ms)
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

/// Parse a numeric IPv4 host and a port into a destination address
///
/// # Returns
///
/// * `Ok(SocketAddrV4)` - Destination
/// * `Err(SocketError::InvalidAddress)` - Host is not dotted-quad IPv4
/// * `Err(SocketError::InvalidPort)` - Port outside 1-65535
pub fn parse_destination(host: &str, port: i32) -> Result<SocketAddrV4, SocketError> {
    let ip: Ipv4Addr = host
        .parse()
        .map_err(|_| SocketError::InvalidAddress(host.to_owned()))?;
    let port = u16::try_from(port)
        .ok()
        .filter(|port| *port != 0)
        .ok_or(SocketError::InvalidPort(port))?;
    Ok(SocketAddrV4::new(ip, port))
}

/// Open a TCP connection to `addr`
///
/// The socket is switched to non-blocking mode for the connect call. A
/// connect still in progress is resolved by a writability wait bounded by
/// `timeout` (`None` waits indefinitely), after which the pending socket error
/// decides between success and refusal. The socket is returned in blocking
/// mode.
///
/// Every failure path drops, and therefore closes, the socket it created.
///
/// # Returns
///
/// * `Ok(Socket)` - Connected blocking socket
/// * `Err(SocketError::Timeout)` - No readiness before the timeout
/// * `Err(SocketError::Refused)` - Readiness signalled with a pending error
/// * `Err(SocketError)` - Any other failure
pub fn connect(addr: SocketAddrV4, timeout: Option<Duration>) -> Result<Socket, SocketError> {
    ensure_network_init()?;

    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
        .map_err(SocketError::Create)?;
    #[cfg(target_vendor = "apple")]
    socket.set_nosigpipe(true).map_err(SocketError::Configure)?;

    socket.set_nonblocking(true).map_err(SocketError::Configure)?;

    match socket.connect(&SockAddr::from(addr)) {
        Ok(()) => trace!(%addr, "connect completed immediately"),
        Err(err) if is_in_progress(&err) => {
            trace!(%addr, ?timeout, "connect in progress");
            match wait_writable(&socket, timeout).map_err(SocketError::Poll)? {
                Readiness::Ready => {}
                Readiness::TimedOut => return Err(SocketError::Timeout),
            }
            if let Some(err) = socket.take_error().map_err(SocketError::Poll)? {
                return Err(SocketError::Refused(err));
            }
        }
        Err(err) => return Err(SocketError::Connect(err)),
    }

    socket.set_nonblocking(false).map_err(SocketError::Configure)?;
    debug!(%addr, "connected");
    Ok(socket)
}

// A send to a reset peer must fail with EPIPE, never raise SIGPIPE in the host.
#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
const SEND_FLAGS: libc::c_int = libc::MSG_NOSIGNAL;
#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
const SEND_FLAGS: i32 = 0;

/// Send up to `data.len()` bytes with a single blocking call
///
/// A partial send is reported as-is; continuing is the caller's job.
pub fn send(socket: &Socket, data: &[u8]) -> Result<usize, SocketError> {
    let sent = socket
        .send_with_flags(data, SEND_FLAGS)
        .map_err(SocketError::Send)?;
    trace!(requested = data.len(), sent, "send");
    Ok(sent)
}

/// Receive up to `buf.len()` bytes with a single blocking call
///
/// A positive `timeout` is installed as the socket's receive timeout before
/// reading. The setting persists: later receives without a timeout keep it.
///
/// # Returns
///
/// * `Ok(usize)` - Bytes read, at least one
/// * `Err(SocketError::Closed)` - The peer shut the stream down
/// * `Err(SocketError::Receive)` - OS failure, including an expired timeout
pub fn receive(
    socket: &Socket,
    buf: &mut [u8],
    timeout: Option<Duration>,
) -> Result<usize, SocketError> {
    if timeout.is_some() {
        socket
            .set_read_timeout(timeout)
            .map_err(SocketError::Configure)?;
    }
    if buf.is_empty() {
        // A zero-length read cannot tell data from an orderly close.
        return Ok(0);
    }

    let mut reader = socket;
    match reader.read(buf).map_err(SocketError::Receive)? {
        0 => Err(SocketError::Closed),
        received => {
            trace!(capacity = buf.len(), received, "receive");
            Ok(received)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entities_socket_handles::ErrorKind;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn local_listener() -> (TcpListener, SocketAddrV4) {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, SocketAddrV4::new(Ipv4Addr::LOCALHOST, port))
    }

    fn closed_port() -> SocketAddrV4 {
        let (listener, addr) = local_listener();
        drop(listener);
        addr
    }

    #[test]
    fn test_timeout_from_ms() {
        assert_eq!(timeout_from_ms(0), None);
        assert_eq!(timeout_from_ms(-10), None);
        assert_eq!(timeout_from_ms(250), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_parse_destination() {
        let addr = parse_destination("127.0.0.1", 8080).unwrap();
        assert_eq!(addr, SocketAddrV4::new(Ipv4Addr::LOCALHOST, 8080));
    }

    #[test]
    fn test_parse_destination_rejects_bad_host() {
        for host in ["", "localhost", "256.0.0.1", "1.2.3", "::1", "127.0.0.1 "] {
            let err = parse_destination(host, 80).unwrap_err();
            assert!(matches!(err, SocketError::InvalidAddress(_)), "{host:?}");
            assert_eq!(err.kind(), ErrorKind::Unknown);
        }
    }

    #[test]
    fn test_parse_destination_rejects_bad_port() {
        for port in [0, -1, 65536] {
            let err = parse_destination("127.0.0.1", port).unwrap_err();
            assert!(matches!(err, SocketError::InvalidPort(p) if p == port));
        }
        assert!(parse_destination("127.0.0.1", 65535).is_ok());
    }

    #[test]
    fn test_connect_success_leaves_socket_blocking() {
        let (listener, addr) = local_listener();
        let socket = connect(addr, Some(Duration::from_secs(2))).unwrap();
        let (_peer, _) = listener.accept().unwrap();

        let peer_addr = socket.peer_addr().unwrap().as_socket().unwrap();
        assert_eq!(peer_addr.port(), addr.port());
        #[cfg(unix)]
        assert!(!socket.nonblocking().unwrap());
    }

    #[test]
    fn test_connect_without_timeout_waits_for_completion() {
        let (listener, addr) = local_listener();
        let socket = connect(addr, None).unwrap();
        let (_peer, _) = listener.accept().unwrap();
        assert!(socket.peer_addr().is_ok());
    }

    #[test]
    fn test_connect_refused() {
        let err = connect(closed_port(), Some(Duration::from_millis(500))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionRefused);
    }

    #[test]
    fn test_connect_refused_without_timeout() {
        let err = connect(closed_port(), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionRefused);
    }

    #[test]
    fn test_send_and_receive() {
        let (listener, addr) = local_listener();
        let socket = connect(addr, Some(Duration::from_secs(2))).unwrap();
        let (mut peer, _) = listener.accept().unwrap();

        assert_eq!(send(&socket, b"PING").unwrap(), 4);
        let mut echoed = [0u8; 4];
        peer.read_exact(&mut echoed).unwrap();
        peer.write_all(&echoed).unwrap();

        let mut buf = [0u8; 64];
        let received = receive(&socket, &mut buf, Some(Duration::from_secs(1))).unwrap();
        assert_eq!(&buf[..received], b"PING");
    }

    #[test]
    fn test_receive_timeout() {
        let (listener, addr) = local_listener();
        let socket = connect(addr, Some(Duration::from_secs(2))).unwrap();
        let (_peer, _) = listener.accept().unwrap();

        let mut buf = [0u8; 16];
        let err = receive(&socket, &mut buf, Some(Duration::from_millis(100))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn test_receive_timeout_persists() {
        let (listener, addr) = local_listener();
        let socket = connect(addr, Some(Duration::from_secs(2))).unwrap();
        let (_peer, _) = listener.accept().unwrap();

        let mut buf = [0u8; 16];
        let _ = receive(&socket, &mut buf, Some(Duration::from_millis(50)));
        // No override: the earlier timeout still bounds this read.
        let err = receive(&socket, &mut buf, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn test_receive_orderly_close() {
        let (listener, addr) = local_listener();
        let socket = connect(addr, Some(Duration::from_secs(2))).unwrap();
        let acceptor = thread::spawn(move || {
            let (peer, _) = listener.accept().unwrap();
            drop(peer);
        });
        acceptor.join().unwrap();

        let mut buf = [0u8; 16];
        let err = receive(&socket, &mut buf, Some(Duration::from_secs(2))).unwrap_err();
        assert!(matches!(err, SocketError::Closed));
        assert_eq!(err.kind(), ErrorKind::Closed);
    }

    #[test]
    fn test_receive_into_empty_buffer() {
        let (listener, addr) = local_listener();
        let socket = connect(addr, Some(Duration::from_secs(2))).unwrap();
        let (_peer, _) = listener.accept().unwrap();
        assert_eq!(receive(&socket, &mut [], None).unwrap(), 0);
    }
}
