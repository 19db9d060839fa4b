// ============================================
// File: crates/peerlink-transport/src/tcp.rs
// ============================================
//! # Line-Framed TCP Transport
//!
//! ## Creation Reason
//! Peers and the directory exchange short newline-terminated text lines
//! over one TCP connection per exchange. This module provides the framing
//! and the bounded waits around every socket operation.
//!
//! ## Main Functionality
//! - `Timeouts`: Connect and read/write bounds
//! - `LineConnection`: Buffered line reader/writer over any async stream
//! - `TcpLineListener`: Listener bound with `SO_REUSEADDR`
//!
//! ## Design Choices
//! - Listener created with socket2 for quick rebinding after restart
//! - Reads go through a `BytesMut` buffer; lines are split off in place
//! - Writes share the read bound
//!
//! ## ⚠️ Important Note for Next Developer
//! - A peer that closes right after its last line may omit the final
//!   `\n`; that trailing fragment is returned as a line
//! - Lines are capped at `max_line_len` even before the terminator shows up
//!
//! ## Last Modified
//! v0.1.0 - Initial TCP line transport

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, info, trace};

use crate::error::{Result, TransportError};
use crate::traits::LineTransport;

// ============================================
// Constants
// ============================================

/// Default maximum line length in bytes.
pub const DEFAULT_MAX_LINE_LEN: usize = 4096;

/// Default bound on connection establishment.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on a single line read or write.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

const LISTEN_BACKLOG: i32 = 128;

// ============================================
// Timeouts
// ============================================

/// Bounds applied to socket operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Bound on `connect`
    pub connect: Duration,
    /// Bound on each line read and each frame write
    pub read: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT_TIMEOUT,
            read: DEFAULT_READ_TIMEOUT,
        }
    }
}

// ============================================
// LineConnection
// ============================================

/// Line-framed connection over an async byte stream.
pub struct LineConnection<S = TcpStream> {
    stream: S,
    buf: BytesMut,
    timeouts: Timeouts,
    max_line_len: usize,
    peer_addr: Option<SocketAddr>,
}

impl LineConnection<TcpStream> {
    /// Connects to `addr` within `timeouts.connect`.
    ///
    /// # Errors
    /// - `Timeout` if the connect bound expires
    /// - `ConnectFailed` if the remote refuses or is unreachable
    pub async fn connect(addr: SocketAddr, timeouts: Timeouts) -> Result<Self> {
        let stream = timeout(timeouts.connect, TcpStream::connect(addr))
            .await
            .map_err(|_| TransportError::timeout(format!("connect to {addr}"), timeouts.connect))?
            .map_err(|e| TransportError::connect_failed(addr, e.to_string()))?;
        stream
            .set_nodelay(true)
            .map_err(|e| TransportError::io("setting TCP_NODELAY", e))?;
        trace!(addr = %addr, "Connected");
        Ok(Self::new(stream, timeouts).with_peer_addr(addr))
    }
}

impl<S> LineConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wraps an established stream.
    #[must_use]
    pub fn new(stream: S, timeouts: Timeouts) -> Self {
        Self {
            stream,
            buf: BytesMut::with_capacity(1024),
            timeouts,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            peer_addr: None,
        }
    }

    /// Sets the maximum accepted line length.
    #[must_use]
    pub const fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    /// Records the remote address for diagnostics.
    #[must_use]
    pub const fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    /// Returns the configured timeouts.
    #[must_use]
    pub const fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Closes the write half. Errors are ignored; the peer may be gone.
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.stream.shutdown().await {
            trace!(error = %e, "Shutdown of closed stream");
        }
    }

    fn decode(&self, mut line: BytesMut) -> Result<String> {
        if line.last() == Some(&b'\n') {
            line.truncate(line.len() - 1);
        }
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        if line.len() > self.max_line_len {
            return Err(TransportError::LineTooLong {
                max: self.max_line_len,
                actual: line.len(),
            });
        }
        String::from_utf8(line.to_vec()).map_err(|_| TransportError::InvalidUtf8)
    }

    fn take_buffered_line(&mut self) -> Result<Option<String>> {
        match self.buf.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                let line = self.buf.split_to(pos + 1);
                self.decode(line).map(Some)
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<S> LineTransport for LineConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read_line(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(line) = self.take_buffered_line()? {
                return Ok(Some(line));
            }
            if self.buf.len() > self.max_line_len {
                return Err(TransportError::LineTooLong {
                    max: self.max_line_len,
                    actual: self.buf.len(),
                });
            }

            let bound = self.timeouts.read;
            let read = timeout(bound, self.stream.read_buf(&mut self.buf))
                .await
                .map_err(|_| TransportError::timeout("read line", bound))?
                .map_err(|e| TransportError::ReceiveFailed {
                    reason: e.to_string(),
                })?;

            if read == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                let rest = self.buf.split();
                return self.decode(rest).map(Some);
            }
        }
    }

    async fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        let bound = self.timeouts.read;
        let write = async {
            self.stream.write_all(frame).await?;
            self.stream.flush().await
        };
        timeout(bound, write)
            .await
            .map_err(|_| TransportError::timeout("write frame", bound))?
            .map_err(|e| TransportError::SendFailed {
                reason: e.to_string(),
            })
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }
}

impl<S> std::fmt::Debug for LineConnection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineConnection")
            .field("peer_addr", &self.peer_addr)
            .field("buffered", &self.buf.len())
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

// ============================================
// TcpLineListener
// ============================================

/// TCP listener producing [`LineConnection`]s.
#[derive(Debug)]
pub struct TcpLineListener {
    listener: TcpListener,
    local_addr: SocketAddr,
    timeouts: Timeouts,
}

impl TcpLineListener {
    /// Binds `addr` with `SO_REUSEADDR`.
    ///
    /// # Errors
    /// - `AddressInUse` if another process holds the port
    /// - `BindFailed` for any other bind failure
    pub async fn bind(addr: SocketAddr, timeouts: Timeouts) -> Result<Self> {
        debug!(addr = %addr, "Binding TCP listener");

        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))
            .map_err(|e| TransportError::io("creating TCP socket", e))?;
        socket
            .set_reuse_address(true)
            .map_err(|e| TransportError::io("setting SO_REUSEADDR", e))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| TransportError::io("setting non-blocking", e))?;
        socket.bind(&addr.into()).map_err(|e| {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                TransportError::AddressInUse { addr }
            } else {
                TransportError::bind_failed(addr, e.to_string())
            }
        })?;
        socket
            .listen(LISTEN_BACKLOG)
            .map_err(|e| TransportError::bind_failed(addr, e.to_string()))?;

        let std_listener: std::net::TcpListener = socket.into();
        let listener = TcpListener::from_std(std_listener)
            .map_err(|e| TransportError::io("converting to Tokio listener", e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| TransportError::io("getting local address", e))?;

        info!(addr = %local_addr, "TCP listener bound");
        Ok(Self {
            listener,
            local_addr,
            timeouts,
        })
    }

    /// Returns the bound address.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts the next connection.
    ///
    /// # Errors
    /// `ReceiveFailed` if the accept call fails.
    pub async fn accept(&self) -> Result<LineConnection<TcpStream>> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(|e| TransportError::ReceiveFailed {
                reason: e.to_string(),
            })?;
        if let Err(e) = stream.set_nodelay(true) {
            trace!(addr = %addr, error = %e, "TCP_NODELAY not set");
        }
        trace!(addr = %addr, "Accepted connection");
        Ok(LineConnection::new(stream, self.timeouts).with_peer_addr(addr))
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn short() -> Timeouts {
        Timeouts {
            connect: Duration::from_millis(500),
            read: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn test_reads_lines_in_order() {
        let (client, mut server) = tokio::io::duplex(256);
        let mut conn = LineConnection::new(client, short());

        server.write_all(b"HANDSHAKE\r\nAlice\n12 34\n").await.unwrap();
        assert_eq!(conn.read_line().await.unwrap().as_deref(), Some("HANDSHAKE"));
        assert_eq!(conn.read_line().await.unwrap().as_deref(), Some("Alice"));
        assert_eq!(conn.expect_line().await.unwrap(), "12 34");
    }

    #[tokio::test]
    async fn test_unterminated_final_line_and_eof() {
        let (client, mut server) = tokio::io::duplex(256);
        let mut conn = LineConnection::new(client, short());

        server.write_all(b"OK\nKEY Bob 1 2").await.unwrap();
        drop(server);
        assert_eq!(conn.read_line().await.unwrap().as_deref(), Some("OK"));
        assert_eq!(conn.read_line().await.unwrap().as_deref(), Some("KEY Bob 1 2"));
        assert_eq!(conn.read_line().await.unwrap(), None);
        assert!(matches!(conn.expect_line().await, Err(TransportError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_read_times_out() {
        let (client, _server) = tokio::io::duplex(256);
        let mut conn = LineConnection::new(client, short());
        let err = conn.read_line().await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_line_too_long() {
        let (client, mut server) = tokio::io::duplex(1024);
        let mut conn = LineConnection::new(client, short()).with_max_line_len(16);
        server.write_all(&[b'x'; 64]).await.unwrap();
        let err = conn.read_line().await.unwrap_err();
        assert!(matches!(err, TransportError::LineTooLong { max: 16, .. }));
    }

    #[tokio::test]
    async fn test_invalid_utf8() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut conn = LineConnection::new(client, short());
        server.write_all(b"\xff\xfe\n").await.unwrap();
        assert!(matches!(conn.read_line().await, Err(TransportError::InvalidUtf8)));
    }

    #[tokio::test]
    async fn test_write_line() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut conn = LineConnection::new(client, short());
        conn.write_line("HS_OK").await.unwrap();
        let mut buf = [0u8; 6];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"HS_OK\n");
    }

    #[tokio::test]
    async fn test_tcp_listener_round_trip() {
        let listener = TcpLineListener::bind("127.0.0.1:0".parse().unwrap(), short())
            .await
            .unwrap();
        let addr = listener.local_addr();
        assert_ne!(addr.port(), 0);

        let server = tokio::spawn(async move {
            let mut conn = listener.accept().await.unwrap();
            assert!(conn.peer_addr().is_some());
            let line = conn.expect_line().await.unwrap();
            conn.write_line(&format!("echo {line}")).await.unwrap();
        });

        let mut client = LineConnection::connect(addr, short()).await.unwrap();
        assert_eq!(client.peer_addr(), Some(addr));
        client.write_line("GETKEY Bob").await.unwrap();
        assert_eq!(client.expect_line().await.unwrap(), "echo GETKEY Bob");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to find a port with no listener
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let err = LineConnection::connect(addr, short()).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::ConnectFailed { .. } | TransportError::Timeout { .. }
        ));
    }
}
