//! Descriptor Adoption Entry Points
//!
//! Each entry point adopts a duplicate of the caller's descriptor and then
//! picks the endpoint type from the socket's classification, never from
//! what the caller expected. A socket that does not fit the requested role
//! is closed and reported as [`AdoptError::InvalidArgument`].
//!
//! [`NetFd::adopt`] already refuses Unix-domain sockets; the `Unix` arms
//! below only keep the matches exhaustive.

use std::os::fd::AsRawFd;

use tracing::debug;

use crate::addr::SocketShape;
use crate::conn::{Conn, Listener, PacketConn};
use crate::error::AdoptError;
use crate::fd::NetFd;
use crate::ip::IpConn;
use crate::tcp::{TcpConn, TcpListener};
use crate::udp::UdpConn;

/// Adopt a socket as a connection
///
/// Stream sockets become [`Conn::Tcp`], datagram sockets [`Conn::Udp`]
/// and raw sockets [`Conn::Ip`].
///
/// # Examples
///
/// ```rust,no_run
/// use adapters_socket::{file_conn, Conn};
/// use std::io::{Read, Write};
///
/// let stream = std::net::TcpStream::connect("127.0.0.1:7000")?;
/// let mut conn = file_conn(&stream)?;
/// conn.write_all(b"hello")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn file_conn<H: AsRawFd + ?Sized>(handle: &H) -> Result<Conn, AdoptError> {
    let fd = NetFd::adopt(handle.as_raw_fd())?;
    match fd.shape() {
        SocketShape::Ipv4Stream | SocketShape::Ipv6Stream => Ok(Conn::Tcp(TcpConn::new(fd))),
        SocketShape::Datagram(_) => Ok(Conn::Udp(UdpConn::new(fd))),
        SocketShape::RawIp(_) => Ok(Conn::Ip(IpConn::new(fd))),
        SocketShape::Unix => Err(AdoptError::PlatformUnsupported),
    }
}

/// Adopt a socket as a listener
///
/// Only stream sockets can listen.
pub fn file_listener<H: AsRawFd + ?Sized>(handle: &H) -> Result<Listener, AdoptError> {
    let fd = NetFd::adopt(handle.as_raw_fd())?;
    match fd.shape() {
        SocketShape::Ipv4Stream | SocketShape::Ipv6Stream => {
            Ok(Listener::Tcp(TcpListener::new(fd)))
        }
        shape @ (SocketShape::Datagram(_) | SocketShape::RawIp(_)) => {
            Err(mismatch(fd, shape, "listener"))
        }
        SocketShape::Unix => Err(AdoptError::PlatformUnsupported),
    }
}

/// Adopt a socket as a packet endpoint
///
/// Datagram sockets become [`PacketConn::Udp`], raw sockets
/// [`PacketConn::Ip`].
pub fn file_packet_conn<H: AsRawFd + ?Sized>(handle: &H) -> Result<PacketConn, AdoptError> {
    let fd = NetFd::adopt(handle.as_raw_fd())?;
    match fd.shape() {
        SocketShape::Datagram(_) => Ok(PacketConn::Udp(UdpConn::new(fd))),
        SocketShape::RawIp(_) => Ok(PacketConn::Ip(IpConn::new(fd))),
        shape @ (SocketShape::Ipv4Stream | SocketShape::Ipv6Stream) => {
            Err(mismatch(fd, shape, "packet endpoint"))
        }
        SocketShape::Unix => Err(AdoptError::PlatformUnsupported),
    }
}

/// Close `fd` and describe why it cannot serve as `role`
fn mismatch(fd: NetFd, shape: SocketShape, role: &str) -> AdoptError {
    debug!(fd = fd.as_raw_fd(), shape = ?shape, role, "adopted socket does not fit role");
    drop(fd);
    AdoptError::InvalidArgument(format!("{} socket cannot be used as a {role}", shape.network()))
}
