//! UDP Endpoint Module
//!
//! Datagram endpoints built on an adopted [`NetFd`].

use std::io;
use std::net::SocketAddr;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};
use std::time::Duration;

use socket2::SockAddr;

use crate::fd::NetFd;

/// UDP endpoint
///
/// Usable both connected (`recv`/`send`) and unconnected
/// (`recv_from`/`send_to`).
#[derive(Debug)]
pub struct UdpConn {
    fd: NetFd,
}

impl UdpConn {
    pub(crate) fn new(fd: NetFd) -> Self {
        Self { fd }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.fd.local_addr().and_then(|a| a.socket_addr())
    }

    /// Connected peer, if the adopted socket was connected
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.fd.remote_addr().and_then(|a| a.socket_addr())
    }

    /// Receive one datagram and the address it came from
    pub fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let (n, from) = self.fd.recv_from(buf)?;
        Ok((n, NetFd::socket_addr(&from)?))
    }

    /// Send one datagram to `target`
    pub fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.fd.send_to(buf, &SockAddr::from(target))
    }

    /// Receive one datagram from the connected peer
    pub fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.fd.read(buf)
    }

    /// Send one datagram to the connected peer
    pub fn send(&self, buf: &[u8]) -> io::Result<usize> {
        self.fd.write(buf)
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) {
        self.fd.set_read_timeout(timeout);
    }

    pub fn set_write_timeout(&self, timeout: Option<Duration>) {
        self.fd.set_write_timeout(timeout);
    }

    pub fn net_fd(&self) -> &NetFd {
        &self.fd
    }

    pub fn into_net_fd(self) -> NetFd {
        self.fd
    }
}

impl AsFd for UdpConn {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for UdpConn {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}
