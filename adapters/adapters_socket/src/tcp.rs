//! TCP Endpoint Module
//!
//! Stream connections and listeners built on an adopted [`NetFd`].

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};
use std::time::Duration;

use tracing::debug;

use crate::fd::NetFd;

/// TCP connection
///
/// Reads and writes park until the descriptor is ready, so the connection
/// behaves like a blocking stream even though the descriptor is not.
#[derive(Debug)]
pub struct TcpConn {
    fd: NetFd,
}

impl TcpConn {
    pub(crate) fn new(fd: NetFd) -> Self {
        Self { fd }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.fd.local_addr().and_then(|a| a.socket_addr())
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.fd.remote_addr().and_then(|a| a.socket_addr())
    }

    pub fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        self.fd.shutdown(how)
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) {
        self.fd.set_read_timeout(timeout);
    }

    pub fn set_write_timeout(&self, timeout: Option<Duration>) {
        self.fd.set_write_timeout(timeout);
    }

    pub fn set_nodelay(&self, nodelay: bool) -> io::Result<()> {
        self.fd.socket().set_nodelay(nodelay)
    }

    pub fn net_fd(&self) -> &NetFd {
        &self.fd
    }

    pub fn into_net_fd(self) -> NetFd {
        self.fd
    }
}

impl Read for TcpConn {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.fd.read(buf)
    }
}

impl Read for &TcpConn {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.fd.read(buf)
    }
}

impl Write for TcpConn {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.fd.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Write for &TcpConn {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.fd.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsFd for TcpConn {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for TcpConn {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

/// TCP listener
#[derive(Debug)]
pub struct TcpListener {
    fd: NetFd,
}

impl TcpListener {
    pub(crate) fn new(fd: NetFd) -> Self {
        Self { fd }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.fd.local_addr().and_then(|a| a.socket_addr())
    }

    /// Wait for and accept the next incoming connection
    pub fn accept(&self) -> io::Result<TcpConn> {
        let (socket, peer) = self.fd.accept()?;
        let fd = NetFd::accepted(socket, self.fd.shape(), self.fd.family(), &peer)?;
        debug!(
            listener = self.fd.as_raw_fd(),
            peer = %NetFd::socket_addr(&peer)?,
            "accepted connection"
        );
        Ok(TcpConn::new(fd))
    }

    /// Bound how long [`accept`](Self::accept) waits
    pub fn set_accept_timeout(&self, timeout: Option<Duration>) {
        self.fd.set_read_timeout(timeout);
    }

    pub fn net_fd(&self) -> &NetFd {
        &self.fd
    }

    pub fn into_net_fd(self) -> NetFd {
        self.fd
    }
}

impl AsFd for TcpListener {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for TcpListener {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}
