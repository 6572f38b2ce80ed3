//! Endpoint Roles
//!
//! The three roles an adopted descriptor can take. Each is a closed set of
//! concrete endpoint types; callers match on the variant when they need
//! type-specific operations.

use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, RawFd};

use crate::addr::NetAddr;
use crate::fd::NetFd;
use crate::ip::IpConn;
use crate::tcp::{TcpConn, TcpListener};
use crate::udp::UdpConn;

/// Connection-oriented view of an adopted socket
#[derive(Debug)]
pub enum Conn {
    Tcp(TcpConn),
    Udp(UdpConn),
    Ip(IpConn),
}

impl Conn {
    pub fn net_fd(&self) -> &NetFd {
        match self {
            Conn::Tcp(c) => c.net_fd(),
            Conn::Udp(c) => c.net_fd(),
            Conn::Ip(c) => c.net_fd(),
        }
    }

    pub fn local_addr(&self) -> Option<NetAddr> {
        self.net_fd().local_addr()
    }

    pub fn remote_addr(&self) -> Option<NetAddr> {
        self.net_fd().remote_addr()
    }
}

impl Read for Conn {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.net_fd().read(buf)
    }
}

impl Write for Conn {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.net_fd().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsRawFd for Conn {
    fn as_raw_fd(&self) -> RawFd {
        self.net_fd().as_raw_fd()
    }
}

/// Listening view of an adopted socket
#[derive(Debug)]
pub enum Listener {
    Tcp(TcpListener),
}

impl Listener {
    /// Wait for the next connection
    pub fn accept(&self) -> io::Result<Conn> {
        match self {
            Listener::Tcp(l) => l.accept().map(Conn::Tcp),
        }
    }

    pub fn local_addr(&self) -> Option<NetAddr> {
        match self {
            Listener::Tcp(l) => l.net_fd().local_addr(),
        }
    }
}

impl AsRawFd for Listener {
    fn as_raw_fd(&self) -> RawFd {
        match self {
            Listener::Tcp(l) => l.as_raw_fd(),
        }
    }
}

/// Packet view of an adopted socket
#[derive(Debug)]
pub enum PacketConn {
    Udp(UdpConn),
    Ip(IpConn),
}

impl PacketConn {
    /// Receive one packet and its source
    pub fn read_from(&self, buf: &mut [u8]) -> io::Result<(usize, NetAddr)> {
        match self {
            PacketConn::Udp(c) => c.recv_from(buf).map(|(n, a)| (n, NetAddr::Udp(a))),
            PacketConn::Ip(c) => c.recv_from(buf).map(|(n, a)| (n, NetAddr::Ip(a))),
        }
    }

    /// Send one packet to `target`
    ///
    /// UDP endpoints need a [`NetAddr::Udp`] target, raw IP endpoints accept
    /// any address and ignore its port.
    pub fn write_to(&self, buf: &[u8], target: NetAddr) -> io::Result<usize> {
        match (self, target) {
            (PacketConn::Udp(c), NetAddr::Udp(sa)) => c.send_to(buf, sa),
            (PacketConn::Udp(_), other) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("udp endpoint cannot send to {} address {other}", other.network()),
            )),
            (PacketConn::Ip(c), addr) => c.send_to(buf, addr.ip()),
        }
    }

    pub fn local_addr(&self) -> Option<NetAddr> {
        self.net_fd().local_addr()
    }

    pub fn net_fd(&self) -> &NetFd {
        match self {
            PacketConn::Udp(c) => c.net_fd(),
            PacketConn::Ip(c) => c.net_fd(),
        }
    }
}

impl AsRawFd for PacketConn {
    fn as_raw_fd(&self) -> RawFd {
        self.net_fd().as_raw_fd()
    }
}
