//! Raw IP Endpoint Module
//!
//! Raw-IP endpoints built on an adopted [`NetFd`]. Opening raw sockets
//! needs privileges; adoption is how unprivileged code usually gets one.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};
use std::time::Duration;

use socket2::SockAddr;

use crate::addr::IpFamily;
use crate::fd::NetFd;

/// Raw IP endpoint
#[derive(Debug)]
pub struct IpConn {
    fd: NetFd,
}

impl IpConn {
    pub(crate) fn new(fd: NetFd) -> Self {
        Self { fd }
    }

    pub fn local_addr(&self) -> Option<IpAddr> {
        self.fd.local_addr().map(|a| a.ip())
    }

    pub fn peer_addr(&self) -> Option<IpAddr> {
        self.fd.remote_addr().map(|a| a.ip())
    }

    /// Receive one packet payload and its source address
    ///
    /// IPv4 raw sockets deliver the IP header along with the payload; it is
    /// stripped so both families return payload only.
    pub fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, IpAddr)> {
        let (n, from) = self.fd.recv_from(buf)?;
        let from = NetFd::socket_addr(&from)?.ip();
        let n = match self.fd.family() {
            IpFamily::V4 => strip_ipv4_header(buf, n),
            IpFamily::V6 => n,
        };
        Ok((n, from))
    }

    /// Send one packet payload to `target`
    pub fn send_to(&self, buf: &[u8], target: IpAddr) -> io::Result<usize> {
        self.fd
            .send_to(buf, &SockAddr::from(SocketAddr::new(target, 0)))
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

impl AsFd for IpConn {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for IpConn {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

/// Move the payload of an IPv4 packet to the front of `buf`
///
/// Returns the payload length. Buffers that do not start with a plausible
/// IPv4 header are left untouched.
fn strip_ipv4_header(buf: &mut [u8], n: usize) -> usize {
    if n < 20 || buf[0] >> 4 != 4 {
        return n;
    }
    let header_len = usize::from(buf[0] & 0x0f) << 2;
    if header_len < 20 || header_len > n {
        return n;
    }
    buf.copy_within(header_len..n, 0);
    n - header_len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ipv4_header() {
        let mut packet = vec![0u8; 24];
        packet[0] = 0x45;
        packet[20..].copy_from_slice(b"ping");
        let n = strip_ipv4_header(&mut packet, 24);
        assert_eq!(&packet[..n], b"ping");
    }

    #[test]
    fn test_strip_ipv4_header_with_options() {
        let mut packet = vec![0u8; 28];
        packet[0] = 0x46;
        packet[24..].copy_from_slice(b"pong");
        let n = strip_ipv4_header(&mut packet, 28);
        assert_eq!(&packet[..n], b"pong");
    }

    #[test]
    fn test_strip_leaves_short_or_foreign_buffers() {
        let mut short = *b"tiny";
        assert_eq!(strip_ipv4_header(&mut short, 4), 4);

        let mut not_v4 = [0x60u8; 40];
        assert_eq!(strip_ipv4_header(&mut not_v4, 40), 40);

        let mut truncated = [0u8; 20];
        truncated[0] = 0x4f;
        assert_eq!(strip_ipv4_header(&mut truncated, 20), 20);
    }
}
