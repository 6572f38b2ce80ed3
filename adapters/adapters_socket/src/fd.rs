//! Network Descriptor Module
//!
//! [`NetFd`] is the adopted socket: a private non-blocking close-on-exec
//! descriptor together with its classification, its resolved addresses
//! and its readiness registration. Family and shape are fixed at
//! construction and the descriptor is closed exactly once, when the
//! `NetFd` is dropped.

use std::io::{self, Read, Write};
use std::mem::MaybeUninit;
use std::net::{Shutdown, SocketAddr};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::time::Duration;

use adapters_io_poll::{Interest, PollConfig, PollDesc};
use nix::errno::Errno;
use socket2::{SockAddr, Socket};
use tracing::debug;

use crate::addr::{classify, IpFamily, NetAddr, SocketShape};
use crate::error::AdoptError;

/// Adopted network descriptor
#[derive(Debug)]
pub struct NetFd {
    socket: Socket,
    shape: SocketShape,
    family: IpFamily,
    laddr: Option<NetAddr>,
    raddr: Option<NetAddr>,
    pd: PollDesc,
}

impl NetFd {
    /// Adopt a duplicate of `handle`
    ///
    /// `handle` itself is only read; the caller keeps ownership of it.
    pub fn adopt(handle: RawFd) -> Result<Self, AdoptError> {
        // SAFETY: F_GETFD only inspects the descriptor table entry.
        Errno::result(unsafe { libc::fcntl(handle, libc::F_GETFD) }).map_err(|errno| {
            AdoptError::InvalidHandle {
                fd: handle,
                source: errno.into(),
            }
        })?;

        // SAFETY: F_DUPFD_CLOEXEC allocates a fresh descriptor; it is owned
        // below and never touched again through `handle`.
        let dup = Errno::result(unsafe { libc::fcntl(handle, libc::F_DUPFD_CLOEXEC, 0) })
            .map_err(|errno| AdoptError::syscall("dup", errno))?;
        // SAFETY: `dup` was just returned by the kernel and nothing else owns it.
        let socket = Socket::from(unsafe { OwnedFd::from_raw_fd(dup) });

        // From here on every early return drops `socket`, closing the duplicate.
        socket
            .set_nonblocking(true)
            .map_err(|e| AdoptError::syscall("set nonblocking", e))?;
        let ty = socket
            .r#type()
            .map_err(|e| AdoptError::syscall("getsockopt", e))?;

        let lsa = socket.local_addr().ok();
        let rsa = socket.peer_addr().ok();

        let shape = classify(lsa.as_ref(), ty)?;
        let family = match shape.family() {
            Some(family) => family,
            None => {
                debug!(fd = handle, "refusing unix domain socket");
                return Err(AdoptError::PlatformUnsupported);
            }
        };

        let netfd = Self::assemble(socket, shape, family, lsa.as_ref(), rsa.as_ref())?;
        debug!(
            fd = handle,
            dup,
            shape = ?shape,
            local = ?netfd.laddr,
            remote = ?netfd.raddr,
            "adopted socket descriptor"
        );
        Ok(netfd)
    }

    /// Wrap a connection accepted on an adopted listener
    pub(crate) fn accepted(
        socket: Socket,
        shape: SocketShape,
        family: IpFamily,
        peer: &SockAddr,
    ) -> Result<Self, AdoptError> {
        socket
            .set_nonblocking(true)
            .map_err(|e| AdoptError::syscall("set nonblocking", e))?;
        let lsa = socket.local_addr().ok();
        Self::assemble(socket, shape, family, lsa.as_ref(), Some(peer))
    }

    fn assemble(
        socket: Socket,
        shape: SocketShape,
        family: IpFamily,
        lsa: Option<&SockAddr>,
        rsa: Option<&SockAddr>,
    ) -> Result<Self, AdoptError> {
        let pd = PollDesc::init(socket.as_fd(), PollConfig::default())
            .map_err(|e| AdoptError::syscall("poll register", e))?;
        Ok(Self {
            laddr: lsa.and_then(|a| NetAddr::from_sockaddr(shape, a)),
            raddr: rsa.and_then(|a| NetAddr::from_sockaddr(shape, a)),
            socket,
            shape,
            family,
            pd,
        })
    }

    /// Classification of the socket
    ///
    /// Never [`SocketShape::Unix`]: [`NetFd::adopt`] refuses Unix-domain
    /// sockets before a `NetFd` exists.
    pub fn shape(&self) -> SocketShape {
        self.shape
    }

    pub fn family(&self) -> IpFamily {
        self.family
    }

    /// Network name (`"tcp"`, `"udp"`, `"ip"`)
    pub fn net(&self) -> &'static str {
        self.shape.network()
    }

    pub fn local_addr(&self) -> Option<NetAddr> {
        self.laddr
    }

    pub fn remote_addr(&self) -> Option<NetAddr> {
        self.raddr
    }

    /// Underlying socket, for options this crate does not wrap
    pub fn socket(&self) -> &Socket {
        &self.socket
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) {
        self.pd.set_read_timeout(timeout);
    }

    pub fn set_write_timeout(&self, timeout: Option<Duration>) {
        self.pd.set_write_timeout(timeout);
    }

    pub fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.pd
            .run(self.socket.as_fd(), Interest::Read, || (&self.socket).read(buf))
    }

    pub fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.pd
            .run(self.socket.as_fd(), Interest::Write, || (&self.socket).write(buf))
    }

    pub fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SockAddr)> {
        self.pd.run(self.socket.as_fd(), Interest::Read, || {
            self.socket.recv_from(as_uninit(buf))
        })
    }

    pub fn send_to(&self, buf: &[u8], addr: &SockAddr) -> io::Result<usize> {
        self.pd.run(self.socket.as_fd(), Interest::Write, || {
            self.socket.send_to(buf, addr)
        })
    }

    pub(crate) fn accept(&self) -> io::Result<(Socket, SockAddr)> {
        self.pd
            .run(self.socket.as_fd(), Interest::Read, || self.socket.accept())
    }

    pub fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        self.socket.shutdown(how)
    }

    /// Convert a peer address reported by the kernel into this socket's terms
    pub(crate) fn socket_addr(addr: &SockAddr) -> io::Result<SocketAddr> {
        addr.as_socket().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "peer address is not an internet address")
        })
    }
}

impl AsFd for NetFd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.socket.as_fd()
    }
}

impl AsRawFd for NetFd {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}

impl From<NetFd> for OwnedFd {
    fn from(fd: NetFd) -> Self {
        fd.socket.into()
    }
}

fn as_uninit(buf: &mut [u8]) -> &mut [MaybeUninit<u8>] {
    // SAFETY: `MaybeUninit<u8>` has the layout of `u8`, and the kernel only
    // ever writes initialized bytes into the buffer.
    unsafe { &mut *(buf as *mut [u8] as *mut [MaybeUninit<u8>]) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{TcpListener, TcpStream, UdpSocket};

    #[test]
    fn test_adopt_connected_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();

        let fd = NetFd::adopt(client.as_raw_fd()).unwrap();
        assert_ne!(fd.as_raw_fd(), client.as_raw_fd());
        assert_eq!(fd.shape(), SocketShape::Ipv4Stream);
        assert_eq!(fd.family(), IpFamily::V4);
        assert_eq!(fd.net(), "tcp");
        assert_eq!(fd.local_addr(), Some(NetAddr::Tcp(client.local_addr().unwrap())));
        assert_eq!(fd.remote_addr(), Some(NetAddr::Tcp(client.peer_addr().unwrap())));
        assert!(fd.socket().nonblocking().unwrap());
    }

    #[test]
    fn test_duplicate_is_close_on_exec() {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let fd = NetFd::adopt(socket.as_raw_fd()).unwrap();
        let flags = unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_GETFD) };
        assert!(flags & libc::FD_CLOEXEC != 0);
    }

    #[test]
    fn test_unbound_datagram_has_no_peer() {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let fd = NetFd::adopt(socket.as_raw_fd()).unwrap();
        assert_eq!(fd.shape(), SocketShape::Datagram(IpFamily::V4));
        assert_eq!(fd.local_addr(), Some(NetAddr::Udp(socket.local_addr().unwrap())));
        assert_eq!(fd.remote_addr(), None);
    }

    #[test]
    fn test_adopt_refuses_unix_domain() {
        let (stream, _peer) = std::os::unix::net::UnixStream::pair().unwrap();
        let err = NetFd::adopt(stream.as_raw_fd()).unwrap_err();
        assert!(matches!(err, AdoptError::PlatformUnsupported), "{err:?}");
    }

    #[test]
    fn test_adopt_invalid_handle() {
        let err = NetFd::adopt(RawFd::MAX).unwrap_err();
        assert!(matches!(err, AdoptError::InvalidHandle { .. }), "{err:?}");
    }
}
