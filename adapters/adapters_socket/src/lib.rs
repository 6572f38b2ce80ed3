//! Adapters Layer: Socket Descriptor Adoption
//!
//! Turns an already-open socket descriptor (inherited from a parent process,
//! handed over by another library, received over `SCM_RIGHTS`, ...) into a
//! managed endpoint that behaves like one created natively.
//!
//! ## Overview
//!
//! Adoption never takes the caller's descriptor. It works on a private
//! close-on-exec duplicate, so the caller stays free to close its copy:
//!
//! 1. validate the descriptor (`F_GETFD`)
//! 2. duplicate it (`F_DUPFD_CLOEXEC`)
//! 3. switch the duplicate to non-blocking mode
//! 4. read the socket type (`SO_TYPE`)
//! 5. resolve local and peer addresses (best effort)
//! 6. classify the socket from its local address ([`SocketShape`])
//! 7. register the duplicate for readiness polling
//!
//! The entry points then pick the endpoint variant from the classification:
//!
//! - [`file_conn`]: stream, datagram or raw-IP connection ([`Conn`])
//! - [`file_listener`]: stream listener ([`Listener`])
//! - [`file_packet_conn`]: datagram or raw-IP packet endpoint ([`PacketConn`])
//!
//! Unix-domain sockets are refused with [`AdoptError::PlatformUnsupported`].
//! Every failure closes the duplicate before returning.
//!
//! ## See Also
//!
//! - [`adapters_io_poll`](../adapters_io_poll/index.html): readiness polling

pub mod addr;
pub mod conn;
pub mod error;
pub mod fd;
pub mod file;
pub mod ip;
pub mod tcp;
pub mod udp;

pub use addr::{IpFamily, NetAddr, SocketShape};
pub use conn::{Conn, Listener, PacketConn};
pub use error::AdoptError;
pub use fd::NetFd;
pub use file::{file_conn, file_listener, file_packet_conn};
pub use ip::IpConn;
pub use tcp::{TcpConn, TcpListener};
pub use udp::UdpConn;
