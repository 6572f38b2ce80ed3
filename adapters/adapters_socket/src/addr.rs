//! Address Module
//!
//! Classification of an adopted socket and the typed addresses it reports.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use socket2::{SockAddr, Type};

use crate::error::AdoptError;

/// Internet protocol family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpFamily {
    /// IPv4
    V4,
    /// IPv6
    V6,
}

impl IpFamily {
    pub fn of(addr: &SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(_) => IpFamily::V4,
            SocketAddr::V6(_) => IpFamily::V6,
        }
    }
}

/// What an adopted socket turned out to be
///
/// Produced once by [`classify`] from the local address family and the
/// socket type; every role constructor matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketShape {
    /// TCP over IPv4
    Ipv4Stream,
    /// TCP over IPv6
    Ipv6Stream,
    /// UDP
    Datagram(IpFamily),
    /// Raw IP
    RawIp(IpFamily),
    /// Unix domain, any type
    Unix,
}

impl SocketShape {
    /// Internet family, `None` for Unix-domain sockets
    pub fn family(self) -> Option<IpFamily> {
        match self {
            SocketShape::Ipv4Stream => Some(IpFamily::V4),
            SocketShape::Ipv6Stream => Some(IpFamily::V6),
            SocketShape::Datagram(family) | SocketShape::RawIp(family) => Some(family),
            SocketShape::Unix => None,
        }
    }

    /// Network name the endpoint reports (`"tcp"`, `"udp"`, `"ip"`, `"unix"`)
    pub fn network(self) -> &'static str {
        match self {
            SocketShape::Ipv4Stream | SocketShape::Ipv6Stream => "tcp",
            SocketShape::Datagram(_) => "udp",
            SocketShape::RawIp(_) => "ip",
            SocketShape::Unix => "unix",
        }
    }
}

/// Classify a socket from its local address and `SO_TYPE`
///
/// The local address decides the family; a socket without one cannot be
/// classified. Internet sockets of a type other than stream, datagram or
/// raw fit no endpoint role.
pub fn classify(local: Option<&SockAddr>, ty: Type) -> Result<SocketShape, AdoptError> {
    let Some(local) = local else {
        return Err(AdoptError::ProtocolNotSupported(
            "socket has no local address".to_string(),
        ));
    };
    let family = match libc::c_int::from(local.family()) {
        libc::AF_INET => IpFamily::V4,
        libc::AF_INET6 => IpFamily::V6,
        libc::AF_UNIX => return Ok(SocketShape::Unix),
        other => {
            return Err(AdoptError::ProtocolNotSupported(format!(
                "address family {other}"
            )))
        }
    };
    if ty == Type::STREAM {
        Ok(match family {
            IpFamily::V4 => SocketShape::Ipv4Stream,
            IpFamily::V6 => SocketShape::Ipv6Stream,
        })
    } else if ty == Type::DGRAM {
        Ok(SocketShape::Datagram(family))
    } else if ty == Type::RAW {
        Ok(SocketShape::RawIp(family))
    } else {
        Err(AdoptError::InvalidArgument(format!(
            "unsupported socket type {ty:?}"
        )))
    }
}

/// Typed endpoint address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetAddr {
    Tcp(SocketAddr),
    Udp(SocketAddr),
    /// Raw IP endpoints have no port
    Ip(IpAddr),
}

impl NetAddr {
    /// Interpret a raw address according to the socket's shape
    pub fn from_sockaddr(shape: SocketShape, addr: &SockAddr) -> Option<Self> {
        let sa = addr.as_socket()?;
        match shape {
            SocketShape::Ipv4Stream | SocketShape::Ipv6Stream => Some(NetAddr::Tcp(sa)),
            SocketShape::Datagram(_) => Some(NetAddr::Udp(sa)),
            SocketShape::RawIp(_) => Some(NetAddr::Ip(sa.ip())),
            SocketShape::Unix => None,
        }
    }

    pub fn network(&self) -> &'static str {
        match self {
            NetAddr::Tcp(_) => "tcp",
            NetAddr::Udp(_) => "udp",
            NetAddr::Ip(_) => "ip",
        }
    }

    pub fn ip(&self) -> IpAddr {
        match self {
            NetAddr::Tcp(sa) | NetAddr::Udp(sa) => sa.ip(),
            NetAddr::Ip(ip) => *ip,
        }
    }

    /// Socket address, `None` for raw IP addresses
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        match self {
            NetAddr::Tcp(sa) | NetAddr::Udp(sa) => Some(*sa),
            NetAddr::Ip(_) => None,
        }
    }
}

impl fmt::Display for NetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetAddr::Tcp(sa) | NetAddr::Udp(sa) => write!(f, "{sa}"),
            NetAddr::Ip(ip) => write!(f, "{ip}"),
        }
    }
}
