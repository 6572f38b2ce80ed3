//! Adoption errors

use std::io;
use std::os::fd::RawFd;

/// Errors returned while adopting a descriptor
///
/// By the time one of these reaches the caller, any duplicate descriptor
/// created for the attempt has already been closed.
#[derive(Debug, thiserror::Error)]
pub enum AdoptError {
    /// The descriptor could not be queried, usually because it is closed
    #[error("invalid handle {fd}: {source}")]
    InvalidHandle {
        fd: RawFd,
        #[source]
        source: io::Error,
    },
    /// A system call on the duplicate failed
    #[error("{operation}: {source}")]
    SystemCall {
        operation: &'static str,
        #[source]
        source: io::Error,
    },
    /// Unix-domain sockets cannot be adopted on this platform
    #[error("unix domain sockets are not supported by descriptor adoption")]
    PlatformUnsupported,
    /// The local address is absent or belongs to an unknown family
    #[error("protocol not supported: {0}")]
    ProtocolNotSupported(String),
    /// The socket does not fit the requested role
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl AdoptError {
    pub(crate) fn syscall(operation: &'static str, source: impl Into<io::Error>) -> Self {
        AdoptError::SystemCall {
            operation,
            source: source.into(),
        }
    }
}

impl From<AdoptError> for io::Error {
    fn from(err: AdoptError) -> Self {
        let kind = match &err {
            AdoptError::InvalidHandle { .. } | AdoptError::InvalidArgument(_) => {
                io::ErrorKind::InvalidInput
            }
            AdoptError::SystemCall { source, .. } => source.kind(),
            AdoptError::PlatformUnsupported | AdoptError::ProtocolNotSupported(_) => {
                io::ErrorKind::Unsupported
            }
        };
        io::Error::new(kind, err)
    }
}
