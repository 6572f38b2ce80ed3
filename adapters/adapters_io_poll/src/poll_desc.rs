//! Poll Descriptor Module
//!
//! Readiness waiting for a single non-blocking descriptor. A [`PollDesc`]
//! does not own the descriptor it serves; the owner passes a
//! [`BorrowedFd`] into every call so the registration can never outlive
//! the descriptor.

use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, RawFd};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags};
use tracing::trace;

/// Readiness a caller is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    /// Data available to read (or a pending connection to accept)
    Read,
    /// Room available in the send buffer
    Write,
}

impl Interest {
    fn flags(self) -> PollFlags {
        match self {
            Interest::Read => PollFlags::POLLIN,
            Interest::Write => PollFlags::POLLOUT,
        }
    }
}

/// Timeouts applied to blocking-style operations
///
/// `None` means wait indefinitely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollConfig {
    /// Maximum time a read-side operation parks waiting for readiness
    pub read_timeout: Option<Duration>,
    /// Maximum time a write-side operation parks waiting for readiness
    pub write_timeout: Option<Duration>,
}

/// Poll registration errors
#[derive(Debug, thiserror::Error)]
pub enum IoPollError {
    /// The descriptor is not open
    #[error("descriptor {0} is not open")]
    InvalidFd(RawFd),
    /// `poll(2)` itself failed
    #[error("poll failed: {0}")]
    PollFailed(#[from] Errno),
}

impl From<IoPollError> for io::Error {
    fn from(err: IoPollError) -> Self {
        match err {
            IoPollError::InvalidFd(_) => io::Error::from_raw_os_error(libc::EBADF),
            IoPollError::PollFailed(errno) => io::Error::from(errno),
        }
    }
}

/// Readiness registration for one descriptor
#[derive(Debug)]
pub struct PollDesc {
    fd: RawFd,
    config: Mutex<PollConfig>,
}

impl PollDesc {
    /// Register a descriptor
    ///
    /// Probes the descriptor once without blocking; a descriptor the kernel
    /// reports as invalid (`POLLNVAL`) is refused.
    pub fn init(fd: BorrowedFd<'_>, config: PollConfig) -> Result<Self, IoPollError> {
        let mut fds = [PollFd::new(&fd, PollFlags::empty())];
        loop {
            match poll(&mut fds, 0) {
                Ok(_) => break,
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(IoPollError::PollFailed(errno)),
            }
        }
        let revents = fds[0].revents().unwrap_or_else(PollFlags::empty);
        if revents.contains(PollFlags::POLLNVAL) {
            return Err(IoPollError::InvalidFd(fd.as_raw_fd()));
        }
        trace!(fd = fd.as_raw_fd(), "registered descriptor for readiness polling");
        Ok(Self {
            fd: fd.as_raw_fd(),
            config: Mutex::new(config),
        })
    }

    /// Raw descriptor number this registration serves
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Current timeouts
    pub fn config(&self) -> PollConfig {
        *self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) {
        self.config.lock().unwrap_or_else(PoisonError::into_inner).read_timeout = timeout;
    }

    pub fn set_write_timeout(&self, timeout: Option<Duration>) {
        self.config.lock().unwrap_or_else(PoisonError::into_inner).write_timeout = timeout;
    }

    /// Run a non-blocking operation until it stops reporting `WouldBlock`
    ///
    /// `op` is attempted immediately. Each `WouldBlock` parks the caller until
    /// `fd` is ready for `interest`; `Interrupted` retries at once. The
    /// configured timeout bounds the total time spent parked and surfaces as
    /// [`io::ErrorKind::TimedOut`].
    pub fn run<T, F>(&self, fd: BorrowedFd<'_>, interest: Interest, mut op: F) -> io::Result<T>
    where
        F: FnMut() -> io::Result<T>,
    {
        let config = self.config();
        let timeout = match interest {
            Interest::Read => config.read_timeout,
            Interest::Write => config.write_timeout,
        };
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            match op() {
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    self.wait(fd, interest, deadline)?;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                result => return result,
            }
        }
    }

    /// Park until `fd` is ready for `interest` or `deadline` passes
    ///
    /// Error and hang-up conditions count as ready; the retried operation
    /// reports the actual failure.
    pub fn wait(
        &self,
        fd: BorrowedFd<'_>,
        interest: Interest,
        deadline: Option<Instant>,
    ) -> io::Result<()> {
        loop {
            let timeout_ms = match deadline {
                None => -1,
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(io::Error::new(io::ErrorKind::TimedOut, "i/o timeout"));
                    }
                    millis_rounded_up(remaining)
                }
            };
            let mut fds = [PollFd::new(&fd, interest.flags())];
            match poll(&mut fds, timeout_ms) {
                Ok(0) => continue,
                Ok(_) => {
                    let revents = fds[0].revents().unwrap_or_else(PollFlags::empty);
                    if revents.contains(PollFlags::POLLNVAL) {
                        return Err(IoPollError::InvalidFd(fd.as_raw_fd()).into());
                    }
                    return Ok(());
                }
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(errno.into()),
            }
        }
    }
}

fn millis_rounded_up(d: Duration) -> libc::c_int {
    let mut millis = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
    if Duration::from_millis(millis) < d {
        millis = millis.saturating_add(1);
    }
    libc::c_int::try_from(millis).unwrap_or(libc::c_int::MAX)
}
