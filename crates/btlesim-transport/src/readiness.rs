use std::io::{self, Cursor};

/// How long a readiness check may suspend the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Check and return at once.
    Immediate,
    /// Block until the endpoint is readable (or the peer hung up).
    Indefinite,
}

impl Wait {
    /// The wait mode matching a `non_block` flag.
    pub fn from_non_block(non_block: bool) -> Self {
        if non_block {
            Wait::Immediate
        } else {
            Wait::Indefinite
        }
    }

    #[cfg(unix)]
    fn poll_timeout(self) -> libc::c_int {
        match self {
            Wait::Immediate => 0,
            Wait::Indefinite => -1,
        }
    }
}

/// A read endpoint that can report whether a read would make progress.
///
/// `Ok(true)` means the next `read` returns data, EOF, or an error without
/// blocking. Peer hang-up counts as readable so the reader observes EOF.
pub trait Readiness {
    fn wait_readable(&mut self, wait: Wait) -> io::Result<bool>;
}

/// In-memory buffers are always readable; exhaustion reads as EOF.
impl<T: AsRef<[u8]>> Readiness for Cursor<T> {
    fn wait_readable(&mut self, _wait: Wait) -> io::Result<bool> {
        Ok(true)
    }
}

#[cfg(unix)]
impl Readiness for std::os::unix::net::UnixStream {
    fn wait_readable(&mut self, wait: Wait) -> io::Result<bool> {
        use std::os::fd::AsFd;
        poll_readable(self.as_fd(), wait)
    }
}

/// Poll a descriptor for input with `poll(2)`.
#[cfg(unix)]
pub fn poll_readable(fd: std::os::fd::BorrowedFd<'_>, wait: Wait) -> io::Result<bool> {
    use std::os::fd::AsRawFd;

    let mut pfd = libc::pollfd {
        fd: fd.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };

    loop {
        // SAFETY: `pfd` is a valid, writable pollfd and we pass a count of one.
        // The descriptor is kept open by the `BorrowedFd` for the duration of the call.
        let rc = unsafe { libc::poll(&mut pfd, 1, wait.poll_timeout()) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if rc == 0 {
            return Ok(false);
        }
        if pfd.revents & libc::POLLNVAL != 0 {
            return Err(io::Error::from_raw_os_error(libc::EBADF));
        }
        return Ok(pfd.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0);
    }
}
