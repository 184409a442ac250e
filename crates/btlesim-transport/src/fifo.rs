use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::AsFd;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{FileTypeExt, MetadataExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::readiness::{poll_readable, Readiness, Wait};
use crate::role::{Direction, Role};

/// Default permission mode for created FIFOs.
pub const DEFAULT_FIFO_MODE: u32 = 0o600;

/// Locations of the two FIFOs backing one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FifoPaths {
    /// Client to server.
    pub miso: PathBuf,
    /// Server to client.
    pub mosi: PathBuf,
}

impl FifoPaths {
    pub const MISO_NAME: &'static str = "btleMiso";
    pub const MOSI_NAME: &'static str = "btleMosi";
    pub const DEFAULT_DIR: &'static str = "/tmp";

    /// Both FIFOs under `dir`, using the standard names.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            miso: dir.join(Self::MISO_NAME),
            mosi: dir.join(Self::MOSI_NAME),
        }
    }

    /// Path of the FIFO carrying `direction`.
    pub fn path(&self, direction: Direction) -> &Path {
        match direction {
            Direction::Miso => &self.miso,
            Direction::Mosi => &self.mosi,
        }
    }
}

impl Default for FifoPaths {
    fn default() -> Self {
        Self::in_dir(Self::DEFAULT_DIR)
    }
}

/// Create a FIFO at `path` unless one is already there.
///
/// Returns `true` if this call created it. An existing FIFO is reused; any
/// other kind of file at `path` is rejected and left untouched.
pub fn make_fifo(path: impl AsRef<Path>, mode: u32) -> Result<bool> {
    let path = path.as_ref();
    let c_path =
        CString::new(path.as_os_str().as_bytes()).map_err(|_| TransportError::InvalidPath {
            path: path.to_path_buf(),
        })?;

    match std::fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_fifo() => return Ok(false),
        Ok(_) => {
            return Err(TransportError::NotAFifo {
                path: path.to_path_buf(),
            })
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(TransportError::Create {
                path: path.to_path_buf(),
                source: err,
            })
        }
    }

    // SAFETY: `c_path` is a valid NUL-terminated string that outlives the call.
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), mode as libc::mode_t) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        // The peer may have created it between our check and mkfifo.
        if err.kind() == io::ErrorKind::AlreadyExists && is_fifo(path) {
            return Ok(false);
        }
        return Err(TransportError::Create {
            path: path.to_path_buf(),
            source: err,
        });
    }

    // mkfifo is subject to the umask; apply the requested mode exactly.
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(|e| {
        TransportError::Create {
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    debug!(?path, mode = %format!("{mode:o}"), "created fifo");
    Ok(true)
}

fn is_fifo(path: &Path) -> bool {
    std::fs::symlink_metadata(path)
        .map(|m| m.file_type().is_fifo())
        .unwrap_or(false)
}

fn fifo_identity(file: &File, path: &Path) -> Result<(u64, u64)> {
    let metadata = file.metadata().map_err(|e| TransportError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok((metadata.dev(), metadata.ino()))
}

/// Read side of a link.
///
/// Opened non-blocking so that opening never waits for a writer. Reads on an
/// empty FIFO return `WouldBlock`; use [`Readiness::wait_readable`] first.
#[derive(Debug)]
pub struct FifoReader {
    file: File,
    path: PathBuf,
}

impl FifoReader {
    /// Open `path` for reading without waiting for a writer.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&path)
            .map_err(|e| TransportError::Open {
                path: path.clone(),
                source: e,
            })?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Read for FifoReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Readiness for FifoReader {
    fn wait_readable(&mut self, wait: Wait) -> io::Result<bool> {
        poll_readable(self.file.as_fd(), wait)
    }
}

/// Write side of a link.
#[derive(Debug)]
pub struct FifoWriter {
    file: File,
    path: PathBuf,
}

impl FifoWriter {
    /// Open `path` for writing.
    ///
    /// Blocks until the other end has the FIFO open for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .write(true)
            .open(&path)
            .map_err(|e| TransportError::Open {
                path: path.clone(),
                source: e,
            })?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Write for FifoWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Removes the FIFOs a link was opened on.
///
/// A path is only removed if it still names the FIFO recorded at open time,
/// so a link never deletes a file that replaced its FIFO.
#[derive(Debug, Default)]
pub struct FifoGuard {
    entries: Vec<(PathBuf, (u64, u64))>,
}

impl FifoGuard {
    /// Track the FIFOs behind an opened endpoint pair.
    ///
    /// Identity comes from the open descriptors, so a peer that removes the
    /// paths first cannot make this fail.
    fn track(reader: &FifoReader, writer: &FifoWriter) -> Result<Self> {
        let entries = vec![
            (reader.path.clone(), fifo_identity(&reader.file, &reader.path)?),
            (writer.path.clone(), fifo_identity(&writer.file, &writer.path)?),
        ];
        Ok(Self { entries })
    }

    /// Remove the tracked FIFOs. Calling this again does nothing.
    pub fn remove(&mut self) {
        for (path, (expected_dev, expected_ino)) in self.entries.drain(..) {
            match std::fs::symlink_metadata(&path) {
                Ok(metadata)
                    if metadata.file_type().is_fifo()
                        && metadata.dev() == expected_dev
                        && metadata.ino() == expected_ino =>
                {
                    match std::fs::remove_file(&path) {
                        Ok(()) => debug!(?path, "removed fifo"),
                        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                        Err(err) => warn!(?path, error = %err, "failed to remove fifo"),
                    }
                }
                Ok(_) => debug!(?path, "fifo path identity changed; skipping cleanup"),
                // Already removed, most likely by the peer closing first.
                Err(_) => {}
            }
        }
    }

    /// True once there is nothing left to remove.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for FifoGuard {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Both endpoints of one side of a link, opened for a role.
#[derive(Debug)]
pub struct FifoLink {
    role: Role,
    reader: FifoReader,
    writer: FifoWriter,
    guard: FifoGuard,
}

impl FifoLink {
    /// Create (if absent) and open both FIFOs for `role`.
    ///
    /// The read side is opened first and never blocks. The write side is
    /// opened second and blocks until the peer has opened its read side, so
    /// both roles can open concurrently in either order.
    pub fn open(paths: &FifoPaths, role: Role, mode: u32) -> Result<Self> {
        make_fifo(&paths.miso, mode)?;
        make_fifo(&paths.mosi, mode)?;

        let read_path = paths.path(role.read_direction());
        let write_path = paths.path(role.write_direction());

        let reader = FifoReader::open(read_path)?;
        debug!(%role, path = ?read_path, "opened read side");
        let writer = FifoWriter::open(write_path)?;
        debug!(%role, path = ?write_path, "opened write side");

        let guard = FifoGuard::track(&reader, &writer)?;
        info!(%role, miso = ?paths.miso, mosi = ?paths.mosi, "link open");

        Ok(Self {
            role,
            reader,
            writer,
            guard,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn into_parts(self) -> (Role, FifoReader, FifoWriter, FifoGuard) {
        (self.role, self.reader, self.writer, self.guard)
    }
}
