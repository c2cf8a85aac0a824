use std::mem;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use libc::{FILE, c_void};

use super::StreamError;
use crate::CHUNK_SIZE;
use crate::error::{CloseFailedError, OpenFailedError, SyncFailedError};
use crate::util::syscall::{self, err_no};

/// A buffered stdio stream that appends to a file, creating it if it is missing.
///
/// Writes are buffered by the C library, so they may not be visible to other readers until
/// [`synchronize`](OutputStream::synchronize) is called. Dropping the stream synchronizes and closes
/// it, but any error at that point can only be logged: call [`close`](OutputStream::close) to find
/// out whether everything made it to disk.
#[derive(Debug)]
pub struct OutputStream {
    stream: NonNull<FILE>,
    path: PathBuf,
}

impl OutputStream {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<OutputStream, OpenFailedError> {
        let path = path.as_ref();
        let failed = || OpenFailedError { path: path.to_owned() };
        let pathname = syscall::c_path(path).map_err(|_| failed())?;

        // SAFETY: Both arguments are valid nul-terminated strings.
        let stream = unsafe { libc::fopen(pathname.as_ptr(), c"a+".as_ptr()) };
        match NonNull::new(stream) {
            Some(stream) => {
                tracing::debug!(path = %path.display(), "opened output stream");
                Ok(OutputStream { stream, path: path.to_owned() })
            },
            None => {
                tracing::debug!(path = %path.display(), errno = err_no(), "fopen failed");
                Err(failed())
            },
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `content` to the stream. Returns the number of bytes accepted, which is less than
    /// `content.len()` only if the stream hit an error.
    pub fn write(&mut self, content: &[u8]) -> u64 {
        let mut done = 0;
        for chunk in content.chunks(CHUNK_SIZE) {
            // SAFETY: chunk is valid for reads of chunk.len() bytes and the stream is open.
            let written = unsafe {
                libc::fwrite(chunk.as_ptr().cast::<c_void>(), 1, chunk.len(), self.stream.as_ptr())
            };
            done += written;
            if written < chunk.len() {
                tracing::debug!(path = %self.path.display(), done, "short write to stream");
                break;
            }
        }
        done as u64
    }

    /// Flushes the stream's buffer to the OS and then the OS's buffers to the device.
    pub fn synchronize(&mut self) -> Result<(), SyncFailedError> {
        let failed = || SyncFailedError { path: self.path.clone() };

        // SAFETY: The stream is open for as long as self exists.
        if unsafe { libc::fflush(self.stream.as_ptr()) } != 0 {
            tracing::debug!(path = %self.path.display(), errno = err_no(), "fflush failed");
            return Err(failed());
        }
        // SAFETY: As above, and fileno of an open stream is a valid descriptor.
        if unsafe { libc::fsync(libc::fileno(self.stream.as_ptr())) } == -1 {
            tracing::debug!(path = %self.path.display(), errno = err_no(), "fsync failed");
            return Err(failed());
        }
        Ok(())
    }

    /// Synchronizes and closes the stream. The stream is closed even if synchronizing fails.
    pub fn close(mut self) -> Result<(), StreamError> {
        let synced = self.synchronize();
        let stream = self.stream;
        let path = mem::take(&mut self.path);
        // The stream is closed below regardless of the outcome, so Drop must not run.
        mem::forget(self);

        let closed = close_stream(stream, &path);
        synced?;
        Ok(closed?)
    }
}

fn close_stream(stream: NonNull<FILE>, path: &Path) -> Result<(), CloseFailedError> {
    // SAFETY: The stream came from fopen and its owner no longer uses it.
    match unsafe { libc::fclose(stream.as_ptr()) } {
        0 => Ok(()),
        _ => {
            tracing::debug!(path = %path.display(), errno = err_no(), "fclose failed");
            Err(CloseFailedError { path: path.to_owned() })
        },
    }
}

impl Drop for OutputStream {
    fn drop(&mut self) {
        if let Err(e) = self.synchronize() {
            tracing::warn!(error = %e, "output stream dropped without synchronizing");
        }
        if let Err(e) = close_stream(self.stream, &self.path) {
            tracing::warn!(error = %e, "output stream dropped without closing");
        }
    }
}
