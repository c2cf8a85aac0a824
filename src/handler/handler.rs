use std::path::Path;

use super::mode::{OpenMode, Reading, Updating, Writing};
use super::registry::Registry;
use super::{DescriptorError, FileError};
use crate::error::{IOError, NotOpenError, OpenFailedError};
use crate::fd::{Descriptor, Fd};
use crate::{CHUNK_SIZE, FILE_MODE};

/// Opens files by path and operates on them by [`Descriptor`].
///
/// Every descriptor a handler opens is recorded in its registry until it is closed, either with
/// [`close`](FileHandler::close) or by passing `close_after` to one of the I/O methods. Any
/// operation on a descriptor that isn't registered fails with [`NotOpenError`] instead of reaching
/// the OS. Dropping the handler closes everything that is still open.
///
/// The path-based methods (`*_file`) open the file themselves and always close it afterwards.
#[derive(Debug, Default)]
pub struct FileHandler {
    registry: Registry,
}

impl FileHandler {
    pub fn new() -> FileHandler {
        FileHandler::default()
    }

    pub fn open_for_reading<P: AsRef<Path>>(&mut self, path: P) -> Result<Descriptor, OpenFailedError> {
        self.open::<Reading, _>(path)
    }

    /// Opens the file for reading and writing, creating it if it is missing.
    pub fn open_for_updating<P: AsRef<Path>>(&mut self, path: P) -> Result<Descriptor, OpenFailedError> {
        self.open::<Updating, _>(path)
    }

    /// Opens the file for writing, creating it if it is missing. Existing content is kept.
    pub fn open_for_writing<P: AsRef<Path>>(&mut self, path: P) -> Result<Descriptor, OpenFailedError> {
        self.open::<Writing, _>(path)
    }

    pub fn open<M: OpenMode, P: AsRef<Path>>(&mut self, path: P) -> Result<Descriptor, OpenFailedError> {
        let path = path.as_ref();
        match Fd::open(path, M::FLAGS, FILE_MODE) {
            Ok(fd) => Ok(self.registry.insert(fd, path)),
            Err(errno) => {
                tracing::debug!(path = %path.display(), errno, "open failed");
                Err(OpenFailedError { path: path.to_owned() })
            },
        }
    }

    /// Closes the descriptor and forgets it. The OS-level close is attempted exactly once: if it
    /// fails the descriptor is still considered closed.
    pub fn close(&mut self, descriptor: Descriptor) -> Result<(), NotOpenError> {
        let fd = self.registry.remove(descriptor)?;
        if let Err(errno) = fd.close() {
            tracing::warn!(%descriptor, errno, "OS reported an error while closing descriptor");
        }
        Ok(())
    }

    pub fn is_open(&self, descriptor: Descriptor) -> bool {
        self.registry.contains(descriptor)
    }

    /// The debugging tag recorded for the descriptor: a hash of the path it was opened from.
    pub fn tag_of(&self, descriptor: Descriptor) -> Option<u64> {
        self.registry.tag_of(descriptor)
    }

    pub fn open_count(&self) -> usize {
        self.registry.len()
    }

    /// Reads the whole file from the start, regardless of the current position.
    pub fn read_whole(&mut self, descriptor: Descriptor, close_after: bool) -> Result<Vec<u8>, DescriptorError> {
        let result = self.read_whole_raw(descriptor);
        self.finish(descriptor, close_after, result)
    }

    /// Reads the bytes in `[start, end)`. Fewer bytes are returned if the file ends first, and none
    /// at all if `end <= start`.
    pub fn read_range(
        &mut self,
        descriptor: Descriptor,
        start: u64,
        end: u64,
        close_after: bool,
    ) -> Result<Vec<u8>, DescriptorError> {
        let result = self.read_range_raw(descriptor, start, end);
        self.finish(descriptor, close_after, result)
    }

    /// Writes `content` starting at `offset`, overwriting whatever is already there. Returns the
    /// number of bytes actually written.
    pub fn write_at(
        &mut self,
        descriptor: Descriptor,
        offset: u64,
        content: &[u8],
        close_after: bool,
    ) -> Result<u64, DescriptorError> {
        let result = self.registry.get(descriptor).map_err(DescriptorError::from).and_then(|fd| {
            fd.seek_to(offset).map_err(|code| IOError { descriptor, code })?;
            write_chunked(fd, content)
        });
        self.finish(descriptor, close_after, result)
    }

    /// Writes `content` at the end of the file. Returns the number of bytes actually written.
    pub fn append(&mut self, descriptor: Descriptor, content: &[u8], close_after: bool) -> Result<u64, DescriptorError> {
        let result = self.registry.get(descriptor).map_err(DescriptorError::from).and_then(|fd| {
            fd.seek_to_end().map_err(|code| IOError { descriptor, code })?;
            write_chunked(fd, content)
        });
        self.finish(descriptor, close_after, result)
    }

    /// Sets the length of the file. Extending a file past its end is left to the platform, which
    /// usually produces a sparse region of zeros.
    pub fn truncate(&mut self, descriptor: Descriptor, len: u64, close_after: bool) -> Result<(), DescriptorError> {
        let result = self.registry.get(descriptor).map_err(DescriptorError::from).and_then(|fd| {
            Ok(fd.truncate(len).map_err(|code| IOError { descriptor, code })?)
        });
        self.finish(descriptor, close_after, result)
    }

    pub fn read_whole_file<P: AsRef<Path>>(&mut self, path: P) -> Result<Vec<u8>, FileError> {
        let descriptor = self.open_for_reading(path)?;
        Ok(self.read_whole(descriptor, true)?)
    }

    pub fn read_file_range<P: AsRef<Path>>(&mut self, path: P, start: u64, end: u64) -> Result<Vec<u8>, FileError> {
        let descriptor = self.open_for_reading(path)?;
        Ok(self.read_range(descriptor, start, end, true)?)
    }

    /// Overwrites the file at `offset`, creating it if it is missing.
    pub fn write_file_at<P: AsRef<Path>>(&mut self, path: P, offset: u64, content: &[u8]) -> Result<u64, FileError> {
        let descriptor = self.open_for_writing(path)?;
        Ok(self.write_at(descriptor, offset, content, true)?)
    }

    pub fn append_to_file<P: AsRef<Path>>(&mut self, path: P, content: &[u8]) -> Result<u64, FileError> {
        let descriptor = self.open_for_writing(path)?;
        Ok(self.append(descriptor, content, true)?)
    }

    pub fn truncate_file<P: AsRef<Path>>(&mut self, path: P, len: u64) -> Result<(), FileError> {
        let descriptor = self.open_for_writing(path)?;
        Ok(self.truncate(descriptor, len, true)?)
    }

    fn read_whole_raw(&self, descriptor: Descriptor) -> Result<Vec<u8>, DescriptorError> {
        let fd = self.registry.get(descriptor)?;
        let io = |code| IOError { descriptor, code };

        fd.seek_to(0).map_err(io)?;

        let mut bytes = Vec::new();
        let mut buf = [0_u8; CHUNK_SIZE];
        loop {
            match fd.read(&mut buf).map_err(io)? {
                0 => break,
                count => bytes.extend_from_slice(&buf[..count]),
            }
        }

        tracing::trace!(%descriptor, len = bytes.len(), "read whole file");
        Ok(bytes)
    }

    fn read_range_raw(&self, descriptor: Descriptor, start: u64, end: u64) -> Result<Vec<u8>, DescriptorError> {
        let fd = self.registry.get(descriptor)?;
        let io = |code| IOError { descriptor, code };

        fd.seek_to(start).map_err(io)?;

        let mut remaining = end.saturating_sub(start);
        let mut bytes = Vec::new();
        let mut buf = [0_u8; CHUNK_SIZE];
        while remaining > 0 {
            let want = remaining.min(CHUNK_SIZE as u64) as usize;
            match fd.read(&mut buf[..want]).map_err(io)? {
                // The file ended before the range did.
                0 => break,
                count => {
                    bytes.extend_from_slice(&buf[..count]);
                    remaining -= count as u64;
                },
            }
        }

        tracing::trace!(%descriptor, start, end, len = bytes.len(), "read range");
        Ok(bytes)
    }

    fn finish<T>(
        &mut self,
        descriptor: Descriptor,
        close_after: bool,
        result: Result<T, DescriptorError>,
    ) -> Result<T, DescriptorError> {
        // Best effort: the result stands on its own. An unregistered descriptor has already failed
        // with NotOpen and close logs OS-level failures itself.
        if close_after {
            let _ = self.close(descriptor);
        }
        result
    }
}

fn write_chunked(fd: &Fd, content: &[u8]) -> Result<u64, DescriptorError> {
    let descriptor = fd.descriptor();
    let mut done = 0;

    for chunk in content.chunks(CHUNK_SIZE) {
        let written = fd.write_all(chunk).map_err(|code| IOError { descriptor, code })?;
        done += written;
        if written < chunk.len() {
            tracing::debug!(%descriptor, done, total = content.len(), "short write");
            break;
        }
    }

    tracing::trace!(%descriptor, done, "wrote content");
    Ok(done as u64)
}
