use std::mem::{self, MaybeUninit};
use std::path::Path;

use derive_more::Display;
use libc::{SEEK_END, SEEK_SET, c_int, c_void, off_t, stat as Stat};

use crate::util::syscall::{self, err_no};

/// An OS-level file descriptor as handed out by a [`FileHandler`](crate::handler::FileHandler).
///
/// A `Descriptor` is only a number: it doesn't own the underlying file and copying it doesn't
/// duplicate anything. Whether it may be used is decided by the handler that issued it.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[display("{_0}")]
pub struct Descriptor(c_int);

impl Descriptor {
    /// Wraps a raw descriptor number. Handlers reject any descriptor they didn't open themselves,
    /// so this can't be used to operate on arbitrary files.
    pub const fn from_raw(fd: c_int) -> Descriptor {
        Descriptor(fd)
    }

    pub const fn raw(self) -> c_int {
        self.0
    }
}

/// An owned descriptor, closed when dropped.
#[derive(Debug)]
pub(crate) struct Fd(c_int);

impl Fd {
    pub fn open(path: &Path, flags: c_int, mode: libc::mode_t) -> Result<Fd, c_int> {
        let pathname = syscall::c_path(path).map_err(|_| libc::EINVAL)?;

        // SAFETY: pathname is a valid nul-terminated string that outlives the call.
        match unsafe { libc::open(pathname.as_ptr(), flags, mode as libc::c_uint) } {
            -1 => Err(err_no()),
            fd => Ok(Fd(fd)),
        }
    }

    pub const fn descriptor(&self) -> Descriptor {
        Descriptor(self.0)
    }

    pub fn read(&self, buf: &mut [u8]) -> Result<usize, c_int> {
        // SAFETY: buf is valid for writes of buf.len() bytes.
        match unsafe { libc::read(self.0, buf.as_mut_ptr().cast::<c_void>(), buf.len()) } {
            -1 => Err(err_no()),
            count => Ok(count as usize),
        }
    }

    pub fn write(&self, buf: &[u8]) -> Result<usize, c_int> {
        // SAFETY: buf is valid for reads of buf.len() bytes.
        match unsafe { libc::write(self.0, buf.as_ptr().cast::<c_void>(), buf.len()) } {
            -1 => Err(err_no()),
            count => Ok(count as usize),
        }
    }

    /// Writes the whole of `buf`, stopping early only if the OS accepts zero bytes.
    pub fn write_all(&self, buf: &[u8]) -> Result<usize, c_int> {
        let mut done = 0;
        while done < buf.len() {
            match self.write(&buf[done..])? {
                0 => break,
                count => done += count,
            }
        }
        Ok(done)
    }

    pub fn seek_to(&self, offset: u64) -> Result<u64, c_int> {
        let offset = off_t::try_from(offset).map_err(|_| libc::EOVERFLOW)?;
        self.seek_raw(offset, SEEK_SET)
    }

    pub fn seek_to_end(&self) -> Result<u64, c_int> {
        self.seek_raw(0, SEEK_END)
    }

    fn seek_raw(&self, offset: off_t, whence: c_int) -> Result<u64, c_int> {
        // SAFETY: lseek has no memory safety requirements.
        match unsafe { libc::lseek(self.0, offset, whence) } {
            -1 => Err(err_no()),
            pos => Ok(pos as u64),
        }
    }

    pub fn truncate(&self, len: u64) -> Result<(), c_int> {
        let len = off_t::try_from(len).map_err(|_| libc::EFBIG)?;
        // SAFETY: ftruncate has no memory safety requirements.
        match unsafe { libc::ftruncate(self.0, len) } {
            -1 => Err(err_no()),
            _ => Ok(()),
        }
    }

    pub fn stat(&self) -> Result<Stat, c_int> {
        let mut raw: MaybeUninit<Stat> = MaybeUninit::uninit();
        // SAFETY: raw is valid for writes of a stat struct.
        if unsafe { libc::fstat(self.0, raw.as_mut_ptr()) } == -1 {
            return Err(err_no());
        }
        // SAFETY: fstat initializes raw when it doesn't return an error.
        Ok(unsafe { raw.assume_init() })
    }

    pub fn close(self) -> Result<(), c_int> {
        let fd = self.0;
        // The descriptor is invalidated by close regardless of the outcome, so Drop must not run.
        mem::forget(self);
        // SAFETY: fd was owned by self, which has been consumed.
        match unsafe { libc::close(fd) } {
            -1 => Err(err_no()),
            _ => Ok(()),
        }
    }
}

impl Drop for Fd {
    fn drop(&mut self) {
        // SAFETY: self owns the descriptor and nothing uses it after drop. The OS releases it even
        // when close reports an error, so a failure is only logged.
        if unsafe { libc::close(self.0) } == -1 {
            tracing::warn!(fd = self.0, errno = err_no(), "failed to close dropped descriptor");
        }
    }
}
