use std::ffi::{CStr, CString, NulError, OsString};
use std::io;
use std::mem::MaybeUninit;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};
use std::ptr;

use libc::{c_char, c_int, mode_t, stat as Stat};

const PATH_BUF_SIZE: usize = libc::PATH_MAX as usize + 1;

pub fn err_no() -> c_int {
    // last_os_error is always constructed from errno, so the raw code is present.
    io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// Resets errno, for calls like `readdir` which only report errors through it.
pub fn clear_err_no() {
    // SAFETY: The errno location is valid and thread-local for the lifetime of the thread.
    unsafe { *errno_location() = 0 };
}

#[cfg(target_os = "linux")]
unsafe fn errno_location() -> *mut c_int {
    // SAFETY: Always safe to call, the caller is responsible for how the pointer is used.
    unsafe { libc::__errno_location() }
}

#[cfg(target_vendor = "apple")]
unsafe fn errno_location() -> *mut c_int {
    // SAFETY: Always safe to call, the caller is responsible for how the pointer is used.
    unsafe { libc::__error() }
}

pub fn c_path(path: &Path) -> Result<CString, NulError> {
    CString::new(path.as_os_str().as_bytes())
}

fn c_path_or_inval(path: &Path) -> Result<CString, c_int> {
    c_path(path).map_err(|_| libc::EINVAL)
}

fn check(ret: c_int) -> Result<(), c_int> {
    match ret {
        -1 => Err(err_no()),
        _ => Ok(()),
    }
}

pub fn lstat(path: &Path) -> Result<Stat, c_int> {
    let pathname = c_path_or_inval(path)?;
    let mut raw: MaybeUninit<Stat> = MaybeUninit::uninit();
    // SAFETY: pathname is nul-terminated and raw is valid for writes of a stat struct.
    check(unsafe { libc::lstat(pathname.as_ptr(), raw.as_mut_ptr()) })?;
    // SAFETY: lstat initializes raw when it doesn't return an error.
    Ok(unsafe { raw.assume_init() })
}

pub fn access(path: &Path, mode: c_int) -> bool {
    match c_path(path) {
        // SAFETY: pathname is a valid nul-terminated string.
        Ok(pathname) => (unsafe { libc::access(pathname.as_ptr(), mode) }) == 0,
        Err(_) => false,
    }
}

/// Creates a symlink at `link` which points to `target`.
pub fn symlink(target: &Path, link: &Path) -> Result<(), c_int> {
    let (target, link) = (c_path_or_inval(target)?, c_path_or_inval(link)?);
    // SAFETY: Both paths are valid nul-terminated strings.
    check(unsafe { libc::symlink(target.as_ptr(), link.as_ptr()) })
}

/// Creates a hard link at `link` to the existing object `target`.
pub fn link(target: &Path, link: &Path) -> Result<(), c_int> {
    let (target, link) = (c_path_or_inval(target)?, c_path_or_inval(link)?);
    // SAFETY: Both paths are valid nul-terminated strings.
    check(unsafe { libc::link(target.as_ptr(), link.as_ptr()) })
}

pub fn unlink(path: &Path) -> Result<(), c_int> {
    let pathname = c_path_or_inval(path)?;
    // SAFETY: pathname is a valid nul-terminated string.
    check(unsafe { libc::unlink(pathname.as_ptr()) })
}

pub fn rmdir(path: &Path) -> Result<(), c_int> {
    let pathname = c_path_or_inval(path)?;
    // SAFETY: pathname is a valid nul-terminated string.
    check(unsafe { libc::rmdir(pathname.as_ptr()) })
}

pub fn mkdir(path: &Path, mode: mode_t) -> Result<(), c_int> {
    let pathname = c_path_or_inval(path)?;
    // SAFETY: pathname is a valid nul-terminated string.
    check(unsafe { libc::mkdir(pathname.as_ptr(), mode) })
}

pub fn readlink(path: &Path) -> Result<PathBuf, c_int> {
    let pathname = c_path_or_inval(path)?;
    let mut buf = [0_u8; PATH_BUF_SIZE];
    // SAFETY: buf is valid for writes of buf.len() bytes.
    let len = match unsafe { libc::readlink(pathname.as_ptr(), buf.as_mut_ptr().cast::<c_char>(), buf.len()) } {
        -1 => return Err(err_no()),
        len => len as usize,
    };
    // readlink truncates silently, so a full buffer means the target may have been cut short.
    if len == buf.len() {
        return Err(libc::ENAMETOOLONG);
    }
    Ok(PathBuf::from(OsString::from_vec(buf[..len].to_vec())))
}

pub fn getcwd() -> Result<PathBuf, c_int> {
    let mut buf = [0_u8; PATH_BUF_SIZE];
    // SAFETY: buf is valid for writes of buf.len() bytes.
    if unsafe { libc::getcwd(buf.as_mut_ptr().cast::<c_char>(), buf.len()) }.is_null() {
        return Err(err_no());
    }
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Ok(PathBuf::from(OsString::from_vec(buf[..len].to_vec())))
}

/// Resolves every symlink and `.`/`..` component in an existing path.
pub fn realpath(path: &Path) -> Result<PathBuf, c_int> {
    let pathname = c_path_or_inval(path)?;
    // SAFETY: pathname is a valid nul-terminated string. A null buffer asks for a malloc'd result.
    let resolved = unsafe { libc::realpath(pathname.as_ptr(), ptr::null_mut()) };
    if resolved.is_null() {
        return Err(err_no());
    }
    // SAFETY: realpath returned a nul-terminated string, which is copied before being freed.
    let bytes = unsafe { CStr::from_ptr(resolved) }.to_bytes().to_vec();
    // SAFETY: resolved was allocated by realpath and isn't used again.
    unsafe { libc::free(resolved.cast()) };
    Ok(PathBuf::from(OsString::from_vec(bytes)))
}
