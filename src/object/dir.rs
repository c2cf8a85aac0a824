use std::ffi::{CStr, OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr::NonNull;

use libc::{DIR, c_int};

use crate::ObjectType;
use crate::util::syscall::{self, err_no};

/// An open directory stream.
#[derive(Debug)]
pub(crate) struct Directory {
    stream: NonNull<DIR>,
}

#[derive(Debug)]
pub(crate) struct DirEntry {
    pub name: OsString,
    /// `None` when the filesystem doesn't report types in its entries.
    pub object_type: Option<ObjectType>,
}

pub(crate) struct DirEntries<'a> {
    dir: &'a mut Directory,
}

impl Directory {
    pub fn open(dir_path: &Path) -> Result<Directory, c_int> {
        let pathname = syscall::c_path(dir_path).map_err(|_| libc::EINVAL)?;

        // SAFETY: pathname is a valid nul-terminated string.
        let stream = unsafe { libc::opendir(pathname.as_ptr()) };
        NonNull::new(stream)
            .map(|stream| Directory { stream })
            .ok_or_else(err_no)
    }

    pub fn entries(&mut self) -> DirEntries<'_> {
        DirEntries { dir: self }
    }
}

impl Drop for Directory {
    fn drop(&mut self) {
        // SAFETY: The stream came from opendir and is closed exactly once, here.
        if unsafe { libc::closedir(self.stream.as_ptr()) } == -1 {
            tracing::warn!(errno = err_no(), "failed to close directory stream");
        }
    }
}

impl Iterator for DirEntries<'_> {
    type Item = Result<DirEntry, c_int>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // A null return means either the end of the stream or an error, told apart by errno.
            syscall::clear_err_no();
            // SAFETY: The stream is open for as long as the Directory is borrowed.
            let raw = unsafe { libc::readdir(self.dir.stream.as_ptr()) };
            // SAFETY: readdir returns either null or a pointer valid until the next call.
            let Some(entry) = (unsafe { raw.as_ref() }) else {
                return match err_no() {
                    0 => None,
                    e => Some(Err(e)),
                };
            };

            // SAFETY: d_name is always nul-terminated.
            let name = unsafe { CStr::from_ptr(entry.d_name.as_ptr()) }.to_bytes();
            if name == b"." || name == b".." {
                continue;
            }

            return Some(Ok(DirEntry {
                name: OsStr::from_bytes(name).to_owned(),
                object_type: ObjectType::from_dirent_type(entry.d_type),
            }));
        }
    }
}

/// Lists the entries of a directory, sorted by name so that results don't depend on the order the
/// filesystem happens to return them in.
pub(crate) fn read_entries(dir_path: &Path) -> Result<Vec<DirEntry>, c_int> {
    let mut dir = Directory::open(dir_path)?;
    let mut entries = dir.entries().collect::<Result<Vec<_>, _>>()?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
