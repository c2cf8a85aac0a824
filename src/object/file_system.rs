use std::path::{Path, PathBuf};
use std::time::SystemTime;

use libc::{O_CREAT, O_EXCL, O_RDONLY, O_TRUNC, O_WRONLY, R_OK, W_OK, X_OK, c_int, mode_t};

use super::dir;
use super::{CopyError, CreateDirError, DeleteError, HardlinkError, MoveError, SymlinkError};
use crate::error::{
    AttributesError, CopyFailedError, CreateFailedError, DeleteFailedError, DirContentsError,
    ExistingObjectError, HardlinkFailedError, MissingObjectError, MoveFailedError, SymlinkFailedError,
};
use crate::fd::Fd;
use crate::util::syscall;
use crate::{Attributes, CHUNK_SIZE, DIR_MODE, FILE_MODE, ObjectType};

/// Path-based operations on whole filesystem objects.
///
/// `FileSystem` holds no state of its own: every query goes straight to the OS and nothing is
/// cached. None of its methods follow a symlink given as the object being operated on.
///
/// Operations that place a new object (links, copies and moves) come in two forms. The plain form
/// takes the exact destination path, which must be free and sit in a writable directory. The `_in`
/// or `_into` form takes a writable directory and places the object inside it under the source's
/// base name.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSystem;

/// Where a link, copy or move should end up.
#[derive(Debug, Clone, Copy)]
enum Destination<'a> {
    At(&'a Path),
    Inside(&'a Path),
}

impl Destination<'_> {
    const fn path(&self) -> &Path {
        match self {
            Destination::At(path) | Destination::Inside(path) => *path,
        }
    }
}

impl FileSystem {
    pub const fn new() -> FileSystem {
        FileSystem
    }

    /// The process's current working directory, as reported by the OS. Returns `None` if it can't
    /// be determined, e.g. because it has been removed.
    pub fn work_path(&self) -> Option<PathBuf> {
        syscall::getcwd().ok()
    }

    /// Whether anything exists at the path. A dangling symlink exists.
    pub fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        syscall::lstat(path.as_ref()).is_ok()
    }

    pub fn is_readable<P: AsRef<Path>>(&self, path: P) -> bool {
        syscall::access(path.as_ref(), R_OK)
    }

    pub fn is_writable<P: AsRef<Path>>(&self, path: P) -> bool {
        syscall::access(path.as_ref(), W_OK)
    }

    pub fn is_executable<P: AsRef<Path>>(&self, path: P) -> bool {
        syscall::access(path.as_ref(), X_OK)
    }

    pub fn attributes_of<P: AsRef<Path>>(&self, path: P) -> Result<Attributes, AttributesError> {
        let path = path.as_ref();
        match syscall::lstat(path) {
            Ok(raw) => Ok(Attributes::from_stat(&raw)),
            Err(errno) => {
                tracing::debug!(path = %path.display(), errno, "lstat failed");
                Err(AttributesError { path: path.to_owned() })
            },
        }
    }

    pub fn type_of<P: AsRef<Path>>(&self, path: P) -> Option<ObjectType> {
        self.attributes_of(path).ok().map(|attr| attr.object_type)
    }

    pub fn size_of<P: AsRef<Path>>(&self, path: P) -> Option<u64> {
        self.attributes_of(path).ok().map(|attr| attr.size)
    }

    pub fn accessed_at<P: AsRef<Path>>(&self, path: P) -> Option<SystemTime> {
        self.attributes_of(path).ok().map(|attr| attr.accessed)
    }

    pub fn modified_at<P: AsRef<Path>>(&self, path: P) -> Option<SystemTime> {
        self.attributes_of(path).ok().map(|attr| attr.modified)
    }

    pub fn permissions_of<P: AsRef<Path>>(&self, path: P) -> Option<u16> {
        self.attributes_of(path).ok().map(|attr| attr.permissions)
    }

    /// Lists the directory's entries as paths relative to it, excluding `.` and `..`.
    ///
    /// Entries are sorted by name. With `recursive`, each subdirectory is followed immediately by
    /// its own contents (`sub`, `sub/a`, `sub/b`, ...). Symlinks to directories are listed but
    /// never descended into.
    pub fn list_directory<P: AsRef<Path>>(&self, path: P, recursive: bool) -> Result<Vec<PathBuf>, DirContentsError> {
        let path = path.as_ref();
        let mut children = Vec::new();
        collect_children(path, Path::new(""), recursive, &mut children).map_err(|errno| {
            tracing::debug!(path = %path.display(), errno, "listing directory failed");
            DirContentsError { path: path.to_owned() }
        })?;
        Ok(children)
    }

    /// Creates a symlink at `at` pointing to `of`, which must exist.
    pub fn create_symlink<P: AsRef<Path>, Q: AsRef<Path>>(&self, at: P, of: Q) -> Result<(), SymlinkError> {
        self.symlink_to(of.as_ref(), Destination::At(at.as_ref())).map(drop)
    }

    /// Creates a symlink to `of` inside the directory `dir`, named after `of`. Returns the path of
    /// the new link.
    pub fn create_symlink_in<P: AsRef<Path>, Q: AsRef<Path>>(&self, dir: P, of: Q) -> Result<PathBuf, SymlinkError> {
        self.symlink_to(of.as_ref(), Destination::Inside(dir.as_ref()))
    }

    /// Creates a hard link at `at` to the object `of`, which must exist.
    pub fn create_hard_link<P: AsRef<Path>, Q: AsRef<Path>>(&self, at: P, of: Q) -> Result<(), HardlinkError> {
        self.hard_link_to(of.as_ref(), Destination::At(at.as_ref())).map(drop)
    }

    /// Creates a hard link to `of` inside the directory `dir`, named after `of`. Returns the path
    /// of the new link.
    pub fn create_hard_link_in<P: AsRef<Path>, Q: AsRef<Path>>(&self, dir: P, of: Q) -> Result<PathBuf, HardlinkError> {
        self.hard_link_to(of.as_ref(), Destination::Inside(dir.as_ref()))
    }

    /// Deletes the object, emptying directories recursively first. Symlinks are removed
    /// themselves, never their targets.
    pub fn delete<P: AsRef<Path>>(&self, path: P) -> Result<(), DeleteError> {
        let path = path.as_ref();
        self.require_exists(path)?;
        tracing::debug!(path = %path.display(), "deleting object");

        remove_item(path).map_err(|errno| {
            tracing::debug!(path = %path.display(), errno, "delete failed");
            DeleteFailedError { path: path.to_owned() }
        })?;
        Ok(())
    }

    /// Copies the object to `to`, recreating directories and duplicating the bytes of regular
    /// files. A symlink is copied as a new link to the same target, not as the target's content.
    ///
    /// A directory can't be copied anywhere inside itself.
    pub fn copy<P: AsRef<Path>, Q: AsRef<Path>>(&self, from: P, to: Q) -> Result<(), CopyError> {
        self.copy_to(from.as_ref(), Destination::At(to.as_ref())).map(drop)
    }

    /// Copies the object into the directory `dir`, keeping its base name. Returns the path of the
    /// copy.
    pub fn copy_into<P: AsRef<Path>, Q: AsRef<Path>>(&self, from: P, dir: Q) -> Result<PathBuf, CopyError> {
        self.copy_to(from.as_ref(), Destination::Inside(dir.as_ref()))
    }

    /// Moves the object to `to`. This is a copy followed by a delete, not a rename: it works
    /// across devices but isn't atomic, and a failure part way through can leave a partial copy.
    /// A directory can't be moved anywhere inside itself.
    pub fn move_object<P: AsRef<Path>, Q: AsRef<Path>>(&self, from: P, to: Q) -> Result<(), MoveError> {
        self.move_to(from.as_ref(), Destination::At(to.as_ref())).map(drop)
    }

    /// Moves the object into the directory `dir`, keeping its base name. Returns the new path.
    pub fn move_into<P: AsRef<Path>, Q: AsRef<Path>>(&self, from: P, dir: Q) -> Result<PathBuf, MoveError> {
        self.move_to(from.as_ref(), Destination::Inside(dir.as_ref()))
    }

    /// Creates a directory with mode [`DIR_MODE`]. The parent must already exist and be writable.
    pub fn create_directory<P: AsRef<Path>>(&self, path: P) -> Result<(), CreateDirError> {
        let path = path.as_ref();
        if self.exists(path) {
            Err(ExistingObjectError { path: path.to_owned() })?
        }

        let failed = || CreateFailedError { path: path.to_owned() };
        if !self.directory_ready_for_write(parent_of(path)) {
            Err(failed())?
        }
        syscall::mkdir(path, DIR_MODE).map_err(|errno| {
            tracing::debug!(path = %path.display(), errno, "mkdir failed");
            failed()
        })?;
        Ok(())
    }

    /// Creates the file with mode [`FILE_MODE`], or empties it if it already exists, then writes
    /// `content` with a single write call. Returns whether both steps fully succeeded.
    pub fn create_file<P: AsRef<Path>>(&self, path: P, content: Option<&[u8]>) -> bool {
        let path = path.as_ref();
        let fd = match Fd::open(path, O_WRONLY | O_CREAT | O_TRUNC, FILE_MODE) {
            Ok(fd) => fd,
            Err(errno) => {
                tracing::debug!(path = %path.display(), errno, "creating file failed");
                return false;
            },
        };

        let Some(content) = content else {
            return true;
        };
        match fd.write(content) {
            Ok(count) => count == content.len(),
            Err(errno) => {
                tracing::debug!(path = %path.display(), errno, "writing new file failed");
                false
            },
        }
    }

    fn symlink_to(&self, of: &Path, destination: Destination<'_>) -> Result<PathBuf, SymlinkError> {
        self.require_exists(of)?;
        let failed = || SymlinkFailedError { from: of.to_owned(), to: destination.path().to_owned() };

        let at = self.resolve(of, destination).ok_or_else(failed)?;
        syscall::symlink(of, &at).map_err(|errno| {
            tracing::debug!(of = %of.display(), at = %at.display(), errno, "symlink failed");
            failed()
        })?;
        Ok(at)
    }

    fn hard_link_to(&self, of: &Path, destination: Destination<'_>) -> Result<PathBuf, HardlinkError> {
        self.require_exists(of)?;
        let failed = || HardlinkFailedError { from: of.to_owned(), to: destination.path().to_owned() };

        let at = self.resolve(of, destination).ok_or_else(failed)?;
        syscall::link(of, &at).map_err(|errno| {
            tracing::debug!(of = %of.display(), at = %at.display(), errno, "link failed");
            failed()
        })?;
        Ok(at)
    }

    fn copy_to(&self, from: &Path, destination: Destination<'_>) -> Result<PathBuf, CopyError> {
        self.require_exists(from)?;
        let failed = || CopyFailedError { from: from.to_owned(), to: destination.path().to_owned() };

        let to = self.resolve(from, destination).ok_or_else(failed)?;
        if nests_inside(&to, from) {
            tracing::debug!(from = %from.display(), to = %to.display(), "refusing to copy into own subtree");
            Err(failed())?
        }
        tracing::debug!(from = %from.display(), to = %to.display(), "copying object");
        copy_item(from, &to).map_err(|errno| {
            tracing::debug!(from = %from.display(), to = %to.display(), errno, "copy failed");
            failed()
        })?;
        Ok(to)
    }

    fn move_to(&self, from: &Path, destination: Destination<'_>) -> Result<PathBuf, MoveError> {
        self.require_exists(from)?;
        let failed = || MoveFailedError { from: from.to_owned(), to: destination.path().to_owned() };

        let to = self.resolve(from, destination).ok_or_else(failed)?;
        if nests_inside(&to, from) {
            tracing::debug!(from = %from.display(), to = %to.display(), "refusing to move into own subtree");
            Err(failed())?
        }
        tracing::debug!(from = %from.display(), to = %to.display(), "moving object");
        copy_item(from, &to).and_then(|()| remove_item(from)).map_err(|errno| {
            tracing::debug!(from = %from.display(), to = %to.display(), errno, "move failed");
            failed()
        })?;
        Ok(to)
    }

    fn require_exists(&self, path: &Path) -> Result<(), MissingObjectError> {
        if self.exists(path) {
            Ok(())
        } else {
            Err(MissingObjectError { path: path.to_owned() })
        }
    }

    fn directory_ready_for_write(&self, path: &Path) -> bool {
        self.type_of(path) == Some(ObjectType::Directory) && self.is_writable(path)
    }

    /// Turns a destination into the path the new object will have, or `None` if it can't be placed
    /// there: the path is taken, the directory isn't writable, or `object` has no base name.
    fn resolve(&self, object: &Path, destination: Destination<'_>) -> Option<PathBuf> {
        let target = match destination {
            Destination::At(path) => {
                if !self.directory_ready_for_write(parent_of(path)) {
                    return None;
                }
                path.to_owned()
            },
            Destination::Inside(dir) => {
                if !self.directory_ready_for_write(dir) {
                    return None;
                }
                dir.join(object.file_name()?)
            },
        };
        (!self.exists(&target)).then_some(target)
    }
}

fn parent_of(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn lstat_type(path: &Path) -> Result<ObjectType, c_int> {
    syscall::lstat(path).map(|raw| ObjectType::from_stat_mode(raw.st_mode))
}

/// Whether `target` would end up inside the directory `object`, once symlinks in either path are
/// resolved. Paths that can't be resolved count as nested, so the operation is refused.
fn nests_inside(target: &Path, object: &Path) -> bool {
    if !matches!(lstat_type(object), Ok(ObjectType::Directory)) {
        return false;
    }
    match (syscall::realpath(object), syscall::realpath(parent_of(target))) {
        (Ok(object), Ok(parent)) => parent.starts_with(object),
        _ => true,
    }
}

fn collect_children(dir_path: &Path, prefix: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> Result<(), c_int> {
    for entry in dir::read_entries(dir_path)? {
        let relative = prefix.join(&entry.name);
        out.push(relative.clone());

        if recursive {
            let full = dir_path.join(&entry.name);
            let object_type = match entry.object_type {
                Some(object_type) => object_type,
                None => lstat_type(&full)?,
            };
            if object_type.is_directory() {
                collect_children(&full, &relative, true, out)?;
            }
        }
    }
    Ok(())
}

fn remove_item(path: &Path) -> Result<(), c_int> {
    if !lstat_type(path)?.is_directory() {
        return syscall::unlink(path);
    }

    for entry in dir::read_entries(path)? {
        remove_item(&path.join(&entry.name))?;
    }
    syscall::rmdir(path)
}

fn copy_item(from: &Path, to: &Path) -> Result<(), c_int> {
    match lstat_type(from)? {
        ObjectType::Directory => {
            let children = dir::read_entries(from)?;
            syscall::mkdir(to, DIR_MODE)?;
            for child in children {
                copy_item(&from.join(&child.name), &to.join(&child.name))?;
            }
            Ok(())
        },
        ObjectType::Regular => copy_file(from, to),
        ObjectType::Symlink => syscall::symlink(&syscall::readlink(from)?, to),
        other => {
            tracing::debug!(path = %from.display(), object_type = %other, "can't copy object type");
            Err(libc::ENOTSUP)
        },
    }
}

#[allow(clippy::unnecessary_cast)]
fn copy_file(from: &Path, to: &Path) -> Result<(), c_int> {
    let input = Fd::open(from, O_RDONLY, 0)?;
    let raw = input.stat()?;
    let output = Fd::open(to, O_WRONLY | O_CREAT | O_EXCL, (raw.st_mode & 0o7777) as mode_t)?;

    let size = raw.st_size.max(0) as u64;
    let mut done = 0_u64;
    let mut buf = [0_u8; CHUNK_SIZE];
    while done < size {
        let count = input.read(&mut buf)?;
        // The source shrank while it was being copied.
        if count == 0 {
            break;
        }
        if output.write_all(&buf[..count])? < count {
            return Err(libc::EIO);
        }
        done += count as u64;
    }
    tracing::trace!(from = %from.display(), to = %to.display(), done, "copied file");

    // Close explicitly, since a deferred write error on the copy would otherwise go unnoticed.
    output.close()
}
