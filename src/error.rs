use std::path::PathBuf;

use derive_more::{Display, Error};
use libc::c_int;

use crate::Descriptor;

#[derive(Debug, Display, Error, Clone, PartialEq)]
#[display("failed to open file at {}", path.display())]
pub struct OpenFailedError {
    pub path: PathBuf,
}

#[derive(Debug, Display, Error, Clone, PartialEq)]
#[display("file descriptor {descriptor} is not open")]
pub struct NotOpenError {
    pub descriptor: Descriptor,
}

#[derive(Debug, Display, Error, Clone, PartialEq)]
#[display("error during I/O on descriptor {descriptor} (os error {code})")]
pub struct IOError {
    pub descriptor: Descriptor,
    pub code: c_int,
}

#[derive(Debug, Display, Error, Clone, PartialEq)]
#[display("failed to get attributes of {}", path.display())]
pub struct AttributesError {
    pub path: PathBuf,
}

#[derive(Debug, Display, Error, Clone, PartialEq)]
#[display("failed to get contents of directory {}", path.display())]
pub struct DirContentsError {
    pub path: PathBuf,
}

#[derive(Debug, Display, Error, Clone, PartialEq)]
#[display("no object exists at {}", path.display())]
pub struct MissingObjectError {
    pub path: PathBuf,
}

#[derive(Debug, Display, Error, Clone, PartialEq)]
#[display("an object already exists at {}", path.display())]
pub struct ExistingObjectError {
    pub path: PathBuf,
}

#[derive(Debug, Display, Error, Clone, PartialEq)]
#[display("failed to create symlink of {} at {}", from.display(), to.display())]
pub struct SymlinkFailedError {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Display, Error, Clone, PartialEq)]
#[display("failed to create hard link of {} at {}", from.display(), to.display())]
pub struct HardlinkFailedError {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Display, Error, Clone, PartialEq)]
#[display("failed to delete {}", path.display())]
pub struct DeleteFailedError {
    pub path: PathBuf,
}

#[derive(Debug, Display, Error, Clone, PartialEq)]
#[display("failed to move {} to {}", from.display(), to.display())]
pub struct MoveFailedError {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Display, Error, Clone, PartialEq)]
#[display("failed to copy {} to {}", from.display(), to.display())]
pub struct CopyFailedError {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Display, Error, Clone, PartialEq)]
#[display("failed to create {}", path.display())]
pub struct CreateFailedError {
    pub path: PathBuf,
}

#[derive(Debug, Display, Error, Clone, PartialEq)]
#[display("failed to synchronize stream for {}", path.display())]
pub struct SyncFailedError {
    pub path: PathBuf,
}

#[derive(Debug, Display, Error, Clone, PartialEq)]
#[display("failed to close stream for {}", path.display())]
pub struct CloseFailedError {
    pub path: PathBuf,
}
