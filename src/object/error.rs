use derive_more::{Display, Error, From, IsVariant};

use crate::error::{
    CopyFailedError, CreateFailedError, DeleteFailedError, ExistingObjectError, HardlinkFailedError,
    MissingObjectError, MoveFailedError, SymlinkFailedError,
};

#[derive(Debug, Display, Clone, PartialEq, From, Error, IsVariant)]
pub enum SymlinkError {
    MissingObject(MissingObjectError),
    SymlinkFailed(SymlinkFailedError),
}

#[derive(Debug, Display, Clone, PartialEq, From, Error, IsVariant)]
pub enum HardlinkError {
    MissingObject(MissingObjectError),
    HardlinkFailed(HardlinkFailedError),
}

#[derive(Debug, Display, Clone, PartialEq, From, Error, IsVariant)]
pub enum DeleteError {
    MissingObject(MissingObjectError),
    DeleteFailed(DeleteFailedError),
}

#[derive(Debug, Display, Clone, PartialEq, From, Error, IsVariant)]
pub enum CopyError {
    MissingObject(MissingObjectError),
    CopyFailed(CopyFailedError),
}

#[derive(Debug, Display, Clone, PartialEq, From, Error, IsVariant)]
pub enum MoveError {
    MissingObject(MissingObjectError),
    MoveFailed(MoveFailedError),
}

#[derive(Debug, Display, Clone, PartialEq, From, Error, IsVariant)]
pub enum CreateDirError {
    ExistingObject(ExistingObjectError),
    CreateFailed(CreateFailedError),
}
