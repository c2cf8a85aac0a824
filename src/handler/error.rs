use derive_more::{Display, Error, From, IsVariant};

use crate::error::{IOError, NotOpenError, OpenFailedError};

/// Errors from operations on an already registered descriptor.
#[derive(Debug, Display, Clone, PartialEq, From, Error, IsVariant)]
pub enum DescriptorError {
    NotOpen(NotOpenError),
    IO(IOError),
}

/// Errors from the path-based conveniences, which open the file themselves.
#[derive(Debug, Display, Clone, PartialEq, From, Error, IsVariant)]
pub enum FileError {
    OpenFailed(OpenFailedError),
    NotOpen(NotOpenError),
    IO(IOError),
}

impl From<DescriptorError> for FileError {
    fn from(value: DescriptorError) -> Self {
        match value {
            DescriptorError::NotOpen(e) => e.into(),
            DescriptorError::IO(e) => e.into(),
        }
    }
}
