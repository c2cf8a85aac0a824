//! An append-only output stream, for logs and other files that only ever grow.

mod output;
mod tests;

pub use output::*;

use derive_more::{Display, Error, From, IsVariant};

use crate::error::{CloseFailedError, SyncFailedError};

#[derive(Debug, Display, Clone, PartialEq, From, Error, IsVariant)]
pub enum StreamError {
    SyncFailed(SyncFailedError),
    CloseFailed(CloseFailedError),
}
