//! Whole-object operations by path: attributes, listing, links, copies, moves, deletion and
//! creation. See [`FileSystem`].

mod dir;
mod error;
mod file_system;

pub use error::*;
pub use file_system::*;
