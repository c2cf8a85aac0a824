//! Descriptor-based file I/O, centred on the [`FileHandler`] type.
//!
//! # Registry
//! A `FileHandler` keeps track of every descriptor it has opened. Operations on a descriptor it
//! doesn't know about (never opened, or already closed) fail with
//! [`NotOpenError`](crate::error::NotOpenError) rather than being passed to the OS, so double-closes
//! and use-after-close are caught before they can hit a descriptor that has since been reused.
//!
//! # Buffered I/O
//! Reads and writes move data in chunks of [`CHUNK_SIZE`](crate::CHUNK_SIZE) bytes through a stack
//! buffer, looping until the file or the payload is exhausted.

mod error;
mod handler;
mod mode;
mod registry;
mod tests;

pub use error::*;
pub use handler::*;
pub use mode::*;
