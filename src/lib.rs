//! A thin, strongly typed layer over the POSIX file APIs.
//!
//! # Purpose
//! This crate wraps the handful of syscalls needed to manage files and the objects around them, and
//! exposes them through two services:
//! - [`FileHandler`](handler::FileHandler) owns a registry of open descriptors and performs
//!   buffered reads and writes through them.
//! - [`FileSystem`](object::FileSystem) works on paths: attributes, listing, links, copies, moves,
//!   deletion and creation.
//!
//! With the `stream` feature (on by default), [`OutputStream`](stream::OutputStream) adds a
//! buffered, append-only stdio stream.
//!
//! # Error Handling
//! Errors are strongly typed, using enums for static dispatch rather than dynamic. Every failure
//! that can be named is a struct in [`error`] carrying the path or descriptor involved, and each
//! operation returns a union of exactly the leaf errors it can produce. The raw `errno` is not part
//! of an error's identity; it is logged through `tracing` at the point of failure instead.
//!
//! Predicates such as [`FileSystem::exists`](object::FileSystem::exists) and
//! [`FileSystem::create_file`](object::FileSystem::create_file) report failure as `false` rather
//! than as an error.
//!
//! # Dependencies
//! The crate relies on `libc` for its syscall wrappers and on `derive_more` to remove the need for
//! some very repetitive error boilerplate. Diagnostics go through `tracing`, so they only show up
//! when the application installs a subscriber.
//!
//! # Platforms
//! Linux and Apple targets are supported. Creation times are only reported on Apple targets.
#![cfg(any(target_os = "linux", target_vendor = "apple"))]
#![warn(clippy::missing_safety_doc)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![warn(clippy::missing_const_for_fn)]
#![warn(clippy::missing_panics_doc)]
#![warn(clippy::unwrap_used)]
#![allow(clippy::module_inception)]

pub mod error;
pub mod handler;
pub mod object;
#[cfg(feature = "stream")]
pub mod stream;

mod attributes;
mod fd;
mod object_type;
pub(crate) mod util;

pub use attributes::Attributes;
pub use fd::Descriptor;
pub use handler::FileHandler;
pub use object::FileSystem;
pub use object_type::ObjectType;
#[cfg(feature = "stream")]
pub use stream::OutputStream;

/// The size of the buffer used to move file content, for reads, writes and copies alike.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// The mode new files are created with, before the process umask is applied.
pub const FILE_MODE: libc::mode_t = 0o666;

/// The mode new directories are created with, before the process umask is applied.
pub const DIR_MODE: libc::mode_t = 0o777;
