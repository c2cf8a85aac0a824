use std::fmt::Debug;

use libc::{O_CREAT, O_RDONLY, O_RDWR, O_WRONLY, c_int};

use crate::util::sealed::Sealed;

/// The flags a [`FileHandler`](super::FileHandler) opens a file with. Each mode is a zero-variant
/// enum, so the choice is made at compile time and routed through a single open primitive.
pub trait OpenMode: Sealed + Debug {
    const FLAGS: c_int;
}

/// Read an existing file.
#[derive(Debug)]
pub enum Reading {}

impl Sealed for Reading {}

impl OpenMode for Reading {
    const FLAGS: c_int = O_RDONLY;
}

/// Read and write, creating the file if it is missing.
#[derive(Debug)]
pub enum Updating {}

impl Sealed for Updating {}

impl OpenMode for Updating {
    const FLAGS: c_int = O_RDWR | O_CREAT;
}

/// Write only, creating the file if it is missing.
#[derive(Debug)]
pub enum Writing {}

impl Sealed for Writing {}

impl OpenMode for Writing {
    const FLAGS: c_int = O_WRONLY | O_CREAT;
}
