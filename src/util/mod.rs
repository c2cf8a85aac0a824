pub mod fmt;
pub mod sealed;
pub mod syscall;
