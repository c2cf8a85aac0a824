use derive_more::{Display, IsVariant};

/// The kind of a filesystem object, as reported without following symlinks.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, IsVariant)]
pub enum ObjectType {
    Directory,
    Regular,
    Symlink,
    Socket,
    CharSpecial,
    BlockSpecial,
    /// FIFOs and anything the platform reports that doesn't fit the other variants.
    Unknown,
}

use ObjectType::*;

impl ObjectType {
    #[inline(always)]
    #[allow(clippy::unnecessary_cast)]
    pub(crate) const fn from_stat_mode(st_mode: libc::mode_t) -> ObjectType {
        match st_mode & libc::S_IFMT {
            libc::S_IFDIR => Directory,
            libc::S_IFREG => Regular,
            libc::S_IFLNK => Symlink,
            libc::S_IFSOCK => Socket,
            libc::S_IFCHR => CharSpecial,
            libc::S_IFBLK => BlockSpecial,
            _ => Unknown,
        }
    }

    /// Returns `None` if the directory entry doesn't carry a type, in which case the caller needs
    /// to fall back to `lstat`.
    pub(crate) const fn from_dirent_type(d_type: u8) -> Option<ObjectType> {
        Some(match d_type {
            libc::DT_DIR => Directory,
            libc::DT_REG => Regular,
            libc::DT_LNK => Symlink,
            libc::DT_SOCK => Socket,
            libc::DT_CHR => CharSpecial,
            libc::DT_BLK => BlockSpecial,
            libc::DT_UNKNOWN => return None,
            _ => Unknown,
        })
    }
}
