use std::fmt::{self, Debug, Formatter};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use libc::stat as Stat;

use crate::ObjectType;
use crate::util::fmt::OctalMode;

/// A snapshot of an object's attributes, taken with `lstat`. Attributes are never cached: every
/// call to [`FileSystem::attributes_of`](crate::object::FileSystem::attributes_of) re-fetches them.
#[derive(Clone, PartialEq)]
pub struct Attributes {
    pub object_type: ObjectType,
    pub size: u64,
    pub accessed: SystemTime,
    pub modified: SystemTime,
    /// Birth time, only reported by Darwin.
    pub created: Option<SystemTime>,
    /// The permission bits of `st_mode`, including setuid, setgid and sticky.
    pub permissions: u16,
    pub uid: u32,
    pub gid: u32,
    pub links: u64,
    pub inode: u64,
}

struct Timestamps {
    accessed: SystemTime,
    modified: SystemTime,
    created: Option<SystemTime>,
}

impl Attributes {
    #[allow(clippy::unnecessary_cast)]
    pub(crate) fn from_stat(raw: &Stat) -> Attributes {
        let times = timestamps(raw);
        Attributes {
            object_type: ObjectType::from_stat_mode(raw.st_mode),
            size: raw.st_size.max(0) as u64,
            accessed: times.accessed,
            modified: times.modified,
            created: times.created,
            permissions: (raw.st_mode & 0o7777) as u16,
            uid: raw.st_uid,
            gid: raw.st_gid,
            links: raw.st_nlink as u64,
            inode: raw.st_ino as u64,
        }
    }
}

#[allow(clippy::unnecessary_cast)]
fn to_system_time(secs: i64, nsecs: i64) -> SystemTime {
    let nanos = Duration::from_nanos(nsecs.clamp(0, 999_999_999) as u64);
    if secs >= 0 {
        UNIX_EPOCH + Duration::from_secs(secs as u64) + nanos
    } else {
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs()) + nanos
    }
}

#[cfg(target_vendor = "apple")]
#[allow(clippy::unnecessary_cast)]
fn timestamps(raw: &Stat) -> Timestamps {
    Timestamps {
        accessed: to_system_time(raw.st_atime as i64, raw.st_atime_nsec as i64),
        modified: to_system_time(raw.st_mtime as i64, raw.st_mtime_nsec as i64),
        created: Some(to_system_time(raw.st_birthtime as i64, raw.st_birthtime_nsec as i64)),
    }
}

// Linux doesn't expose a birth time through stat, only through statx.
#[cfg(not(target_vendor = "apple"))]
#[allow(clippy::unnecessary_cast)]
fn timestamps(raw: &Stat) -> Timestamps {
    Timestamps {
        accessed: to_system_time(raw.st_atime as i64, raw.st_atime_nsec as i64),
        modified: to_system_time(raw.st_mtime as i64, raw.st_mtime_nsec as i64),
        created: None,
    }
}

impl Debug for Attributes {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attributes")
            .field("object_type", &self.object_type)
            .field("size", &self.size)
            .field("accessed", &self.accessed)
            .field("modified", &self.modified)
            .field("created", &self.created)
            .field("permissions", &OctalMode(self.permissions as u32))
            .field("uid", &self.uid)
            .field("gid", &self.gid)
            .field("links", &self.links)
            .field("inode", &self.inode)
            .finish()
    }
}
