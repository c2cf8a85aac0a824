use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::Path;

use crate::error::NotOpenError;
use crate::fd::{Descriptor, Fd};

#[derive(Debug)]
struct Entry {
    fd: Fd,
    tag: u64,
}

/// The descriptors currently considered open, each with a tag hashed from the path it was opened
/// from. Dropping the registry closes everything still in it.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    entries: HashMap<Descriptor, Entry>,
}

impl Registry {
    pub fn insert(&mut self, fd: Fd, path: &Path) -> Descriptor {
        let descriptor = fd.descriptor();
        let tag = path_tag(path);
        tracing::debug!(%descriptor, tag, path = %path.display(), "registered descriptor");
        // The OS never hands out a live descriptor twice, so nothing can be displaced here.
        self.entries.insert(descriptor, Entry { fd, tag });
        descriptor
    }

    pub fn get(&self, descriptor: Descriptor) -> Result<&Fd, NotOpenError> {
        self.entries
            .get(&descriptor)
            .map(|entry| &entry.fd)
            .ok_or(NotOpenError { descriptor })
    }

    pub fn remove(&mut self, descriptor: Descriptor) -> Result<Fd, NotOpenError> {
        let entry = self.entries.remove(&descriptor).ok_or(NotOpenError { descriptor })?;
        tracing::debug!(%descriptor, tag = entry.tag, "unregistered descriptor");
        Ok(entry.fd)
    }

    pub fn contains(&self, descriptor: Descriptor) -> bool {
        self.entries.contains_key(&descriptor)
    }

    pub fn tag_of(&self, descriptor: Descriptor) -> Option<u64> {
        self.entries.get(&descriptor).map(|entry| entry.tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!(count = self.entries.len(), "closing outstanding descriptors");
        }
        for (_, entry) in self.entries.drain() {
            if let Err(errno) = entry.fd.close() {
                tracing::warn!(errno, tag = entry.tag, "failed to close outstanding descriptor");
            }
        }
    }
}

fn path_tag(path: &Path) -> u64 {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    hasher.finish()
}
