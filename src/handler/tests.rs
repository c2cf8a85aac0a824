#![cfg(test)]

use std::fs;
use std::mem::MaybeUninit;
use std::os::unix::fs::MetadataExt;

use tempfile::tempdir;

use super::*;
use crate::error::{NotOpenError, OpenFailedError};
use crate::object::FileSystem;
use crate::{CHUNK_SIZE, Descriptor};

fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[test]
fn test_open_and_close() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("file");
    let mut handler = FileHandler::new();

    let fd = handler.open_for_updating(&path).unwrap();
    assert!(path.exists(), "Opening for updating should create a missing file.");
    assert!(handler.is_open(fd));
    assert!(handler.tag_of(fd).is_some(), "Open descriptors should carry a tag.");
    assert_eq!(handler.open_count(), 1);

    handler.close(fd).unwrap();
    assert!(!handler.is_open(fd));
    assert_eq!(handler.tag_of(fd), None);
    assert_eq!(
        handler.close(fd),
        Err(NotOpenError { descriptor: fd }),
        "Closing twice should be rejected."
    );
}

#[test]
fn test_tag_depends_on_path() {
    let dir = tempdir().unwrap();
    let mut handler = FileHandler::new();

    let a = handler.open_for_updating(dir.path().join("a")).unwrap();
    let b = handler.open_for_updating(dir.path().join("b")).unwrap();
    let a_again = handler.open_for_reading(dir.path().join("a")).unwrap();

    assert_ne!(handler.tag_of(a), handler.tag_of(b));
    assert_eq!(
        handler.tag_of(a),
        handler.tag_of(a_again),
        "The same path should produce the same tag."
    );
    assert_eq!(handler.open_count(), 3);
}

#[test]
fn test_open_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing");
    let mut handler = FileHandler::new();

    assert_eq!(
        handler.open_for_reading(&path),
        Err(OpenFailedError { path: path.clone() }),
        "Opening a missing file for reading should fail."
    );
    assert_eq!(handler.open_count(), 0);
    assert!(
        handler.read_whole_file(&path).unwrap_err().is_open_failed(),
        "Path-based reads should report the open failure."
    );
}

#[test]
fn test_unregistered_descriptor() {
    let dir = tempdir().unwrap();
    let mut handler = FileHandler::new();

    let closed = handler.open_for_updating(dir.path().join("file")).unwrap();
    handler.close(closed).unwrap();

    for fd in [Descriptor::from_raw(0), Descriptor::from_raw(4096), closed] {
        let not_open = DescriptorError::NotOpen(NotOpenError { descriptor: fd });
        assert_eq!(handler.read_whole(fd, false), Err(not_open.clone()));
        assert_eq!(handler.read_range(fd, 0, 10, false), Err(not_open.clone()));
        assert_eq!(handler.write_at(fd, 0, b"data", false), Err(not_open.clone()));
        assert_eq!(handler.append(fd, b"data", true), Err(not_open.clone()));
        assert_eq!(handler.truncate(fd, 0, false), Err(not_open));
        assert_eq!(handler.close(fd), Err(NotOpenError { descriptor: fd }));
    }
}

#[test]
fn test_write_then_read_whole() {
    let dir = tempdir().unwrap();
    let mut handler = FileHandler::new();

    for len in [0, 1, CHUNK_SIZE - 1, CHUNK_SIZE, CHUNK_SIZE + 1, 3 * CHUNK_SIZE + 17] {
        let path = dir.path().join(format!("file-{len}"));
        let payload = patterned(len);

        assert_eq!(
            handler.write_file_at(&path, 0, &payload).unwrap(),
            len as u64,
            "All {len} bytes should be reported as written."
        );
        assert_eq!(
            handler.read_whole_file(&path).unwrap(),
            payload,
            "Reading back {len} bytes should return exactly what was written."
        );
    }
    assert_eq!(handler.open_count(), 0, "Path-based operations should close their descriptors.");
}

#[test]
fn test_read_whole_ignores_position() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("file");
    fs::write(&path, b"hello world").unwrap();
    let mut handler = FileHandler::new();

    let fd = handler.open_for_reading(&path).unwrap();
    assert_eq!(handler.read_range(fd, 6, 11, false).unwrap(), b"world");
    assert_eq!(
        handler.read_whole(fd, false).unwrap(),
        b"hello world",
        "Whole reads should start from the beginning of the file."
    );
    assert!(handler.is_open(fd), "The descriptor should stay open without close_after.");

    handler.read_whole(fd, true).unwrap();
    assert!(!handler.is_open(fd), "close_after should close the descriptor.");
}

#[test]
fn test_read_range() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("file");
    let content = patterned(5 * CHUNK_SIZE);
    fs::write(&path, &content).unwrap();
    let mut handler = FileHandler::new();
    let len = content.len() as u64;

    for (start, end) in [
        (0, 0),
        (0, 10),
        (100, CHUNK_SIZE as u64 + 100),
        (CHUNK_SIZE as u64 - 1, 3 * CHUNK_SIZE as u64 + 1),
        (0, len),
    ] {
        assert_eq!(
            handler.read_file_range(&path, start, end).unwrap(),
            &content[start as usize..end as usize],
            "Range [{start}, {end}) should match the file content."
        );
    }

    assert_eq!(
        handler.read_file_range(&path, len - 5, len + 100).unwrap(),
        &content[content.len() - 5..],
        "Ranges past the end of the file should return the available bytes."
    );
    assert!(
        handler.read_file_range(&path, 20, 10).unwrap().is_empty(),
        "Inverted ranges should be empty."
    );
}

#[test]
fn test_overwrite_at_offset() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("x");
    assert!(FileSystem::new().create_file(&path, Some(b"abc".as_slice())));
    let mut handler = FileHandler::new();

    assert_eq!(handler.write_file_at(&path, 1, b"Z").unwrap(), 1);
    assert_eq!(
        handler.read_whole_file(&path).unwrap(),
        b"aZc",
        "Writing at an offset should overwrite rather than insert."
    );
}

#[test]
fn test_write_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("file");
    fs::write(&path, b"keep").unwrap();
    let mut handler = FileHandler::new();

    assert_eq!(handler.write_file_at(&path, 2, b"").unwrap(), 0);
    assert_eq!(handler.append_to_file(&path, b"").unwrap(), 0);
    assert_eq!(fs::read(&path).unwrap(), b"keep");
}

#[test]
fn test_append() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("file");
    fs::write(&path, b"abc").unwrap();
    let mut handler = FileHandler::new();

    assert_eq!(handler.append_to_file(&path, b"def").unwrap(), 3);

    let fd = handler.open_for_updating(&path).unwrap();
    let tail = patterned(2 * CHUNK_SIZE + 3);
    assert_eq!(handler.append(fd, &tail, false).unwrap(), tail.len() as u64);

    let mut expected = b"abcdef".to_vec();
    expected.extend_from_slice(&tail);
    assert_eq!(handler.read_whole(fd, true).unwrap(), expected);
}

#[test]
fn test_truncate() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("file");
    fs::write(&path, b"0123456789").unwrap();
    let mut handler = FileHandler::new();

    handler.truncate_file(&path, 4).unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"0123");

    let fd = handler.open_for_updating(&path).unwrap();
    handler.truncate(fd, 8, false).unwrap();
    assert_eq!(
        handler.read_whole(fd, true).unwrap(),
        b"0123\0\0\0\0",
        "Extending a file should fill the gap with zeros."
    );
}

#[test]
fn test_close_after_failure() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("file");
    fs::write(&path, b"read only").unwrap();
    let mut handler = FileHandler::new();

    let fd = handler.open_for_reading(&path).unwrap();
    assert!(
        handler.write_at(fd, 0, b"x", true).unwrap_err().is_io(),
        "Writing through a read-only descriptor should fail at the OS level."
    );
    assert!(!handler.is_open(fd), "close_after should apply even when the operation fails.");
    assert_eq!(fs::read(&path).unwrap(), b"read only");
}

/// Whether `fd` is still an open descriptor for the file with inode `ino`. Other tests run in
/// parallel and may be handed the same number once it is released, hence the inode check.
fn refers_to(fd: Descriptor, ino: u64) -> bool {
    let mut raw = MaybeUninit::<libc::stat>::uninit();
    // SAFETY: raw is valid for writes of a stat struct.
    if unsafe { libc::fstat(fd.raw(), raw.as_mut_ptr()) } == -1 {
        return false;
    }
    // SAFETY: fstat succeeded, so raw is initialized.
    unsafe { raw.assume_init() }.st_ino as u64 == ino
}

#[test]
fn test_drop_releases_descriptors() {
    let dir = tempdir().unwrap();
    let mut handler = FileHandler::new();

    let opened = ["a", "b", "c"]
        .into_iter()
        .map(|name| {
            let path = dir.path().join(name);
            let fd = handler.open_for_updating(&path).unwrap();
            (fd, fs::metadata(&path).unwrap().ino())
        })
        .collect::<Vec<_>>();
    assert_eq!(handler.open_count(), 3);
    for &(fd, ino) in &opened {
        assert!(refers_to(fd, ino), "Descriptor {fd} should be open while the handler lives.");
    }

    drop(handler);

    for (fd, ino) in opened {
        assert!(!refers_to(fd, ino), "Dropping the handler should close descriptor {fd}.");
    }
}
