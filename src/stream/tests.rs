#![cfg(test)]

use std::fs;

use tempfile::tempdir;

use super::*;
use crate::CHUNK_SIZE;
use crate::error::OpenFailedError;
use crate::handler::FileHandler;

#[test]
fn test_write_data() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stream");
    let content = b"abcdefghijklmnopqrstuvwxyz";

    let mut stream = OutputStream::open(&path).unwrap();
    assert_eq!(stream.path(), path);
    assert_eq!(stream.write(content), content.len() as u64);
    stream.synchronize().unwrap();

    assert_eq!(
        FileHandler::new().read_whole_file(&path).unwrap(),
        content,
        "Synchronized writes should be visible through a separate descriptor."
    );
    stream.close().unwrap();
}

#[test]
fn test_appends_to_existing_content() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stream");
    fs::write(&path, b"head:").unwrap();
    let tail = (0..2 * CHUNK_SIZE + 1).map(|i| (i % 7) as u8 + b'0').collect::<Vec<_>>();

    let mut stream = OutputStream::open(&path).unwrap();
    assert_eq!(stream.write(&tail), tail.len() as u64);
    stream.close().unwrap();

    let mut expected = b"head:".to_vec();
    expected.extend_from_slice(&tail);
    assert_eq!(fs::read(&path).unwrap(), expected, "Streams should only ever append.");
}

#[test]
fn test_drop_flushes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stream");

    let mut stream = OutputStream::open(&path).unwrap();
    stream.write(b"buffered");
    drop(stream);

    assert_eq!(fs::read(&path).unwrap(), b"buffered", "Dropping should flush pending writes.");
}

#[test]
fn test_open_failure() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing/stream");

    assert_eq!(
        OutputStream::open(&path).unwrap_err(),
        OpenFailedError { path: path.clone() }
    );
}
