//! Incremental journal reading.
//!
//! Each call reads whatever was appended past `from_offset` and returns only
//! complete lines. A trailing fragment without `\n` stays on disk for the next
//! call; the returned offset never points into the middle of a line.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use memchr::memchr_iter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Lines { lines: Vec<String>, new_offset: u64 },
    /// The file is gone or now shorter than the offset we hold.
    Rotated,
    /// Could not read this tick (locked, permission, transient error).
    Unavailable(String),
}

pub fn poll_new_lines(path: &Path, from_offset: u64) -> ReadOutcome {
    match read_appended(path, from_offset) {
        Ok(outcome) => outcome,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "[READER] journal disappeared");
            ReadOutcome::Rotated
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "[READER] journal unreadable this tick");
            ReadOutcome::Unavailable(e.to_string())
        }
    }
}

fn read_appended(path: &Path, from_offset: u64) -> io::Result<ReadOutcome> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    if len < from_offset {
        tracing::debug!(
            path = %path.display(),
            len,
            from_offset,
            "[READER] journal shrank below offset"
        );
        return Ok(ReadOutcome::Rotated);
    }
    if len == from_offset {
        return Ok(ReadOutcome::Lines {
            lines: Vec::new(),
            new_offset: from_offset,
        });
    }

    file.seek(SeekFrom::Start(from_offset))?;
    let mut bytes = Vec::with_capacity((len - from_offset) as usize);
    // Only what existed at stat time; anything appended since waits for the next tick.
    file.take(len - from_offset).read_to_end(&mut bytes)?;

    let (lines, consumed) = split_complete_lines(&bytes);
    Ok(ReadOutcome::Lines {
        lines,
        new_offset: from_offset + consumed as u64,
    })
}

/// Split `bytes` on `\n`, returning every complete line and the number of
/// bytes they span. `\r\n` endings are accepted and empty lines dropped.
pub(crate) fn split_complete_lines(bytes: &[u8]) -> (Vec<String>, usize) {
    let mut lines = Vec::new();
    let mut start = 0;
    for end in memchr_iter(b'\n', bytes) {
        let mut line = &bytes[start..end];
        if let Some(stripped) = line.strip_suffix(b"\r") {
            line = stripped;
        }
        if !line.is_empty() {
            lines.push(String::from_utf8_lossy(line).into_owned());
        }
        start = end + 1;
    }
    (lines, start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, OpenOptions};
    use std::io::Write;

    fn lines_of(outcome: ReadOutcome) -> (Vec<String>, u64) {
        match outcome {
            ReadOutcome::Lines { lines, new_offset } => (lines, new_offset),
            other => panic!("expected lines, got {other:?}"),
        }
    }

    #[test]
    fn test_split_holds_back_partial_line() {
        let (lines, consumed) = split_complete_lines(b"one\r\ntwo\n\nthr");
        assert_eq!(lines, vec!["one", "two"]);
        assert_eq!(consumed, 10);
    }

    #[test]
    fn test_split_never_cuts_a_character() {
        let text = "{\"s\":\"Ésprit\"}\n{\"s\":\"☄".as_bytes();
        let (lines, consumed) = split_complete_lines(text);
        assert_eq!(lines, vec!["{\"s\":\"Ésprit\"}"]);
        assert_eq!(&text[..consumed], "{\"s\":\"Ésprit\"}\n".as_bytes());
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let (lines, _) = split_complete_lines(b"ab\xffcd\n");
        assert_eq!(lines, vec!["ab\u{FFFD}cd"]);
    }

    #[test]
    fn test_incremental_reads_resume_at_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Journal.2024-01-01T1000.log");
        fs::write(&path, "first\nsec").unwrap();

        let (lines, offset) = lines_of(poll_new_lines(&path, 0));
        assert_eq!(lines, vec!["first"]);
        assert_eq!(offset, 6);

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"ond\nthird\n").unwrap();

        let (lines, offset) = lines_of(poll_new_lines(&path, offset));
        assert_eq!(lines, vec!["second", "third"]);
        assert_eq!(offset, 19);

        let (lines, same) = lines_of(poll_new_lines(&path, offset));
        assert!(lines.is_empty());
        assert_eq!(same, offset);
    }

    #[test]
    fn test_shrunk_or_missing_file_is_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Journal.2024-01-01T1000.log");
        fs::write(&path, "abc\n").unwrap();
        assert_eq!(poll_new_lines(&path, 100), ReadOutcome::Rotated);

        fs::remove_file(&path).unwrap();
        assert_eq!(poll_new_lines(&path, 0), ReadOutcome::Rotated);
    }

    #[test]
    fn test_unreadable_path_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep"), "x").unwrap();
        match poll_new_lines(dir.path(), 0) {
            ReadOutcome::Unavailable(reason) => assert!(!reason.is_empty()),
            other => panic!("expected unavailable, got {other:?}"),
        }
    }
}
