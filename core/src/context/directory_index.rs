//! Journal directory listing.
//!
//! The game writes one file per session and names it after the session start:
//!
//! ```text
//! Journal.2024-01-01T1000.log          (older clients, minute precision)
//! Journal.2024-01-01T100012.01.log     (current clients, seconds + part)
//! Journal.240101100012.01.log          (legacy compact stamp)
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDateTime};

const STAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H%M%S", "%Y-%m-%dT%H%M", "%y%m%d%H%M%S"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JournalFile {
    pub path: PathBuf,
    /// Session start, from the filename or the filesystem.
    pub created: NaiveDateTime,
    /// Split part number; 0 when the filename carries none.
    pub part: u32,
}

impl JournalFile {
    /// Ordering key for "most recent": creation time, then part, then path.
    pub fn recency_key(&self) -> (NaiveDateTime, u32, &Path) {
        (self.created, self.part, self.path.as_path())
    }

    pub fn is_newer_than(&self, other: &JournalFile) -> bool {
        self.recency_key() > other.recency_key()
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

pub fn is_journal_filename(name: &str) -> bool {
    name.starts_with("Journal.") && name.ends_with(".log")
}

/// Extract `(created, part)` from a journal filename, if it carries a stamp.
pub fn parse_journal_filename(name: &str) -> Option<(NaiveDateTime, u32)> {
    let inner = name.strip_prefix("Journal.")?.strip_suffix(".log")?;
    let (stamp, part) = match inner.split_once('.') {
        Some((stamp, part)) => (stamp, part.parse::<u32>().ok()?),
        None => (inner, 0),
    };
    STAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(stamp, fmt).ok())
        .map(|created| (created, part))
}

fn filesystem_created(path: &Path) -> Option<NaiveDateTime> {
    let meta = fs::metadata(path).ok()?;
    let time: SystemTime = meta.created().or_else(|_| meta.modified()).ok()?;
    Some(DateTime::<Local>::from(time).naive_local())
}

/// List every journal file directly inside `dir`.
///
/// Entries that vanish between listing and stat are skipped.
pub fn scan_journal_files(dir: &Path) -> io::Result<Vec<JournalFile>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_journal_filename(name) {
            continue;
        }
        let parsed = parse_journal_filename(name);
        let (created, part) = match parsed {
            Some(found) => found,
            None => match filesystem_created(&path) {
                Some(created) => (created, 0),
                None => continue,
            },
        };
        files.push(JournalFile {
            path,
            created,
            part,
        });
    }
    files.sort_by(|a, b| a.recency_key().cmp(&b.recency_key()));
    Ok(files)
}
