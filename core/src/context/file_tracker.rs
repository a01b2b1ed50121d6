use std::sync::RwLock;

use super::directory_index::JournalFile;
use crate::state::{read, write};

/// The active file and how far into it we have read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFile {
    pub file: JournalFile,
    pub offset: u64,
}

#[derive(Debug, Default)]
struct TrackerState {
    current: Option<TrackedFile>,
    /// Bumped on every switch or restart, so callers can detect that the
    /// offset they hold belongs to an older file.
    generation: u64,
}

/// Keeps track of which journal is live and the byte offset into it.
///
/// File and offset are stored together behind one lock, so readers on other
/// threads never see a new file paired with the old file's offset.
#[derive(Debug, Default)]
pub struct ActiveFileTracker {
    state: RwLock<TrackerState>,
}

impl ActiveFileTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the newest file from `listing` and switch to it if it supersedes
    /// the current one. Older listings never move the tracker backwards.
    ///
    /// Returns the active file after selection.
    pub fn select_active_file(&self, listing: &[JournalFile]) -> Option<JournalFile> {
        let newest = listing.iter().max_by(|a, b| a.recency_key().cmp(&b.recency_key()));
        let mut state = write(&self.state);

        let switch_to = match (&state.current, newest) {
            (_, None) => None,
            (None, Some(newest)) => Some(newest),
            (Some(current), Some(newest)) => {
                let still_listed = listing.iter().any(|f| f.path == current.file.path);
                if newest.is_newer_than(&current.file) || !still_listed {
                    Some(newest)
                } else {
                    None
                }
            }
        };

        if let Some(next) = switch_to
            && state.current.as_ref().map(|c| &c.file.path) != Some(&next.path)
        {
            let previous = state.current.as_ref().map(|c| c.file.file_name());
            state.current = Some(TrackedFile {
                file: next.clone(),
                offset: 0,
            });
            state.generation += 1;
            tracing::info!(
                previous = previous.as_deref().unwrap_or("<none>"),
                file = %next.file_name(),
                generation = state.generation,
                "[TRACKER] now tracking journal"
            );
        }

        state.current.as_ref().map(|c| c.file.clone())
    }

    pub fn current(&self) -> Option<TrackedFile> {
        read(&self.state).current.clone()
    }

    pub fn current_file(&self) -> Option<JournalFile> {
        read(&self.state).current.as_ref().map(|c| c.file.clone())
    }

    pub fn current_offset(&self) -> u64 {
        read(&self.state).current.as_ref().map_or(0, |c| c.offset)
    }

    /// Move the read offset forward. A lower value is refused and logged.
    pub fn advance_offset(&self, new_offset: u64) -> bool {
        let mut state = write(&self.state);
        let Some(current) = state.current.as_mut() else {
            tracing::warn!(new_offset, "[TRACKER] advance with no active journal");
            return false;
        };
        if new_offset < current.offset {
            tracing::warn!(
                current = current.offset,
                requested = new_offset,
                "[TRACKER] refusing to move offset backwards"
            );
            return false;
        }
        current.offset = new_offset;
        true
    }

    /// Re-read the current file from the start after it was truncated or
    /// replaced in place.
    pub fn restart_current(&self) {
        let mut state = write(&self.state);
        let Some(current) = state.current.as_mut() else {
            return;
        };
        current.offset = 0;
        let file = current.file.file_name();
        state.generation += 1;
        tracing::info!(file = %file, generation = state.generation, "[TRACKER] restarting journal from offset 0");
    }

    pub fn generation(&self) -> u64 {
        read(&self.state).generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn journal(name: &str, hour: u32) -> JournalFile {
        JournalFile {
            path: PathBuf::from(name),
            created: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            part: 0,
        }
    }

    #[test]
    fn test_selects_newest_and_resets_offset_on_switch() {
        let tracker = ActiveFileTracker::new();
        let older = journal("a.log", 10);
        let newer = journal("b.log", 11);

        assert_eq!(tracker.select_active_file(&[older.clone()]), Some(older.clone()));
        assert!(tracker.advance_offset(500));
        assert_eq!(tracker.current_offset(), 500);

        assert_eq!(
            tracker.select_active_file(&[older.clone(), newer.clone()]),
            Some(newer.clone())
        );
        assert_eq!(tracker.current_offset(), 0);
        assert_eq!(tracker.generation(), 2);
    }

    #[test]
    fn test_same_listing_keeps_offset() {
        let tracker = ActiveFileTracker::new();
        let file = journal("a.log", 10);
        tracker.select_active_file(&[file.clone()]);
        tracker.advance_offset(42);
        tracker.select_active_file(&[file.clone()]);
        assert_eq!(tracker.current_offset(), 42);
        assert_eq!(tracker.generation(), 1);
    }

    #[test]
    fn test_older_listing_never_moves_backwards() {
        let tracker = ActiveFileTracker::new();
        let older = journal("a.log", 10);
        let newer = journal("b.log", 11);
        tracker.select_active_file(&[newer.clone()]);
        tracker.advance_offset(10);

        let picked = tracker.select_active_file(&[older, newer.clone()]);
        assert_eq!(picked, Some(newer));
        assert_eq!(tracker.current_offset(), 10);
    }

    #[test]
    fn test_removed_current_falls_back_to_listed_newest() {
        let tracker = ActiveFileTracker::new();
        tracker.select_active_file(&[journal("b.log", 11)]);
        let picked = tracker.select_active_file(&[journal("a.log", 10)]);
        assert_eq!(picked.map(|f| f.path), Some(PathBuf::from("a.log")));
    }

    #[test]
    fn test_empty_listing_keeps_current() {
        let tracker = ActiveFileTracker::new();
        assert_eq!(tracker.select_active_file(&[]), None);
        tracker.select_active_file(&[journal("a.log", 10)]);
        tracker.advance_offset(7);
        assert!(tracker.select_active_file(&[]).is_some());
        assert_eq!(tracker.current_offset(), 7);
    }

    #[test]
    fn test_offset_never_decreases() {
        let tracker = ActiveFileTracker::new();
        assert!(!tracker.advance_offset(5));
        tracker.select_active_file(&[journal("a.log", 10)]);
        assert!(tracker.advance_offset(100));
        assert!(!tracker.advance_offset(99));
        assert_eq!(tracker.current_offset(), 100);
        assert!(tracker.advance_offset(100));
    }

    #[test]
    fn test_restart_rewinds_and_bumps_generation() {
        let tracker = ActiveFileTracker::new();
        tracker.select_active_file(&[journal("a.log", 10)]);
        tracker.advance_offset(64);
        tracker.restart_current();
        assert_eq!(tracker.current_offset(), 0);
        assert_eq!(tracker.generation(), 2);
    }
}
