mod app_config;
mod diagnostics;
mod directory_index;
mod file_tracker;
mod journal_session;


pub use app_config::{AppConfig, ConfigError, default_journal_directory};
pub use diagnostics::{DIAGNOSTIC_CAPACITY, Diagnostic, Diagnostics};
pub use directory_index::{JournalFile, is_journal_filename, parse_journal_filename, scan_journal_files};
pub use file_tracker::{ActiveFileTracker, TrackedFile};
pub use journal_session::{JournalSession, SessionError, TickReport};
