use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::events::HandlerError;
use crate::journal::DecodeError;

/// Ring capacity. Oldest entries are dropped first.
pub const DIAGNOSTIC_CAPACITY: usize = 256;

/// Longest slice of an offending line kept in a diagnostic.
const EXCERPT_LEN: usize = 120;

/// Something the session skipped past without stopping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    DecodeFailure { error: DecodeError, excerpt: String },
    HandlerFailure { kind: String, error: HandlerError },
    TransientIo { path: PathBuf, reason: String },
    Rotation { path: PathBuf },
}

impl Diagnostic {
    pub(crate) fn decode_failure(error: DecodeError, line: &str) -> Self {
        let excerpt = match line.char_indices().nth(EXCERPT_LEN) {
            Some((cut, _)) => format!("{}…", &line[..cut]),
            None => line.to_string(),
        };
        Diagnostic::DecodeFailure { error, excerpt }
    }
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Mutex<VecDeque<Diagnostic>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, diagnostic: Diagnostic) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == DIAGNOSTIC_CAPACITY {
            entries.pop_front();
        }
        entries.push_back(diagnostic);
    }

    /// Oldest first.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
