//! Durable storage for the active timer session.
//!
//! The file store keeps one JSON document at `<config dir>/timer.json`:
//!
//! ```json
//! {
//!   "issue_id": 42,
//!   "issue_title": "Fix login bug",
//!   "started_at": "2025-07-14T10:30:00Z"
//! }
//! ```
//!
//! A missing file means no timer is running. A file that exists but does not
//! hold a valid session is reported as corrupt and left in place.
//!
//! Writes go through a temp file in the same directory followed by a rename, so
//! a concurrent reader sees either the old record or the new one. There is no
//! cross-process lock: two racing writers resolve as last-writer-wins.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::TimerError;
use crate::models::Session;

pub const TIMER_FILE: &str = "timer.json";

pub trait SessionStore {
    /// Returns the persisted session, or `None` when idle.
    fn load(&self) -> Result<Option<Session>, TimerError>;

    /// Replaces any existing session.
    fn save(&self, session: &Session) -> Result<(), TimerError>;

    /// Removes the session. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), TimerError>;
}

pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(TIMER_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> TimerError {
        TimerError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Parses a session document, rejecting records that deserialize but cannot
/// describe a real timer.
pub fn parse_session(content: &str) -> Result<Session, String> {
    let session: Session = serde_json::from_str(content).map_err(|e| e.to_string())?;
    validate_session(&session)?;
    Ok(session)
}

pub fn validate_session(session: &Session) -> Result<(), String> {
    if session.issue_id <= 0 {
        return Err(format!(
            "issue_id must be a positive integer, found {}",
            session.issue_id
        ));
    }
    Ok(())
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, TimerError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(TimerError::CorruptState {
                    path: self.path.clone(),
                    details: "file is not valid UTF-8".to_string(),
                })
            }
            Err(e) => return Err(self.io_error(e)),
        };

        match parse_session(&content) {
            Ok(session) => Ok(Some(session)),
            Err(details) => {
                warn!(path = %self.path.display(), %details, "timer state file is corrupt");
                Err(TimerError::CorruptState {
                    path: self.path.clone(),
                    details,
                })
            }
        }
    }

    fn save(&self, session: &Session) -> Result<(), TimerError> {
        let content = serde_json::to_string_pretty(session).map_err(|e| {
            self.io_error(std::io::Error::new(ErrorKind::InvalidData, e))
        })?;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| self.io_error(e))?;

        let mut temp_file = NamedTempFile::new_in(&parent).map_err(|e| self.io_error(e))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| self.io_error(e))?;
        temp_file.flush().map_err(|e| self.io_error(e))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;

        debug!(path = %self.path.display(), issue_id = session.issue_id, "saved timer session");
        Ok(())
    }

    fn clear(&self) -> Result<(), TimerError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "cleared timer session");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// Non-durable store for tests and dry runs.
#[derive(Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, TimerError> {
        Ok(self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn save(&self, session: &Session) -> Result<(), TimerError> {
        *self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), TimerError> {
        *self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}
