//! Display formatting for timer sessions.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Local, TimeZone, Utc};

use crate::error::TimerError;
use crate::models::Session;
use crate::store::{validate_session, TIMER_FILE};
use crate::timer::{elapsed_hours, elapsed_since};

pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub issue_id: i64,
    pub issue_title: String,
    /// Start time in the display time zone.
    pub started_at: String,
    /// `H:MM:SS`
    pub elapsed_clock: String,
    pub elapsed_hours: f64,
}

impl SessionView {
    /// Builds the view using the local time zone.
    pub fn new(session: &Session, now: DateTime<Utc>) -> Result<Self, TimerError> {
        Self::in_zone(session, now, &Local)
    }

    /// A session that could never have been persisted is reported as corrupt
    /// state.
    pub fn in_zone<Tz: TimeZone>(
        session: &Session,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<Self, TimerError>
    where
        Tz::Offset: std::fmt::Display,
    {
        validate_session(session).map_err(|details| TimerError::CorruptState {
            path: PathBuf::from(TIMER_FILE),
            details,
        })?;

        let elapsed = elapsed_since(session.started_at, now);
        Ok(Self {
            issue_id: session.issue_id,
            issue_title: session.issue_title.clone(),
            started_at: format_timestamp(session.started_at, tz),
            elapsed_clock: format_clock(elapsed),
            elapsed_hours: elapsed_hours(elapsed),
        })
    }

    pub fn heading(&self) -> String {
        if self.issue_title.is_empty() {
            format!("#{}", self.issue_id)
        } else {
            format!("#{}: {}", self.issue_id, self.issue_title)
        }
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Timer is running for issue {}", self.heading()),
            format!("Started at: {}", self.started_at),
            format!(
                "Elapsed time: {} ({:.2} hours)",
                self.elapsed_clock, self.elapsed_hours
            ),
        ]
    }
}

pub fn format_timestamp<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.with_timezone(tz).format(DISPLAY_TIME_FORMAT).to_string()
}

pub fn format_clock(elapsed: Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

pub fn format_hours(hours: f64) -> String {
    format!("{:.2}", hours)
}
