//! The work timer state machine.
//!
//! There are two observable states: idle (nothing in the session store) and
//! running (one session in the store). `start` moves to running, replacing any
//! running session; `stop` always returns to idle, and the optional remote time
//! entry is a side effect of that transition. A remote failure is reported in
//! the [`StopResult`] but never puts the session back.
//!
//! Elapsed time is wall clock and keeps advancing between calls, so the hours
//! shown by `status` and the hours logged by a later `stop` can differ.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::error::TimerError;
use crate::models::{NewTimeEntry, Session, TimeEntry};
use crate::store::SessionStore;
use crate::tracker::{resolve_activity, Tracker};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Rounds hours half-up to two decimals, the granularity Redmine stores.
///
/// Decimal halves such as 1.005 are stored slightly below the half in binary,
/// so the scaled value is nudged up by a relative epsilon before rounding.
pub fn round_hours(hours: f64) -> f64 {
    let scaled = hours * 100.0;
    (scaled + scaled.abs() * HALF_UP_EPSILON).round() / 100.0
}

const HALF_UP_EPSILON: f64 = 1e-12;
const MILLIS_PER_HUNDREDTH_HOUR: i64 = 36_000;

/// Wall-clock time since `started_at`, clamped at zero for a start time in
/// the future.
pub fn elapsed_since(started_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    let elapsed = now.signed_duration_since(started_at);
    if elapsed < Duration::zero() {
        Duration::zero()
    } else {
        elapsed
    }
}

/// Elapsed hours rounded half-up to two decimals, computed in whole
/// milliseconds.
pub fn elapsed_hours(elapsed: Duration) -> f64 {
    let millis = elapsed.num_milliseconds().max(0);
    let hundredths = (millis + MILLIS_PER_HUNDREDTH_HOUR / 2) / MILLIS_PER_HUNDREDTH_HOUR;
    hundredths as f64 / 100.0
}

/// What to log for a timer being stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRequest {
    pub activity: String,
    pub comment: String,
}

/// How `start` treats a timer that is already running.
#[derive(Debug, Clone, PartialEq)]
pub enum PriorTimer {
    /// Stop it without creating a time entry.
    Discard,
    /// Stop it and log its time first.
    Log(LogRequest),
}

#[derive(Debug)]
pub enum LogOutcome {
    Skipped,
    Logged(TimeEntry),
    Failed(TimerError),
}

#[derive(Debug)]
pub struct StopResult {
    pub session: Session,
    pub stopped_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub elapsed_hours: f64,
    pub activity: Option<String>,
    pub comment: Option<String>,
    pub log: LogOutcome,
}

#[derive(Debug)]
pub struct StartOutcome {
    pub session: Session,
    /// The timer that was running before this start, if any.
    pub replaced: Option<StopResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimerStatus {
    Idle,
    Running { session: Session, elapsed: Duration },
}

impl TimerStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, TimerStatus::Running { .. })
    }

    pub fn elapsed_hours(&self) -> Option<f64> {
        match self {
            TimerStatus::Idle => None,
            TimerStatus::Running { elapsed, .. } => Some(elapsed_hours(*elapsed)),
        }
    }
}

pub struct TimerManager<'a> {
    store: &'a dyn SessionStore,
    tracker: &'a dyn Tracker,
    clock: &'a dyn Clock,
}

fn validate_issue_id(issue_id: i64) -> Result<(), TimerError> {
    if issue_id <= 0 {
        return Err(TimerError::Validation(format!(
            "Issue ID must be a positive integer, got {}",
            issue_id
        )));
    }
    Ok(())
}

fn validate_log_request(request: &LogRequest) -> Result<(), TimerError> {
    if request.activity.trim().is_empty() {
        return Err(TimerError::Validation(
            "An activity name is required to log time".to_string(),
        ));
    }
    Ok(())
}

impl<'a> TimerManager<'a> {
    pub fn new(store: &'a dyn SessionStore, tracker: &'a dyn Tracker, clock: &'a dyn Clock) -> Self {
        Self {
            store,
            tracker,
            clock,
        }
    }

    pub fn start(&self, issue_id: i64, prior: PriorTimer) -> Result<StartOutcome, TimerError> {
        validate_issue_id(issue_id)?;
        let prior_log = match prior {
            PriorTimer::Discard => None,
            PriorTimer::Log(request) => {
                validate_log_request(&request)?;
                Some(request)
            }
        };

        let issue = self
            .tracker
            .issue(issue_id)
            .map_err(|e| TimerError::from_issue_lookup(issue_id, e))?;

        let replaced = match self.store.load()? {
            Some(existing) => {
                info!(
                    previous_issue = existing.issue_id,
                    issue_id, "replacing running timer"
                );
                Some(self.finish(existing, prior_log)?)
            }
            None => None,
        };

        let session = Session {
            issue_id,
            issue_title: issue.subject,
            started_at: self.clock.now(),
        };
        self.store.save(&session)?;
        info!(issue_id, started_at = %session.started_at, "timer started");

        Ok(StartOutcome { session, replaced })
    }

    pub fn status(&self) -> Result<TimerStatus, TimerError> {
        match self.store.load()? {
            None => Ok(TimerStatus::Idle),
            Some(session) => {
                let elapsed = elapsed_since(session.started_at, self.clock.now());
                Ok(TimerStatus::Running { session, elapsed })
            }
        }
    }

    /// Stops the running timer. With `log` set, a time entry is created for the
    /// elapsed hours using `activity` (required) and `comment`.
    pub fn stop(
        &self,
        log: bool,
        activity: Option<&str>,
        comment: Option<&str>,
    ) -> Result<StopResult, TimerError> {
        let request = if log {
            let request = LogRequest {
                activity: activity.unwrap_or_default().to_string(),
                comment: comment.unwrap_or_default().to_string(),
            };
            validate_log_request(&request)?;
            Some(request)
        } else {
            None
        };

        let session = self.store.load()?.ok_or(TimerError::NoActiveTimer)?;
        let mut result = self.finish(session, request)?;
        if result.comment.is_none() {
            result.comment = comment.map(str::to_string);
        }
        Ok(result)
    }

    /// Clears `session` from the store, then submits its time if requested.
    fn finish(&self, session: Session, request: Option<LogRequest>) -> Result<StopResult, TimerError> {
        let stopped_at = self.clock.now();
        let elapsed = elapsed_since(session.started_at, stopped_at);
        let hours = elapsed_hours(elapsed);

        self.store.clear()?;
        info!(issue_id = session.issue_id, hours, "timer stopped");

        let log = match &request {
            None => LogOutcome::Skipped,
            Some(request) => self.submit(&session, hours, request),
        };

        Ok(StopResult {
            session,
            stopped_at,
            elapsed,
            elapsed_hours: hours,
            activity: request.as_ref().map(|r| r.activity.clone()),
            comment: request.map(|r| r.comment),
            log,
        })
    }

    fn submit(&self, session: &Session, hours: f64, request: &LogRequest) -> LogOutcome {
        if hours <= 0.0 {
            return LogOutcome::Failed(TimerError::Validation(
                "Elapsed time rounds to 0.00 hours; nothing to log".to_string(),
            ));
        }

        let activity = match resolve_activity(self.tracker, &request.activity) {
            Ok(a) => a,
            Err(e) => {
                warn!(error = %e, "could not resolve activity");
                return LogOutcome::Failed(e.into());
            }
        };

        let entry = NewTimeEntry {
            issue_id: session.issue_id,
            hours,
            activity_id: activity.id,
            comment: request.comment.clone(),
        };
        debug!(issue_id = entry.issue_id, hours, activity_id = entry.activity_id, "creating time entry");

        match self.tracker.create_time_entry(&entry) {
            Ok(created) => {
                info!(time_entry_id = created.id, "time entry created");
                LogOutcome::Logged(created)
            }
            Err(e) => {
                warn!(error = %e, issue_id = session.issue_id, "time entry submission failed");
                LogOutcome::Failed(e.into())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod clock {
    use std::cell::Cell;

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::Clock;

    /// A clock that only moves when told to.
    pub struct FixedClock {
        now: Cell<DateTime<Utc>>,
    }

    impl FixedClock {
        pub fn at(now: DateTime<Utc>) -> Self {
            Self { now: Cell::new(now) }
        }

        pub fn t0() -> Self {
            Self::at(Utc.with_ymd_and_hms(2025, 7, 14, 10, 30, 0).unwrap())
        }

        pub fn advance(&self, by: Duration) {
            self.now.set(self.now.get() + by);
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.now.get()
        }
    }
}
