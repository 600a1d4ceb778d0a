use anyhow::{bail, Result};
use std::io::Write;

use crate::error::TimerError;
use crate::models::NewTimeEntry;
use crate::presenter::format_hours;
use crate::timer::round_hours;
use crate::tracker::{resolve_activity, Tracker};

/// Logs time directly, without the timer.
pub fn run<W: Write>(
    tracker: &dyn Tracker,
    issue_id: i64,
    hours: f64,
    activity: &str,
    comment: &str,
    out: &mut W,
) -> Result<()> {
    if issue_id <= 0 {
        bail!("Issue ID must be a positive integer, got {}", issue_id);
    }
    if !hours.is_finite() || hours <= 0.0 {
        bail!("Hours must be a positive number, got {}", hours);
    }
    let hours = round_hours(hours);
    if hours <= 0.0 {
        bail!("Hours must be at least 0.01");
    }

    tracker
        .issue(issue_id)
        .map_err(|e| TimerError::from_issue_lookup(issue_id, e))?;
    let activity = resolve_activity(tracker, activity).map_err(TimerError::from)?;

    let entry = tracker
        .create_time_entry(&NewTimeEntry {
            issue_id,
            hours,
            activity_id: activity.id,
            comment: comment.to_string(),
        })
        .map_err(TimerError::from)?;

    writeln!(
        out,
        "Time logged successfully: {} hours on issue #{}",
        format_hours(hours),
        issue_id
    )?;
    writeln!(out, "Activity: {}", activity.name)?;
    if !comment.is_empty() {
        writeln!(out, "Comment: {}", comment)?;
    }
    writeln!(out, "Time entry ID: {}", entry.id)?;
    Ok(())
}
