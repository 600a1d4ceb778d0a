use anyhow::{bail, Result};
use std::io::{BufRead, Write};

use super::prompt;
use crate::error::TimerError;
use crate::presenter::{format_hours, format_timestamp, SessionView};
use crate::timer::{
    elapsed_hours, Clock, LogOutcome, PriorTimer, StopResult, TimerManager, TimerStatus,
};

/// Command-line choices for `stop`. Anything left `None` is asked for.
#[derive(Debug, Default, Clone)]
pub struct StopOptions {
    pub log: Option<bool>,
    pub activity: Option<String>,
    pub comment: Option<String>,
}

pub fn start<W: Write>(timer: &TimerManager, issue_id: i64, prior: PriorTimer, out: &mut W) -> Result<()> {
    let outcome = timer.start(issue_id, prior)?;

    if let Some(previous) = &outcome.replaced {
        let hours = format_hours(previous.elapsed_hours);
        match &previous.log {
            LogOutcome::Skipped => writeln!(
                out,
                "Previous timer for issue #{} stopped ({} hours not logged).",
                previous.session.issue_id, hours
            )?,
            LogOutcome::Logged(entry) => writeln!(
                out,
                "Previous timer for issue #{} stopped. Logged {} hours (time entry #{}).",
                previous.session.issue_id, hours, entry.id
            )?,
            LogOutcome::Failed(e) => writeln!(
                out,
                "Previous timer for issue #{} stopped, but logging {} hours failed: {}",
                previous.session.issue_id, hours, e
            )?,
        }
    }

    let session = &outcome.session;
    writeln!(out, "Timer started for issue #{}: {}", session.issue_id, session.issue_title)?;
    writeln!(
        out,
        "Started at: {}",
        format_timestamp(session.started_at, &chrono::Local)
    )?;
    Ok(())
}

pub fn status<W: Write>(timer: &TimerManager, clock: &dyn Clock, out: &mut W) -> Result<()> {
    match timer.status()? {
        TimerStatus::Idle => writeln!(out, "No timer is currently running.")?,
        TimerStatus::Running { session, .. } => {
            for line in SessionView::new(&session, clock.now())?.lines() {
                writeln!(out, "{}", line)?;
            }
        }
    }
    Ok(())
}

pub fn stop<R: BufRead, W: Write>(
    timer: &TimerManager,
    options: StopOptions,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    let (session, elapsed) = match timer.status()? {
        TimerStatus::Idle => {
            writeln!(out, "No timer is currently running.")?;
            return Ok(());
        }
        TimerStatus::Running { session, elapsed } => (session, elapsed),
    };

    writeln!(out, "Timer for issue #{}: {}", session.issue_id, session.issue_title)?;
    writeln!(out, "Time elapsed: {} hours", format_hours(elapsed_hours(elapsed)))?;

    let log = match options.log {
        Some(log) => log,
        None => prompt::confirm(input, out, "Do you want to log this time to Redmine?", true)?,
    };

    let (activity, comment) = if log {
        let activity = match options.activity {
            Some(a) => a,
            None => prompt::required(input, out, "Activity name")?,
        };
        let comment = match options.comment {
            Some(c) => c,
            None => prompt::optional(input, out, "Comment (optional)")?,
        };
        (Some(activity), Some(comment))
    } else {
        (None, options.comment)
    };

    let result = match timer.stop(log, activity.as_deref(), comment.as_deref()) {
        Ok(r) => r,
        Err(TimerError::NoActiveTimer) => {
            writeln!(out, "Timer was already stopped by another invocation.")?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    report_stop(&result, out)
}

fn report_stop<W: Write>(result: &StopResult, out: &mut W) -> Result<()> {
    let issue_id = result.session.issue_id;
    let hours = format_hours(result.elapsed_hours);

    match &result.log {
        LogOutcome::Skipped => {
            writeln!(out, "Timer for issue #{} stopped without logging time.", issue_id)?;
            Ok(())
        }
        LogOutcome::Logged(entry) => {
            writeln!(out, "Time logged successfully: {} hours on issue #{}", hours, issue_id)?;
            if let Some(activity) = &result.activity {
                writeln!(out, "Activity: {}", activity)?;
            }
            if let Some(comment) = result.comment.as_deref().filter(|c| !c.is_empty()) {
                writeln!(out, "Comment: {}", comment)?;
            }
            writeln!(out, "Time entry ID: {}", entry.id)?;
            Ok(())
        }
        LogOutcome::Failed(_) if result.elapsed_hours <= 0.0 => {
            writeln!(out, "Timer for issue #{} stopped. Timer cleared.", issue_id)?;
            writeln!(out, "Nothing to log: elapsed time rounds to 0.00 hours.")?;
            Ok(())
        }
        LogOutcome::Failed(e) => {
            writeln!(out, "Timer for issue #{} stopped. Timer cleared.", issue_id)?;
            bail!(
                "{}\nLog it manually with: redminecli log --issue-id {} --hours {} --activity \"{}\"",
                e,
                issue_id,
                hours,
                result.activity.as_deref().unwrap_or("<activity>")
            )
        }
    }
}
