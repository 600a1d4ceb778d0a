use anyhow::{Context, Result};
use std::io::Write;

use crate::models::{TimeEntry, TimeEntryQuery};
use crate::timer::round_hours;
use crate::tracker::Tracker;

pub const DEFAULT_LIMIT: u32 = 10;

pub fn format_entry(entry: &TimeEntry) -> String {
    let issue = entry
        .issue
        .as_ref()
        .map(|i| format!("Issue #{}", i.id))
        .unwrap_or_else(|| "Unknown issue".to_string());
    let activity = entry
        .activity
        .as_ref()
        .map(|a| a.name.as_str())
        .unwrap_or("Unknown activity");
    let comment = match entry.comments.as_deref() {
        Some(c) if !c.is_empty() => format!(" - \"{}\"", c),
        _ => String::new(),
    };
    let spent_on = entry
        .spent_on
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "Unknown date".to_string());

    format!(
        "Time Entry #{}: {} hours on {} [{}]{} ({})",
        entry.id, entry.hours, issue, activity, comment, spent_on
    )
}

/// Shows the current user's most recent time entries.
pub fn run<W: Write>(tracker: &dyn Tracker, issue_id: Option<i64>, limit: u32, out: &mut W) -> Result<()> {
    let user = tracker.current_user().context("Error fetching time entries")?;
    let entries = tracker
        .time_entries(&TimeEntryQuery {
            user_id: Some(user.id),
            issue_id,
            limit,
        })
        .context("Error fetching time entries")?;

    if entries.is_empty() {
        match issue_id {
            Some(id) => writeln!(out, "No time entries found for issue #{}.", id)?,
            None => writeln!(out, "No time entries found.")?,
        }
        return Ok(());
    }

    for entry in &entries {
        writeln!(out, "{}", format_entry(entry))?;
    }
    let total: f64 = entries.iter().map(|e| e.hours).sum();
    writeln!(out, "\nTotal hours shown: {}", round_hours(total))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IdName, IdRef, NewTimeEntry};
    use crate::tracker::fake::FakeTracker;
    use chrono::NaiveDate;

    #[test]
    fn test_format_entry_full() {
        let entry = TimeEntry {
            id: 456,
            hours: 2.5,
            comments: Some("Fixed login bug".to_string()),
            spent_on: NaiveDate::from_ymd_opt(2025, 6, 26),
            issue: Some(IdRef { id: 123 }),
            activity: Some(IdName {
                id: 9,
                name: "Development".to_string(),
            }),
        };
        assert_eq!(
            format_entry(&entry),
            "Time Entry #456: 2.5 hours on Issue #123 [Development] - \"Fixed login bug\" (2025-06-26)"
        );
    }

    #[test]
    fn test_format_entry_missing_fields() {
        let entry = TimeEntry {
            id: 1,
            hours: 1.0,
            comments: Some(String::new()),
            spent_on: None,
            issue: None,
            activity: None,
        };
        assert_eq!(
            format_entry(&entry),
            "Time Entry #1: 1 hours on Unknown issue [Unknown activity] (Unknown date)"
        );
    }

    #[test]
    fn test_run_prints_total() {
        let tracker = FakeTracker::new();
        for (issue_id, hours) in [(123, 2.5), (124, 1.0), (123, 0.1)] {
            tracker.entries.borrow_mut().push(NewTimeEntry {
                issue_id,
                hours,
                activity_id: 9,
                comment: String::new(),
            });
        }

        let mut out = Vec::new();
        run(&tracker, Some(123), DEFAULT_LIMIT, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Time Entry #").count(), 2);
        assert!(text.ends_with("Total hours shown: 2.6\n"));
    }

    #[test]
    fn test_run_empty() {
        let mut out = Vec::new();
        run(&FakeTracker::new(), Some(5), DEFAULT_LIMIT, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No time entries found for issue #5.\n");
    }
}
