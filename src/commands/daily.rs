use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::io::Write;

use crate::error::{TimerError, TrackerError};
use crate::models::NewIssue;
use crate::tracker::Tracker;

pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Parses a `DD-MM-YYYY` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| format!("invalid date '{}', expected DD-MM-YYYY", s))
}

/// Every day from `start` through `end` inclusive; just `start` when `end`
/// is absent.
pub fn dates_in_range(start: NaiveDate, end: Option<NaiveDate>) -> Result<Vec<NaiveDate>> {
    let end = end.unwrap_or(start);
    if end < start {
        bail!("End date cannot be earlier than start date.");
    }
    Ok(start.iter_days().take_while(|d| *d <= end).collect())
}

pub fn daily_issue(project_id: i64, team: &str, date: NaiveDate) -> NewIssue {
    let formatted = date.format(DATE_FORMAT).to_string();
    NewIssue {
        project_id,
        subject: format!("[Daily][{}] {}", team, formatted),
        start_date: date,
        due_date: date,
        description: format!("Daily task for team {} on {}", team, formatted),
    }
}

/// Creates one daily issue per day. Failures on single days are reported and
/// skipped.
pub fn run<W: Write>(
    tracker: &dyn Tracker,
    project_id: i64,
    team: &str,
    start: NaiveDate,
    end: Option<NaiveDate>,
    out: &mut W,
) -> Result<()> {
    let team = team.trim();
    if team.is_empty() {
        bail!("Team name must not be empty");
    }
    let dates = dates_in_range(start, end)?;

    let project = tracker
        .project(project_id)
        .map_err(|e| match e {
            TrackerError::NotFound { .. } => {
                TimerError::Validation(format!("Project #{} not found.", project_id))
            }
            other => TimerError::from(other),
        })
        .context("Error creating daily tasks")?;

    let mut created = Vec::new();
    for date in &dates {
        let new_issue = daily_issue(project_id, team, *date);
        match tracker.create_issue(&new_issue) {
            Ok(issue) => created.push((issue.id, new_issue.subject)),
            Err(e) => writeln!(
                out,
                "Error creating task for {}: {}",
                date.format(DATE_FORMAT),
                e
            )?,
        }
    }

    if created.is_empty() {
        bail!("No tasks could be created.");
    }

    writeln!(out, "\n{} task(s) created successfully:", created.len())?;
    for (id, subject) in &created {
        writeln!(out, "- Task #{}: {}", id, subject)?;
    }
    writeln!(out, "\nProject: {}", project.name)?;
    writeln!(out, "Team: {}", team)?;
    match (dates.first(), dates.last()) {
        (Some(first), Some(last)) if first == last => {
            writeln!(out, "Date: {}", first.format(DATE_FORMAT))?
        }
        (Some(first), Some(last)) => writeln!(
            out,
            "Range: {} to {}",
            first.format(DATE_FORMAT),
            last.format(DATE_FORMAT)
        )?,
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::fake::FakeTracker;
    use proptest::prelude::*;

    fn date(d: u32, m: u32, y: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("15-07-2025").unwrap(), date(15, 7, 2025));
        assert!(parse_date("2025-07-15").is_err());
        assert!(parse_date("31-02-2025").is_err());
    }

    #[test]
    fn test_range_single_day() {
        assert_eq!(dates_in_range(date(15, 7, 2025), None).unwrap(), vec![date(15, 7, 2025)]);
    }

    #[test]
    fn test_range_crosses_month() {
        let dates = dates_in_range(date(30, 6, 2025), Some(date(2, 7, 2025))).unwrap();
        assert_eq!(dates, vec![date(30, 6, 2025), date(1, 7, 2025), date(2, 7, 2025)]);
    }

    #[test]
    fn test_range_end_before_start() {
        let err = dates_in_range(date(19, 7, 2025), Some(date(15, 7, 2025))).unwrap_err();
        assert!(err.to_string().contains("earlier than start"));
    }

    #[test]
    fn test_daily_issue_fields() {
        let issue = daily_issue(1, "Backend", date(15, 7, 2025));
        assert_eq!(issue.subject, "[Daily][Backend] 15-07-2025");
        assert_eq!(issue.start_date, date(15, 7, 2025));
        assert_eq!(issue.due_date, date(15, 7, 2025));
        assert_eq!(issue.description, "Daily task for team Backend on 15-07-2025");
    }

    #[test]
    fn test_run_creates_range() {
        let tracker = FakeTracker::new();
        let mut out = Vec::new();
        run(&tracker, 1, "QA", date(15, 7, 2025), Some(date(19, 7, 2025)), &mut out).unwrap();

        assert_eq!(tracker.created_issues.borrow().len(), 5);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("5 task(s) created successfully:"));
        assert!(text.contains("- Task #501: [Daily][QA] 15-07-2025"));
        assert!(text.contains("Project: Project Alpha"));
        assert!(text.contains("Range: 15-07-2025 to 19-07-2025"));
    }

    #[test]
    fn test_run_skips_failed_days() {
        let tracker = FakeTracker {
            fail_subjects: vec!["[Daily][QA] 16-07-2025".to_string()],
            ..FakeTracker::new()
        };
        let mut out = Vec::new();
        run(&tracker, 1, "QA", date(15, 7, 2025), Some(date(17, 7, 2025)), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Error creating task for 16-07-2025"));
        assert!(text.contains("2 task(s) created successfully:"));
    }

    #[test]
    fn test_run_unknown_project() {
        let tracker = FakeTracker::new();
        let err = run(&tracker, 99, "QA", date(15, 7, 2025), None, &mut Vec::new()).unwrap_err();
        assert!(format!("{:#}", err).contains("Project #99 not found."));
        assert!(tracker.created_issues.borrow().is_empty());
    }

    #[test]
    fn test_run_all_days_fail() {
        let tracker = FakeTracker {
            fail_subjects: vec!["[Daily][QA] 15-07-2025".to_string()],
            ..FakeTracker::new()
        };
        let err = run(&tracker, 1, "QA", date(15, 7, 2025), None, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("No tasks could be created."));
    }

    proptest! {
        #[test]
        fn prop_range_length_matches_span(offset in 0i64..400, span in 0i64..60) {
            let start = date(1, 1, 2025) + chrono::Duration::days(offset);
            let end = start + chrono::Duration::days(span);
            let dates = dates_in_range(start, Some(end)).unwrap();
            prop_assert_eq!(dates.len() as i64, span + 1);
            prop_assert_eq!(dates.first().copied(), Some(start));
            prop_assert_eq!(dates.last().copied(), Some(end));
        }
    }
}
