use anyhow::{Context, Result};
use std::io::Write;

use crate::models::Issue;
use crate::tracker::Tracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    Todo,
    InProgress,
    Done,
    Other,
}

impl StatusCategory {
    /// Buckets a free-form Redmine status name.
    pub fn of(status_name: &str) -> Self {
        let lower = status_name.to_lowercase();
        let has_any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

        if has_any(&["new", "to do", "todo", "open", "assigned"]) {
            StatusCategory::Todo
        } else if has_any(&["in progress", "progress", "working", "active"]) {
            StatusCategory::InProgress
        } else if has_any(&["done", "closed", "resolved", "completed", "finished"]) {
            StatusCategory::Done
        } else {
            StatusCategory::Other
        }
    }

    fn ansi_code(self) -> &'static str {
        match self {
            StatusCategory::Todo => "34",
            StatusCategory::InProgress => "35",
            StatusCategory::Done => "32",
            StatusCategory::Other => "37",
        }
    }
}

pub fn colorize_status(status_name: &str, color: bool) -> String {
    if !color {
        return status_name.to_string();
    }
    format!(
        "\x1b[1;{}m{}\x1b[0m",
        StatusCategory::of(status_name).ansi_code(),
        status_name
    )
}

/// Colour is on unless `NO_COLOR` is set.
pub fn color_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn filter_by_status(issues: Vec<Issue>, status: Option<&str>) -> Vec<Issue> {
    match status {
        None => issues,
        Some(wanted) => issues
            .into_iter()
            .filter(|i| i.status.name.eq_ignore_ascii_case(wanted))
            .collect(),
    }
}

pub fn run<W: Write>(tracker: &dyn Tracker, status: Option<&str>, color: bool, out: &mut W) -> Result<()> {
    let issues = tracker.assigned_issues().context("Error fetching tasks")?;
    let issues = filter_by_status(issues, status);

    if issues.is_empty() {
        match status {
            Some(s) => writeln!(out, "No tasks found with status '{}'.", s)?,
            None => writeln!(out, "No tasks found.")?,
        }
        return Ok(());
    }

    for issue in issues {
        writeln!(
            out,
            "{}: {} (Status: {})",
            issue.id,
            issue.subject,
            colorize_status(&issue.status.name, color)
        )?;
    }

    Ok(())
}
