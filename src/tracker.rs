//! The remote issue-tracker boundary.

use crate::error::TrackerError;
use crate::models::{Activity, Issue, NewIssue, NewTimeEntry, Project, TimeEntry, TimeEntryQuery, User};

pub trait Tracker {
    fn issue(&self, issue_id: i64) -> Result<Issue, TrackerError>;

    fn assigned_issues(&self) -> Result<Vec<Issue>, TrackerError>;

    /// Time entry activities in server order.
    fn list_activities(&self) -> Result<Vec<Activity>, TrackerError>;

    fn create_time_entry(&self, entry: &NewTimeEntry) -> Result<TimeEntry, TrackerError>;

    fn current_user(&self) -> Result<User, TrackerError>;

    fn time_entries(&self, query: &TimeEntryQuery) -> Result<Vec<TimeEntry>, TrackerError>;

    fn projects(&self) -> Result<Vec<Project>, TrackerError>;

    fn project(&self, project_id: i64) -> Result<Project, TrackerError>;

    fn create_issue(&self, issue: &NewIssue) -> Result<Issue, TrackerError>;
}

/// Finds an activity by name, ignoring case.
///
/// An unknown name is reported as `Rejected` with the available names so the
/// user can retry with a valid one.
pub fn resolve_activity<T: Tracker + ?Sized>(
    tracker: &T,
    name: &str,
) -> Result<Activity, TrackerError> {
    let activities = tracker.list_activities()?;
    let wanted = name.trim().to_lowercase();

    if let Some(found) = activities.iter().find(|a| a.name.to_lowercase() == wanted) {
        return Ok(found.clone());
    }

    let available: Vec<&str> = activities.iter().map(|a| a.name.as_str()).collect();
    Err(TrackerError::Rejected(vec![format!(
        "Activity '{}' not found. Available activities: {}",
        name,
        available.join(", ")
    )]))
}


#[cfg(test)]
mod tests {
    use super::fake::FakeTracker;
    use super::*;

    #[test]
    fn test_resolve_activity_is_case_insensitive() {
        let tracker = FakeTracker::new();
        assert_eq!(resolve_activity(&tracker, "development").unwrap().id, 9);
        assert_eq!(resolve_activity(&tracker, "TESTING").unwrap().id, 10);
        assert_eq!(resolve_activity(&tracker, "  Design ").unwrap().id, 8);
    }

    #[test]
    fn test_resolve_activity_unknown_lists_available() {
        let tracker = FakeTracker::new();
        let err = resolve_activity(&tracker, "Napping").unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, TrackerError::Rejected(_)));
        assert!(msg.contains("Activity 'Napping' not found"));
        assert!(msg.contains("Design, Development, Testing"));
    }

    #[test]
    fn test_resolve_activity_propagates_unavailable() {
        let tracker = FakeTracker {
            offline: true,
            ..FakeTracker::new()
        };
        let err = resolve_activity(&tracker, "Development").unwrap_err();
        assert!(matches!(err, TrackerError::Unavailable(_)));
    }
}
