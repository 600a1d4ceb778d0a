use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The single in-progress timer, persisted between invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub issue_id: i64,
    pub issue_title: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdName {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: i64,
    pub subject: String,
    pub status: IdName,
    #[serde(default)]
    pub project: Option<IdName>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub identifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub login: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdRef {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: i64,
    pub hours: f64,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub spent_on: Option<NaiveDate>,
    #[serde(default)]
    pub issue: Option<IdRef>,
    #[serde(default)]
    pub activity: Option<IdName>,
}

/// Payload for creating a time entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTimeEntry {
    pub issue_id: i64,
    pub hours: f64,
    pub activity_id: i64,
    #[serde(rename = "comments")]
    pub comment: String,
}

/// Payload for creating an issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewIssue {
    pub project_id: i64,
    pub subject: String,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeEntryQuery {
    pub user_id: Option<i64>,
    pub issue_id: Option<i64>,
    pub limit: u32,
}
