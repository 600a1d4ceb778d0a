//! Blocking Redmine REST client.
//!
//! Every request carries the API key in the `X-Redmine-API-Key` header.
//! Responses are mapped onto [`TrackerError`]:
//!
//! | HTTP status | Error                       |
//! |-------------|-----------------------------|
//! | 401, 403    | `Unauthorized`              |
//! | 404         | `NotFound`                  |
//! | 422         | `Rejected` (Redmine errors) |
//! | other       | `Unavailable`               |

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::TrackerError;
use crate::models::{Activity, Issue, NewIssue, NewTimeEntry, Project, TimeEntry, TimeEntryQuery, User};
use crate::tracker::Tracker;

const API_KEY_HEADER: &str = "X-Redmine-API-Key";
const PAGE_SIZE: usize = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct RedmineClient {
    base_url: String,
    key: String,
    http: Client,
}

#[derive(Deserialize)]
struct IssueEnvelope {
    issue: Issue,
}

#[derive(Deserialize)]
struct ProjectEnvelope {
    project: Project,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Deserialize)]
struct ActivitiesEnvelope {
    time_entry_activities: Vec<Activity>,
}

#[derive(Deserialize)]
struct TimeEntriesEnvelope {
    time_entries: Vec<TimeEntry>,
}

#[derive(Serialize, Deserialize)]
struct TimeEntryEnvelope<T> {
    time_entry: T,
}

#[derive(Serialize)]
struct NewIssueEnvelope<'a> {
    issue: &'a NewIssue,
}

#[derive(Deserialize)]
struct ErrorsEnvelope {
    #[serde(default)]
    errors: Vec<String>,
}

impl RedmineClient {
    pub fn new(config: &Config) -> Result<Self, TrackerError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("redminecli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TrackerError::Unavailable(e.to_string()))?;
        Ok(Self::with_client(config, http))
    }

    pub fn with_client(config: &Config, http: Client) -> Self {
        Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            key: config.key.clone(),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        resource: &str,
    ) -> Result<T, TrackerError> {
        debug!(path, "GET");
        let response = self
            .http
            .get(self.url(path))
            .header(API_KEY_HEADER, &self.key)
            .query(query)
            .send()
            .map_err(transport_error)?;
        decode(check(response, resource)?)
    }

    fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        resource: &str,
    ) -> Result<T, TrackerError> {
        debug!(path, "POST");
        let response = self
            .http
            .post(self.url(path))
            .header(API_KEY_HEADER, &self.key)
            .json(body)
            .send()
            .map_err(transport_error)?;
        decode(check(response, resource)?)
    }

    /// Follows Redmine's `offset`/`limit`/`total_count` paging until every
    /// item under `field` has been collected.
    fn get_paged<T: DeserializeOwned>(
        &self,
        path: &str,
        field: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, TrackerError> {
        let mut items = Vec::new();
        let mut offset = 0usize;

        loop {
            let mut page_query = query.to_vec();
            page_query.push(("offset", offset.to_string()));
            page_query.push(("limit", PAGE_SIZE.to_string()));

            let mut page: Value = self.get(path, &page_query, field)?;
            let raw = page.get_mut(field).map(Value::take).unwrap_or(Value::Null);
            let batch: Vec<T> = serde_json::from_value(raw)
                .map_err(|e| unexpected_response(&e))?;
            let total = page
                .get("total_count")
                .and_then(Value::as_u64)
                .map(|t| t as usize);

            let fetched = batch.len();
            items.extend(batch);
            offset += fetched;

            match total {
                Some(total) if fetched > 0 && offset < total => continue,
                _ => break,
            }
        }

        Ok(items)
    }
}

fn transport_error(err: reqwest::Error) -> TrackerError {
    TrackerError::Unavailable(err.to_string())
}

fn unexpected_response(err: &dyn std::fmt::Display) -> TrackerError {
    TrackerError::Unavailable(format!("unexpected response from Redmine: {}", err))
}

fn check(response: Response, resource: &str) -> Result<Response, TrackerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(TrackerError::Unauthorized {
            status: status.as_u16(),
        }),
        StatusCode::NOT_FOUND => Err(TrackerError::NotFound {
            resource: resource.to_string(),
        }),
        StatusCode::UNPROCESSABLE_ENTITY => {
            let errors = response
                .json::<ErrorsEnvelope>()
                .map(|e| e.errors)
                .unwrap_or_default();
            if errors.is_empty() {
                Err(TrackerError::Rejected(vec![format!("{} was rejected", resource)]))
            } else {
                Err(TrackerError::Rejected(errors))
            }
        }
        other => Err(TrackerError::Unavailable(format!("HTTP {}", other))),
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TrackerError> {
    response.json::<T>().map_err(|e| unexpected_response(&e))
}

impl Tracker for RedmineClient {
    fn issue(&self, issue_id: i64) -> Result<Issue, TrackerError> {
        let envelope: IssueEnvelope = self.get(
            &format!("/issues/{}.json", issue_id),
            &[],
            &format!("issue #{}", issue_id),
        )?;
        Ok(envelope.issue)
    }

    fn assigned_issues(&self) -> Result<Vec<Issue>, TrackerError> {
        self.get_paged(
            "/issues.json",
            "issues",
            &[("assigned_to_id", "me".to_string())],
        )
    }

    fn list_activities(&self) -> Result<Vec<Activity>, TrackerError> {
        let envelope: ActivitiesEnvelope = self.get(
            "/enumerations/time_entry_activities.json",
            &[],
            "time entry activities",
        )?;
        Ok(envelope.time_entry_activities)
    }

    fn create_time_entry(&self, entry: &NewTimeEntry) -> Result<TimeEntry, TrackerError> {
        let envelope: TimeEntryEnvelope<TimeEntry> = self.post(
            "/time_entries.json",
            &TimeEntryEnvelope { time_entry: entry },
            &format!("issue #{}", entry.issue_id),
        )?;
        Ok(envelope.time_entry)
    }

    fn current_user(&self) -> Result<User, TrackerError> {
        let envelope: UserEnvelope = self.get("/users/current.json", &[], "current user")?;
        Ok(envelope.user)
    }

    fn time_entries(&self, query: &TimeEntryQuery) -> Result<Vec<TimeEntry>, TrackerError> {
        let mut params = vec![("limit", query.limit.to_string())];
        if let Some(user_id) = query.user_id {
            params.push(("user_id", user_id.to_string()));
        }
        if let Some(issue_id) = query.issue_id {
            params.push(("issue_id", issue_id.to_string()));
        }
        let envelope: TimeEntriesEnvelope = self.get("/time_entries.json", &params, "time entries")?;
        Ok(envelope.time_entries)
    }

    fn projects(&self) -> Result<Vec<Project>, TrackerError> {
        self.get_paged("/projects.json", "projects", &[])
    }

    fn project(&self, project_id: i64) -> Result<Project, TrackerError> {
        let envelope: ProjectEnvelope = self.get(
            &format!("/projects/{}.json", project_id),
            &[],
            &format!("project #{}", project_id),
        )?;
        Ok(envelope.project)
    }

    fn create_issue(&self, issue: &NewIssue) -> Result<Issue, TrackerError> {
        let envelope: IssueEnvelope = self.post(
            "/issues.json",
            &NewIssueEnvelope { issue },
            &format!("project #{}", issue.project_id),
        )?;
        Ok(envelope.issue)
    }
}
