//! Data models for streamed job sessions and the admin API payloads.
//!
//! - [`LogLine`] / [`JobSession`] / [`JobStatus`]: the console's state
//! - [`Website`]: one scraped news source as listed by the admin API
//! - [`WebsiteInput`]: the body sent when a source is created or updated
//! - [`LoginRequest`] / [`LoginResponse`]: the credential exchange
//!
//! The API speaks camelCase JSON (and Mongo-style `_id`), hence the serde
//! renames on the API types.

use chrono::{DateTime, Utc};
use crate::utils::slugify;
use serde::{Deserialize, Serialize};

/// One user-visible line of job output.
///
/// Sequence numbers start at 1 and follow arrival order within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub sequence: u64,
    pub text: String,
    pub time: DateTime<Utc>,
}

/// Lifecycle of a [`JobSession`].
///
/// `Idle` is what the console reports when it holds no session at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Idle,
    Running,
    Finished,
    Errored,
    Cancelled,
}

impl JobStatus {
    /// `true` once the session can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Finished | JobStatus::Errored | JobStatus::Cancelled
        )
    }
}

/// One open-to-close cycle of the console for a single job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSession {
    pub job_id: String,
    pub label: String,
    pub status: JobStatus,
    pub lines: Vec<LogLine>,
}

impl JobSession {
    /// A fresh session, already running with no lines.
    pub fn start(job_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            label: label.into(),
            status: JobStatus::Running,
            lines: Vec::new(),
        }
    }

    /// Append a line with the next sequence number.
    ///
    /// Returns `None` (and appends nothing) once the session has left
    /// `Running`; lines are frozen from then on.
    pub fn push_line(&mut self, text: impl Into<String>) -> Option<LogLine> {
        if self.status != JobStatus::Running {
            return None;
        }
        let line = LogLine {
            sequence: self.lines.len() as u64 + 1,
            text: text.into(),
            time: Utc::now(),
        };
        self.lines.push(line.clone());
        Some(line)
    }
}

/// A news source managed by the admin API.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Website {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
    #[serde(default)]
    pub last_scraped_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub selectors: Selectors,
    #[serde(default)]
    pub pagination: Pagination,
}

impl Website {
    /// Case-insensitive match against the name or the base URL.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.base_url.to_lowercase().contains(&needle)
    }
}

/// CSS selectors the backend scraper uses on a source. Empty means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Selectors {
    pub item_link: String,
    pub content_wrapper: String,
    pub categories: String,
    pub wait_for_selector: String,
}

/// How the backend walks a source's listing pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    #[serde(rename = "type")]
    pub kind: String,
    pub url_pattern: String,
    pub start_page: u32,
    pub max_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            kind: "url_replace".to_string(),
            url_pattern: String::new(),
            start_page: 1,
            max_pages: 1,
        }
    }
}

pub const DEFAULT_ENGINE: &str = "playwright";

/// Body of `POST /api/websites` and `PUT /api/websites/{id}`.
///
/// The API replaces the whole document on update, so an edit starts from
/// the stored source ([`WebsiteInput::from`]) and overrides single fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteInput {
    pub name: String,
    pub slug: String,
    pub base_url: String,
    pub is_active: bool,
    pub engine: String,
    pub selectors: Selectors,
    pub pagination: Pagination,
}

impl WebsiteInput {
    /// A new, active source with the default engine and a slug derived
    /// from `name`.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            slug: slugify(&name),
            name,
            base_url: base_url.into(),
            is_active: true,
            engine: DEFAULT_ENGINE.to_string(),
            selectors: Selectors::default(),
            pagination: Pagination::default(),
        }
    }
}

impl From<&Website> for WebsiteInput {
    fn from(site: &Website) -> Self {
        Self {
            name: site.name.clone(),
            slug: site.slug.clone(),
            base_url: site.base_url.clone(),
            is_active: site.is_active,
            engine: site
                .engine
                .clone()
                .unwrap_or_else(|| DEFAULT_ENGINE.to_string()),
            selectors: site.selectors.clone(),
            pagination: site.pagination.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Error body the API returns on rejected requests.
#[derive(Debug, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_line_assigns_sequence() {
        let mut session = JobSession::start("abc", "CNN Lite");
        let first = session.push_line("Found 5 items").unwrap();
        let second = session.push_line("Saved post A").unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(session.lines.len(), 2);
    }

    #[test]
    fn test_push_line_frozen_after_terminal() {
        let mut session = JobSession::start("abc", "");
        session.push_line("one");
        session.status = JobStatus::Finished;
        assert!(session.push_line("two").is_none());
        assert_eq!(session.lines.len(), 1);
    }

    #[test]
    fn test_status_terminality() {
        assert!(!JobStatus::Idle.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Finished.is_terminal());
        assert!(JobStatus::Errored.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_website_deserialization() {
        let json = r#"{
            "_id": "65f1c0ffee",
            "name": "CNN Lite",
            "baseUrl": "https://lite.cnn.com",
            "isActive": true,
            "engine": "cheerio",
            "lastScrapedAt": "2025-05-06T14:30:00Z"
        }"#;

        let site: Website = serde_json::from_str(json).unwrap();
        assert_eq!(site.id, "65f1c0ffee");
        assert_eq!(site.base_url, "https://lite.cnn.com");
        assert!(site.is_active);
        assert_eq!(site.engine.as_deref(), Some("cheerio"));
        assert!(site.favicon.is_none());
        assert!(site.last_scraped_at.is_some());
    }

    #[test]
    fn test_website_matches_name_or_url() {
        let site: Website = serde_json::from_str(
            r#"{"_id": "1", "name": "NPR Text", "baseUrl": "https://text.npr.org"}"#,
        )
        .unwrap();
        assert!(site.matches("npr"));
        assert!(site.matches("TEXT.NPR"));
        assert!(!site.matches("bbc"));
    }

    #[test]
    fn test_new_website_input_defaults() {
        let input = WebsiteInput::new("Al Jazeera English", "https://aljazeera.com");
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Al Jazeera English",
                "slug": "al-jazeera-english",
                "baseUrl": "https://aljazeera.com",
                "isActive": true,
                "engine": "playwright",
                "selectors": {
                    "itemLink": "",
                    "contentWrapper": "",
                    "categories": "",
                    "waitForSelector": ""
                },
                "pagination": {
                    "type": "url_replace",
                    "urlPattern": "",
                    "startPage": 1,
                    "maxPages": 1
                }
            })
        );
    }

    #[test]
    fn test_website_input_from_stored_source_fills_gaps() {
        let site: Website = serde_json::from_str(
            r#"{
                "_id": "7",
                "name": "BBC",
                "slug": "bbc",
                "baseUrl": "https://bbc.co.uk",
                "isActive": false,
                "selectors": {"itemLink": "a.story"},
                "pagination": {"maxPages": 3}
            }"#,
        )
        .unwrap();

        let input = WebsiteInput::from(&site);
        assert_eq!(input.slug, "bbc");
        assert!(!input.is_active);
        assert_eq!(input.engine, "playwright");
        assert_eq!(input.selectors.item_link, "a.story");
        assert_eq!(input.selectors.content_wrapper, "");
        assert_eq!(input.pagination.kind, "url_replace");
        assert_eq!(input.pagination.start_page, 1);
        assert_eq!(input.pagination.max_pages, 3);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&JobStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }
}
