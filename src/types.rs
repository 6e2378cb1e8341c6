use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// One abstract page, as stored in `projects.json`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Project {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub awards: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Keys written by other tools are carried through rewrites untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Project {
    pub fn new(id: u32) -> Self {
        Project { id, ..Default::default() }
    }

    pub fn has_awards(&self) -> bool {
        !self.awards.is_empty()
    }

    /// Competition year as a number; unparseable years count as 0
    pub fn year_number(&self) -> u32 {
        self.year
            .as_deref()
            .and_then(|y| y.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// Checkpoint of the sequential crawler
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Progress {
    pub last_id: u32,
    pub total_scraped: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Progress {
    pub fn starting_at(last_id: u32) -> Self {
        Progress { last_id, total_scraped: 0, updated_at: None }
    }
}

/// Value type of `winner_emails.json`, keyed by project id
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct WinnerRecord {
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub project_title: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub awards: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub linkedin_profiles: Vec<String>,
    #[serde(default, rename = "search_queries")]
    pub search_queries: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
}

pub type WinnersFile = BTreeMap<String, WinnerRecord>;

/// A row of the student directory built from `.docx` exports
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Student {
    #[serde(default)]
    pub uni: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub first: String,
    #[serde(default)]
    pub last: String,
    #[serde(default)]
    pub major: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub source_file: String,
}

/// Output row of the recent winners pipeline
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RecentWinner {
    pub project_id: u32,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub year: Option<String>,
    pub university: String,
    pub major: String,
    pub emails: Vec<String>,
    pub skills: Vec<String>,
    pub linkedin: String,
    pub project_title: String,
    pub awards: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmailSearchResult {
    pub name: String,
    pub emails: Vec<String>,
    pub linkedin_profiles: Vec<String>,
    pub search_queries_used: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SmartSearchResult {
    pub first_name: String,
    pub last_name: String,
    pub university: Option<String>,
    pub email_guesses: Vec<String>,
    pub search_results: Vec<String>,
    pub verified_emails: Vec<String>,
}

/// What a LinkedIn search result page revealed about a person
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkedInProfile {
    pub profile_url: Option<String>,
    pub university: Option<String>,
    pub major: Option<String>,
}

/// Education hints pulled from raw search snippets
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkedInSnippet {
    pub university: Option<String>,
    pub major: Option<String>,
    pub graduation_year: Option<String>,
}

/// Outcome of a single page fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Ok,
    NotFound,
    Forbidden,
    RateLimited,
    ServerError,
    Timeout,
    TlsError,
    NetworkError,
    Unknown,
}

impl FetchStatus {
    pub fn from_http(code: u16) -> Self {
        match code {
            200 => FetchStatus::Ok,
            404 | 410 => FetchStatus::NotFound,
            403 => FetchStatus::Forbidden,
            429 => FetchStatus::RateLimited,
            500..=599 => FetchStatus::ServerError,
            _ => FetchStatus::Unknown,
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetchStatus::Ok => "ok",
            FetchStatus::NotFound => "not_found",
            FetchStatus::Forbidden => "forbidden",
            FetchStatus::RateLimited => "rate_limited",
            FetchStatus::ServerError => "server_error",
            FetchStatus::Timeout => "timeout",
            FetchStatus::TlsError => "tls_error",
            FetchStatus::NetworkError => "network_error",
            FetchStatus::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_round_trip_keeps_unknown_keys() {
        let json = r#"{"id": 42, "title": "Solar", "awards": [], "school": "Central High"}"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.id, 42);
        assert_eq!(project.extra.get("school").and_then(|v| v.as_str()), Some("Central High"));

        let out = serde_json::to_string(&project).unwrap();
        assert!(out.contains("\"school\":\"Central High\""));
        assert!(!out.contains("\"booth\""));
    }

    #[test]
    fn test_abstract_field_name() {
        let mut project = Project::new(1);
        project.abstract_text = Some("text".to_string());
        let out = serde_json::to_string(&project).unwrap();
        assert!(out.contains("\"abstract\":\"text\""));
    }

    #[test]
    fn test_year_number() {
        let mut project = Project::new(1);
        assert_eq!(project.year_number(), 0);
        project.year = Some("2021".to_string());
        assert_eq!(project.year_number(), 2021);
        project.year = Some("n/a".to_string());
        assert_eq!(project.year_number(), 0);
    }

    #[test]
    fn test_fetch_status_from_http() {
        assert_eq!(FetchStatus::from_http(200), FetchStatus::Ok);
        assert_eq!(FetchStatus::from_http(404), FetchStatus::NotFound);
        assert_eq!(FetchStatus::from_http(503), FetchStatus::ServerError);
        assert_eq!(FetchStatus::from_http(302), FetchStatus::Unknown);
        assert_eq!(FetchStatus::RateLimited.to_string(), "rate_limited");
    }
}
