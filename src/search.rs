//! Search engine scraping for contact details
//!
//! Result pages are fetched as plain HTML; any failure yields an empty page
//! so a blocked engine just means "nothing found".

use anyhow::{Context, Result};
use scraper::Html;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::config::SearchConfig;
use crate::email;
use crate::linkedin;
use crate::types::{EmailSearchResult, LinkedInProfile, LinkedInSnippet, SmartSearchResult};

/// Queries issued per person by `find_email_for_person`
const MAX_QUERIES_PER_PERSON: usize = 3;

#[derive(Debug, Clone)]
pub struct SearchClient {
    client: reqwest::Client,
    config: SearchConfig,
}

impl SearchClient {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create search HTTP client")?;

        Ok(SearchClient { client, config: config.clone() })
    }

    pub async fn duckduckgo(&self, query: &str) -> String {
        let url = format!("{}?q={}", self.config.duckduckgo_url, encode_query(query));
        self.get_page(&url, "DuckDuckGo").await
    }

    pub async fn google(&self, query: &str) -> String {
        let url = format!("{}?q={}", self.config.google_url, encode_query(query));
        self.get_page(&url, "Google").await
    }

    async fn get_page(&self, url: &str, engine: &str) -> String {
        match self.client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => resp.text().await.unwrap_or_default(),
            Ok(resp) => {
                debug!("{} returned HTTP {}", engine, resp.status().as_u16());
                String::new()
            }
            Err(e) => {
                warn!("Error searching {}: {}", engine, e);
                String::new()
            }
        }
    }

    async fn pause(&self, millis: u64) {
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    /// LinkedIn profile links for a name, via a site-restricted web search
    pub async fn linkedin_profiles(&self, name: &str) -> Vec<String> {
        let html = self.google(&format!("{} site:linkedin.com", name)).await;
        linkedin::profile_links(&html)
    }

    /// Look for any address attached to a person's name
    pub async fn find_email_for_person(
        &self,
        name: &str,
        project_title: Option<&str>,
        year: Option<&str>,
    ) -> EmailSearchResult {
        let mut result = EmailSearchResult { name: name.to_string(), ..Default::default() };

        if name.chars().count() < 3 {
            return result;
        }

        let mut queries = vec![
            format!("\"{}\" email", name),
            format!("\"{}\" contact", name),
            format!("\"{}\" ISEF email", name),
        ];
        if let Some(title) = project_title {
            queries.push(format!("\"{}\" \"{}\" email", name, title));
        }
        if let Some(year) = year {
            queries.push(format!("\"{}\" ISEF {} email", name, year));
        }

        let mut found = Vec::new();
        for query in queries.into_iter().take(MAX_QUERIES_PER_PERSON) {
            info!("  Searching: {}", query);
            let html = self.duckduckgo(&query).await;

            if !html.is_empty() {
                found.extend(email::extract_emails(&html));
                let text: String = Html::parse_document(&html).root_element().text().collect();
                found.extend(email::extract_emails(&text));
            }

            result.search_queries_used.push(query);
            self.pause(self.config.query_delay_ms).await;
        }

        result.linkedin_profiles = self.linkedin_profiles(name).await;

        found.sort();
        found.dedup();
        result.emails = email::filter_junk_domains(found);
        result
    }

    /// University-aware search: template guesses plus addresses seen in results
    pub async fn smart_email_search(
        &self,
        first_name: &str,
        last_name: &str,
        awards: &[String],
    ) -> SmartSearchResult {
        let mut result = SmartSearchResult {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            ..Default::default()
        };

        let university = email::extract_university_from_awards(awards);
        if let Some(uni) = &university {
            info!("  Detected university: {}", uni);
            result.email_guesses = email::generate_email_guesses(first_name, last_name, uni);
            if !result.email_guesses.is_empty() {
                let shown: Vec<&str> = result.email_guesses.iter().take(3).map(String::as_str).collect();
                info!("  Email guesses: {}", shown.join(", "));
            }
        }

        let full_name = format!("{} {}", first_name, last_name);
        let mut queries = vec![format!("\"{}\" email", full_name)];
        if let Some(uni) = &university {
            queries.push(format!("\"{}\" {} email", full_name, uni));
        }
        queries.push(format!("\"{}\" ISEF contact", full_name));
        queries.push(format!("\"{}\" LinkedIn", full_name));

        for query in &queries {
            info!("  Searching: {}", query);
            let html = self.google(query).await;
            let emails = email::filter_junk_addresses(email::extract_emails(&html));
            if !emails.is_empty() {
                info!("  Found emails: {}", emails.join(", "));
                result.search_results.extend(emails);
            }
            self.pause(self.config.query_delay_ms).await;
        }

        let mut verified: Vec<String> = result
            .email_guesses
            .iter()
            .chain(result.search_results.iter())
            .cloned()
            .collect();
        verified.sort();
        verified.dedup();

        result.university = university;
        result.verified_emails = verified;
        result
    }

    /// Profile url plus school and major from a `site:linkedin.com/in` search
    pub async fn linkedin_profile(&self, first_name: &str, last_name: &str) -> LinkedInProfile {
        let query = format!("\"{} {}\" site:linkedin.com/in", first_name, last_name);
        let html = self.google(&query).await;
        parse_profile_page(&html)
    }

    /// Education hints from the raw result page of a "<name> linkedin student" search
    pub async fn linkedin_major(&self, first_name: &str, last_name: &str) -> LinkedInSnippet {
        let query = format!("\"{} {}\" linkedin student", first_name, last_name);
        let html = self.google(&query).await;
        parse_snippet_page(&html)
    }
}

/// `quote_plus`-style encoding of a query string value
pub fn encode_query(query: &str) -> String {
    form_urlencoded::byte_serialize(query.as_bytes()).collect()
}

pub fn parse_profile_page(html: &str) -> LinkedInProfile {
    if html.is_empty() {
        return LinkedInProfile::default();
    }

    let profile_url = linkedin::linkedin_hrefs(html)
        .iter()
        .find_map(|href| linkedin::profile_url(href));

    let text: String = Html::parse_document(html).root_element().text().collect();

    LinkedInProfile {
        profile_url,
        university: linkedin::university_from_profile_text(&text),
        major: linkedin::major(&text),
    }
}

pub fn parse_snippet_page(html: &str) -> LinkedInSnippet {
    LinkedInSnippet {
        university: linkedin::university_from_snippet(html),
        major: linkedin::major(html),
        graduation_year: linkedin::graduation_year(html),
    }
}
