//! Enrichment passes over award-winning projects
//!
//! Every pass reads `winner_emails.json` (keyed by project id), adds what it
//! can find and writes the whole file back.

use anyhow::Result;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{Config, SearchConfig, WinnersConfig};
use crate::email;
use crate::fetch::Fetcher;
use crate::search::SearchClient;
use crate::skills;
use crate::storage::Store;
use crate::types::{Project, RecentWinner, WinnerRecord, WinnersFile};

/// Outcome of `scrape_winner_emails`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmailPassStats {
    pub winners: usize,
    pub processed: usize,
    pub skipped_existing: usize,
    pub without_name: usize,
    pub total_records: usize,
}

/// Outcome of `smart_email_pass`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmartPassStats {
    pub skipped: usize,
    pub processed: usize,
    pub found: usize,
    pub with_emails: usize,
    pub total_records: usize,
}

/// Outcome of `recent_winners`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecentStats {
    pub candidates: usize,
    pub processed: usize,
    pub with_university: usize,
    pub with_emails: usize,
    pub with_major: usize,
}

pub struct WinnerPipeline {
    fetcher: Fetcher,
    search: SearchClient,
    store: Store,
    search_config: SearchConfig,
    config: WinnersConfig,
}

impl WinnerPipeline {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(WinnerPipeline {
            fetcher: Fetcher::new(&config.scrape)?,
            search: SearchClient::new(&config.search)?,
            store: Store::from_config(config),
            search_config: config.search.clone(),
            config: config.winners.clone(),
        })
    }

    async fn pause(&self, millis: u64) {
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    /// Search the web for an address of every award winner
    ///
    /// With `skip_existing`, records already in the winners file are kept and
    /// their projects are not searched again.
    pub async fn scrape_winner_emails(
        &self,
        limit: Option<usize>,
        skip_existing: bool,
    ) -> Result<EmailPassStats> {
        let projects = self.store.require_projects()?;
        let mut winners: Vec<&Project> = projects.iter().filter(|p| p.has_awards()).collect();
        info!("Found {} award-winning projects", winners.len());

        if let Some(limit) = limit {
            winners.truncate(limit);
            info!("Processing first {} winners", limit);
        }

        let mut results = if skip_existing {
            let existing = self.store.load_winners()?;
            info!("Loaded {} existing email records", existing.len());
            existing
        } else {
            WinnersFile::new()
        };

        let mut stats = EmailPassStats { winners: winners.len(), ..Default::default() };
        let save_every = self.config.save_every.max(1);

        for project in winners {
            let key = project.id.to_string();
            if skip_existing && results.contains_key(&key) {
                stats.skipped_existing += 1;
                continue;
            }

            let student_name = match &project.student_name {
                Some(name) => Some(name.clone()),
                None => {
                    info!("Project {}: fetching student name", project.id);
                    let name = self.fetcher.fetch_finalist_name(project.id).await;
                    self.pause(self.search_config.page_delay_ms).await;
                    name
                }
            };

            let Some(student_name) = student_name else {
                info!("Project {}: no student name found, skipping", project.id);
                stats.without_name += 1;
                continue;
            };

            info!("Project {}: {}", project.id, student_name);
            let found = self
                .search
                .find_email_for_person(&student_name, project.title.as_deref(), project.year.as_deref())
                .await;

            if found.emails.is_empty() {
                info!("  No emails found");
            } else {
                info!("  Found {} email(s): {}", found.emails.len(), found.emails.join(", "));
            }

            results.insert(
                key,
                WinnerRecord {
                    student_name,
                    project_title: project.title.clone(),
                    year: project.year.clone(),
                    awards: project.awards.clone(),
                    emails: found.emails,
                    linkedin_profiles: found.linkedin_profiles,
                    search_queries: found.search_queries_used,
                    ..Default::default()
                },
            );

            stats.processed += 1;
            if stats.processed % save_every == 0 {
                self.store.save_winners(&results)?;
                info!("Saved progress: {} winners processed", stats.processed);
            }

            self.pause(self.search_config.person_delay_ms).await;
        }

        self.store.save_winners(&results)?;
        stats.total_records = results.len();
        Ok(stats)
    }

    /// University-aware search for winners that still have no address
    pub async fn smart_email_pass(&self) -> Result<SmartPassStats> {
        let mut winners = self.store.load_winners()?;
        let mut stats = SmartPassStats::default();
        let pending = winners.values().filter(|w| w.emails.is_empty()).count();

        for (project_id, winner) in winners.iter_mut() {
            if !winner.emails.is_empty() {
                stats.skipped += 1;
                continue;
            }

            let Some((last, first)) = split_last_first(&winner.student_name) else {
                continue;
            };

            stats.processed += 1;
            info!(
                "[{}/{}] Project {}: {} {}",
                stats.processed, pending, project_id, first, last
            );

            let result = self.search.smart_email_search(&first, &last, &winner.awards).await;
            if result.verified_emails.is_empty() {
                info!("  No emails found");
            } else {
                info!("  Found {} email(s)", result.verified_emails.len());
                winner.emails = result.verified_emails;
                winner.university = result.university;
                stats.found += 1;
            }

            self.pause(self.search_config.person_delay_ms).await;
        }

        self.store.save_winners(&winners)?;
        stats.with_emails = winners.values().filter(|w| !w.emails.is_empty()).count();
        stats.total_records = winners.len();
        Ok(stats)
    }

    /// Copy category and country from the project data into winner records
    /// that do not have them yet. Returns the number of records touched.
    pub fn merge_project_fields(&self) -> Result<usize> {
        let projects = self.store.require_projects()?;
        let mut winners = self.store.load_winners()?;
        let by_id = index_projects(&projects);

        let mut merged = 0;
        for (project_id, winner) in winners.iter_mut() {
            let Some(project) = by_id.get(project_id.as_str()) else {
                continue;
            };

            let mut touched = false;
            if winner.category.is_none() {
                winner.category = Some(project.category.clone().unwrap_or_default());
                touched = true;
            }
            if winner.country.is_none() {
                winner.country = Some(project.country.clone().unwrap_or_default());
                touched = true;
            }
            if touched {
                merged += 1;
            }
        }

        self.store.save_winners(&winners)?;
        Ok(merged)
    }

    /// Attach skill tags and, where a LinkedIn snippet shows one, a major
    /// and university. Returns the number of records that gained data.
    pub async fn enhance_with_skills(&self) -> Result<usize> {
        let projects = self.store.load_projects()?;
        let mut winners = self.store.load_winners()?;
        let by_id = index_projects(&projects);

        info!("Enhancing {} winners with major and skills data", winners.len());
        let mut enhanced = 0;

        for (project_id, winner) in winners.iter_mut() {
            let project = by_id.get(project_id.as_str()).copied();
            let abstract_text = project.and_then(|p| p.abstract_text.as_deref()).unwrap_or("");
            let category = project.and_then(|p| p.category.as_deref()).unwrap_or("");

            let skills = skills::extract_skill_groups(
                winner.project_title.as_deref().unwrap_or(""),
                abstract_text,
                category,
            );
            info!("Project {}: skills {}", project_id, skills.join(", "));

            let mut major = None;
            if winner.student_name.contains(',') {
                if let Some((first, last)) = parse_student_name(&winner.student_name) {
                    let snippet = self.search.linkedin_major(&first, &last).await;
                    if let Some(found) = &snippet.major {
                        info!("  Found major: {}", found);
                    }
                    if winner.university.is_none() {
                        winner.university = snippet.university;
                    }
                    major = snippet.major;
                    self.pause(self.search_config.query_delay_ms).await;
                }
            }

            if !skills.is_empty() || major.is_some() {
                enhanced += 1;
            }
            winner.skills = Some(skills.join(", "));
            winner.major = Some(major.unwrap_or_else(|| category.to_string()));
        }

        self.store.save_winners(&winners)?;
        Ok(enhanced)
    }

    /// Profile recent winners: finalist name, skills, LinkedIn, university
    /// and address guesses. Writes `recent_winners_enhanced.json`.
    pub async fn recent_winners(&self, limit: usize) -> Result<RecentStats> {
        let projects = self.store.require_projects()?;
        let recent: Vec<&Project> = projects
            .iter()
            .filter(|p| p.has_awards() && p.year_number() >= self.config.recent_since_year)
            .collect();
        info!(
            "Found {} award winners since {}",
            recent.len(),
            self.config.recent_since_year
        );

        let mut stats = RecentStats { candidates: recent.len(), ..Default::default() };
        let mut results = Vec::new();

        for project in recent.into_iter().take(limit) {
            info!("Project {}: {}", project.id, project.title.as_deref().unwrap_or(""));

            if let Some(winner) = self.profile_recent_winner(project).await {
                results.push(winner);
            }
            self.pause(self.search_config.person_delay_ms).await;
        }

        self.store.save_recent_winners(&results)?;

        stats.processed = results.len();
        stats.with_university = results.iter().filter(|r| !r.university.is_empty()).count();
        stats.with_emails = results.iter().filter(|r| !r.emails.is_empty()).count();
        stats.with_major = results.iter().filter(|r| !r.major.is_empty()).count();
        Ok(stats)
    }

    async fn profile_recent_winner(&self, project: &Project) -> Option<RecentWinner> {
        let Some(name) = self.fetcher.fetch_finalist_name(project.id).await else {
            warn!("  Could not extract student name");
            return None;
        };

        let Some((first_name, last_name)) = parse_student_name(&name) else {
            warn!("  Could not parse name {:?}", name);
            return None;
        };

        let category = project.category.clone().unwrap_or_default();
        let skills = skills::extract_skill_phrases(
            project.title.as_deref().unwrap_or(""),
            project.abstract_text.as_deref().unwrap_or(""),
            &category,
        );

        let profile = self.search.linkedin_profile(&first_name, &last_name).await;
        let university = profile
            .university
            .or_else(|| email::extract_university_from_awards(&project.awards));

        let emails = university
            .as_deref()
            .map(|uni| email::generate_email_guesses(&first_name, &last_name, uni))
            .unwrap_or_default();

        match (&university, emails.first()) {
            (Some(uni), Some(guess)) => info!("  {} ({}), guessed {}", name, uni, guess),
            (Some(uni), None) => info!("  {} ({}), no address template", name, uni),
            (None, _) => info!("  {}: no university found", name),
        }

        Some(RecentWinner {
            project_id: project.id,
            name,
            first_name,
            last_name,
            year: project.year.clone(),
            university: university.unwrap_or_default(),
            major: profile.major.unwrap_or(category),
            emails,
            skills,
            linkedin: profile.profile_url.unwrap_or_default(),
            project_title: project.title.clone().unwrap_or_default(),
            awards: project.awards.clone(),
        })
    }
}

fn index_projects(projects: &[Project]) -> HashMap<String, &Project> {
    projects.iter().map(|p| (p.id.to_string(), p)).collect()
}

/// Split a `"Last, First Middle"` name into (last, "First Middle")
fn split_last_first(name: &str) -> Option<(String, String)> {
    let (last, first) = name.split_once(',')?;
    let (last, first) = (last.trim(), first.trim());
    if last.is_empty() || first.is_empty() {
        return None;
    }
    Some((last.to_string(), first.to_string()))
}

/// Split a finalist name into (first, last)
///
/// `"Last, First Middle"` gives the first word after the comma as the first
/// name; anything else gives the first and last whitespace tokens. `None`
/// when either part is missing.
pub fn parse_student_name(name: &str) -> Option<(String, String)> {
    let (first, last) = match name.split_once(',') {
        Some((last, rest)) => (
            rest.split_whitespace().next().unwrap_or(""),
            last.trim(),
        ),
        None => {
            let parts: Vec<&str> = name.split_whitespace().collect();
            match parts.as_slice() {
                [first, .., last] => (*first, *last),
                _ => ("", ""),
            }
        }
    };

    if first.is_empty() || last.is_empty() {
        return None;
    }
    Some((first.to_string(), last.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comma_name() {
        assert_eq!(
            parse_student_name("Doe, Jane Marie"),
            Some(("Jane".to_string(), "Doe".to_string()))
        );
    }

    #[test]
    fn test_parse_plain_name() {
        assert_eq!(
            parse_student_name("Jane Marie Doe"),
            Some(("Jane".to_string(), "Doe".to_string()))
        );
    }

    #[test]
    fn test_parse_incomplete_names() {
        assert_eq!(parse_student_name("Cher"), None);
        assert_eq!(parse_student_name("Doe, "), None);
        assert_eq!(parse_student_name(""), None);
    }

    #[test]
    fn test_split_last_first_keeps_middle_names() {
        assert_eq!(
            split_last_first("Doe, Jane Marie"),
            Some(("Doe".to_string(), "Jane Marie".to_string()))
        );
        assert_eq!(split_last_first("Jane Doe"), None);
    }
}
