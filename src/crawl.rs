//! Incremental crawler over numbered abstract pages
//!
//! Projects are appended to `projects.json` in batches. Each flush rewrites
//! the whole file, so an interrupted run loses at most the pending batch and
//! the next run skips every id already stored.

use anyhow::Result;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{Config, ScrapeConfig};
use crate::fetch::Fetcher;
use crate::storage::Store;
use crate::types::{Progress, Project};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Ids actually requested (already stored ids are not counted)
    pub attempted: usize,
    /// New projects found in this run
    pub found: usize,
    /// Projects in the store after the run
    pub total: usize,
}

pub struct Crawler {
    fetcher: Fetcher,
    store: Store,
    config: ScrapeConfig,
}

impl Crawler {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Crawler {
            fetcher: Fetcher::new(&config.scrape)?,
            store: Store::from_config(config),
            config: config.scrape.clone(),
        })
    }

    /// Scrape ids one at a time, resuming after the last checkpoint
    pub async fn scrape_range(&self, start: u32, end: u32) -> Result<CrawlSummary> {
        let batch_size = self.config.batch_size.max(1);
        let mut progress = self.store.load_progress(self.config.initial_last_id)?;
        let mut projects = self.store.load_projects()?;
        let existing: HashSet<u32> = projects.iter().map(|p| p.id).collect();

        let start = start.max(progress.last_id.saturating_add(1));
        info!("Starting scrape from ID {} to {}", start, end);
        info!("Already have {} projects", projects.len());

        let mut summary = CrawlSummary::default();
        let mut batch: Vec<Project> = Vec::new();

        for id in start..=end {
            if existing.contains(&id) {
                continue;
            }

            summary.attempted += 1;
            match self.fetcher.fetch_project(id).await {
                Some(project) => {
                    info!("[{}] Found: {}", id, preview(project.title.as_deref(), 50));
                    batch.push(project);
                }
                None if id % 100 == 0 => debug!("[{}] No project found", id),
                None => {}
            }

            if batch.len() >= batch_size {
                summary.found += batch.len();
                projects.append(&mut batch);
                self.checkpoint(&projects, &mut progress, id)?;
                info!("Saved {} projects total", projects.len());
            }

            if self.config.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.delay_ms)).await;
            }
        }

        summary.found += batch.len();
        projects.append(&mut batch);
        if start <= end {
            self.checkpoint(&projects, &mut progress, end)?;
        }

        summary.total = projects.len();
        info!("Scraping complete. Total projects: {}", summary.total);
        Ok(summary)
    }

    /// Scrape every missing id in `start..=end` with `workers` requests in flight
    ///
    /// Results are taken in completion order, so the stored order is not the
    /// id order.
    pub async fn scrape_parallel(
        &self,
        start: u32,
        end: u32,
        workers: usize,
        batch_size: usize,
    ) -> Result<CrawlSummary> {
        let batch_size = batch_size.max(1);
        let mut projects = self.store.load_projects()?;
        let existing: HashSet<u32> = projects.iter().map(|p| p.id).collect();

        let ids: Vec<u32> = (start..=end).filter(|id| !existing.contains(id)).collect();
        info!("Scraping {} project IDs with {} workers", ids.len(), workers);

        let fetcher = &self.fetcher;
        let mut results = stream::iter(ids)
            .map(move |id| async move { (id, fetcher.fetch_project(id).await) })
            .buffer_unordered(workers.max(1));

        let mut summary = CrawlSummary::default();
        let mut pending: Vec<Project> = Vec::new();

        while let Some((id, project)) = results.next().await {
            summary.attempted += 1;

            if let Some(project) = project {
                summary.found += 1;
                info!(
                    "[{}] ID {}: {}",
                    summary.found,
                    id,
                    preview(project.title.as_deref(), 40)
                );
                pending.push(project);
            }

            if pending.len() >= batch_size {
                projects.append(&mut pending);
                self.store.save_projects(&projects)?;
                info!("Saved {} projects", projects.len());
            }
        }

        if !pending.is_empty() {
            projects.append(&mut pending);
            self.store.save_projects(&projects)?;
        }

        // The whole range is covered now; move the sequential checkpoint
        // forward only when that leaves no gap behind it.
        let mut progress = self.store.load_progress(self.config.initial_last_id)?;
        if start <= progress.last_id.saturating_add(1) {
            progress.last_id = progress.last_id.max(end);
        }
        progress.total_scraped = projects.len();
        self.store.save_progress(&progress)?;

        summary.total = projects.len();
        info!("Complete. Total: {} projects", summary.total);
        Ok(summary)
    }

    fn checkpoint(&self, projects: &[Project], progress: &mut Progress, last_id: u32) -> Result<()> {
        self.store.save_projects(projects)?;
        progress.last_id = last_id;
        progress.total_scraped = projects.len();
        self.store.save_progress(progress)
    }
}

/// First `max` characters of a title for log lines
fn preview(title: Option<&str>, max: usize) -> String {
    let title = title.unwrap_or("Unknown");
    if title.chars().count() > max {
        format!("{}...", title.chars().take(max).collect::<String>())
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview() {
        assert_eq!(preview(None, 10), "Unknown");
        assert_eq!(preview(Some("short"), 10), "short");
        assert_eq!(preview(Some("abcdefghijkl"), 5), "abcde...");
    }
}
