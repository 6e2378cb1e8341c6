use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::config::Config;
use crate::types::{Progress, Project, RecentWinner, Student, WinnersFile};

pub const PROJECTS_FILE: &str = "projects.json";
pub const PROGRESS_FILE: &str = "progress.json";
pub const CATEGORIZED_FILE: &str = "projects_categorized.json";
pub const WINNERS_FILE: &str = "winner_emails.json";
pub const STUDENTS_FILE: &str = "students.json";
pub const RECENT_WINNERS_FILE: &str = "recent_winners_enhanced.json";

/// File locations for one data directory
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Store { dir: dir.into() }
    }

    pub fn from_config(config: &Config) -> Self {
        Store::new(config.data_path())
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    pub fn load_projects(&self) -> Result<Vec<Project>> {
        Ok(read_json(&self.path(PROJECTS_FILE))?.unwrap_or_default())
    }

    /// Like `load_projects`, but a missing file is an error
    pub fn require_projects(&self) -> Result<Vec<Project>> {
        let path = self.path(PROJECTS_FILE);
        read_json(&path)?
            .with_context(|| format!("{:?} not found, run the scrape command first", path))
    }

    pub fn save_projects(&self, projects: &[Project]) -> Result<()> {
        write_json(&self.path(PROJECTS_FILE), projects)
    }

    pub fn save_categorized(&self, projects: &[Project]) -> Result<()> {
        write_json(&self.path(CATEGORIZED_FILE), projects)
    }

    /// Load crawl progress; a missing or corrupt file starts over at `initial_last_id`
    pub fn load_progress(&self, initial_last_id: u32) -> Result<Progress> {
        let path = self.path(PROGRESS_FILE);
        if !path.exists() {
            return Ok(Progress::starting_at(initial_last_id));
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read progress from {:?}", path))?;

        match serde_json::from_str(&content) {
            Ok(progress) => Ok(progress),
            Err(e) => {
                warn!("Ignoring unreadable progress file {:?}: {}", path, e);
                Ok(Progress::starting_at(initial_last_id))
            }
        }
    }

    pub fn save_progress(&self, progress: &Progress) -> Result<()> {
        let mut progress = progress.clone();
        progress.updated_at = Some(chrono::Utc::now().to_rfc3339());
        write_json(&self.path(PROGRESS_FILE), &progress)
    }

    /// Load winners; a corrupt file is moved aside and treated as empty
    ///
    /// Every pass rewrites the winners file, so the unreadable copy is kept
    /// under a `.corrupt-<timestamp>` name instead of being overwritten.
    pub fn load_winners(&self) -> Result<WinnersFile> {
        let path = self.path(WINNERS_FILE);
        if !path.exists() {
            return Ok(WinnersFile::new());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read winners from {:?}", path))?;

        match serde_json::from_str(&content) {
            Ok(winners) => Ok(winners),
            Err(e) => {
                let aside = self.path(&format!(
                    "{}.corrupt-{}",
                    WINNERS_FILE,
                    chrono::Utc::now().format("%Y%m%d%H%M%S")
                ));
                fs::rename(&path, &aside)
                    .with_context(|| format!("Failed to move corrupt {:?} aside", path))?;
                warn!("{:?} is not valid JSON ({}); moved it to {:?}", path, e, aside);
                Ok(WinnersFile::new())
            }
        }
    }

    pub fn save_winners(&self, winners: &WinnersFile) -> Result<()> {
        write_json(&self.path(WINNERS_FILE), winners)
    }

    pub fn load_students(&self) -> Result<Vec<Student>> {
        Ok(read_json(&self.path(STUDENTS_FILE))?.unwrap_or_default())
    }

    pub fn save_students(&self, students: &[Student]) -> Result<()> {
        write_json(&self.path(STUDENTS_FILE), students)
    }

    pub fn save_recent_winners(&self, winners: &[RecentWinner]) -> Result<()> {
        write_json(&self.path(RECENT_WINNERS_FILE), winners)
    }
}

/// Read and parse a JSON file; `None` if it does not exist
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;

    let value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {:?}", path))?;

    Ok(Some(value))
}

/// Rewrite a whole JSON file, creating its directory if needed
///
/// The JSON goes to a temporary file in the same directory, which is then
/// renamed over `path`; readers see either the old file or the new one.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory {:?}", parent))?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in {:?}", parent))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, value)
            .with_context(|| format!("Failed to serialize {:?}", path))?;
        writer
            .flush()
            .with_context(|| format!("Failed to write {:?}", path))?;
    }
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("Failed to sync {:?}", path))?;

    tmp.persist(path)
        .with_context(|| format!("Failed to replace {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WinnerRecord;

    #[test]
    fn test_missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("data"));

        assert!(store.load_projects().unwrap().is_empty());
        assert!(store.load_winners().unwrap().is_empty());
        assert!(store.load_students().unwrap().is_empty());
        assert_eq!(store.load_progress(8888).unwrap().last_id, 8888);
        assert!(store.require_projects().is_err());
    }

    #[test]
    fn test_save_creates_directory_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("nested").join("data"));

        let mut project = Project::new(7);
        project.title = Some("Bridges".to_string());
        store.save_projects(&[project.clone()]).unwrap();

        assert_eq!(store.load_projects().unwrap(), vec![project]);
    }

    #[test]
    fn test_progress_records_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        store.save_progress(&Progress::starting_at(12)).unwrap();
        let loaded = store.load_progress(0).unwrap();
        assert_eq!(loaded.last_id, 12);
        assert!(loaded.updated_at.is_some());
    }

    #[test]
    fn test_corrupt_progress_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        fs::write(store.path(PROGRESS_FILE), "{not json").unwrap();

        assert_eq!(store.load_progress(5).unwrap().last_id, 5);
    }

    #[test]
    fn test_corrupt_winners_file_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        let truncated = r#"{"7": {"student_name": "Doe, Jane", "emails": ["jane@mit.edu"]}, "8": {"student_name": "Roe, R"#;
        fs::write(store.path(WINNERS_FILE), truncated).unwrap();

        assert!(store.load_winners().unwrap().is_empty());
        assert!(!store.path(WINNERS_FILE).exists());

        let kept: Vec<PathBuf> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("winner_emails.json.corrupt-"))
            })
            .collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(fs::read_to_string(&kept[0]).unwrap(), truncated);

        // Saving afterwards leaves the moved copy alone
        store.save_winners(&WinnersFile::new()).unwrap();
        assert_eq!(fs::read_to_string(&kept[0]).unwrap(), truncated);
    }

    /// Serializes one project and then fails, like a save cut short
    struct InterruptedList;

    impl Serialize for InterruptedList {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
            use serde::ser::{Error, SerializeSeq};

            let mut seq = serializer.serialize_seq(None)?;
            seq.serialize_element(&Project::new(99))?;
            Err(S::Error::custom("interrupted"))
        }
    }

    #[test]
    fn test_failed_save_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        let mut project = Project::new(7);
        project.title = Some("Bridges".to_string());
        store.save_projects(&[project.clone()]).unwrap();

        assert!(write_json(&store.path(PROJECTS_FILE), &InterruptedList).is_err());

        assert_eq!(store.load_projects().unwrap(), vec![project]);
        let files = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 1, "no temporary file is left behind");
    }

    #[test]
    fn test_corrupt_projects_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        fs::write(store.path(PROJECTS_FILE), "oops").unwrap();

        assert!(store.load_projects().is_err());
    }

    #[test]
    fn test_winners_keyed_by_project_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());

        let mut winners = WinnersFile::new();
        winners.insert(
            "101".to_string(),
            WinnerRecord { student_name: "Doe, Jane".to_string(), ..Default::default() },
        );
        store.save_winners(&winners).unwrap();

        let loaded = store.load_winners().unwrap();
        assert_eq!(loaded["101"].student_name, "Doe, Jane");
    }
}
