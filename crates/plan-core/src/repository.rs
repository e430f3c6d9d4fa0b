//! Persistence collaborator
//!
//! Loads the aggregate when a session opens and saves `current` after a
//! commit. Two implementations are provided:
//! - [`InMemoryRepository`]: concurrent map, for tests and embedding
//! - [`JsonFileRepository`]: one pretty-printed JSON document per project

use crate::error::RepositoryError;
use dashmap::DashMap;
use plan_model::ProjectState;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use ulid::Ulid;

/// Loads and saves project aggregates
#[async_trait::async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Load the aggregate for `project_id`
    async fn load(&self, project_id: &str) -> Result<ProjectState, RepositoryError>;

    /// Persist `state` as the aggregate for `project_id`
    async fn save(&self, project_id: &str, state: &ProjectState) -> Result<(), RepositoryError>;
}

/// In-memory repository backed by a concurrent map
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    projects: DashMap<String, ProjectState>,
}

impl InMemoryRepository {
    /// Create empty repository
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a project
    pub fn insert(&self, project_id: impl Into<String>, state: ProjectState) {
        self.projects.insert(project_id.into(), state);
    }

    /// Stored aggregate, if any
    #[must_use]
    pub fn get(&self, project_id: &str) -> Option<ProjectState> {
        self.projects.get(project_id).map(|entry| entry.value().clone())
    }

    /// Number of stored projects
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

#[async_trait::async_trait]
impl ProjectRepository for InMemoryRepository {
    async fn load(&self, project_id: &str) -> Result<ProjectState, RepositoryError> {
        self.get(project_id)
            .ok_or_else(|| RepositoryError::NotFound(project_id.to_string()))
    }

    async fn save(&self, project_id: &str, state: &ProjectState) -> Result<(), RepositoryError> {
        self.projects.insert(project_id.to_string(), state.clone());
        Ok(())
    }
}

/// Directory of `<project-id>.json` documents
///
/// Saves write a uniquely named sibling temp file and rename it over the
/// target, so a reader never observes a half-written document and
/// concurrent saves never share a temp file. The last rename wins; callers
/// that need ordering serialize their saves.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    root: PathBuf,
}

impl JsonFileRepository {
    /// Create repository rooted at `root` (created on first save)
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Document path for `project_id`
    ///
    /// # Errors
    /// Returns `RepositoryError::InvalidProjectId` for ids that are empty or
    /// could escape the root directory
    pub fn path_for(&self, project_id: &str) -> Result<PathBuf, RepositoryError> {
        let valid = !project_id.is_empty()
            && project_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !project_id.starts_with('.');
        if !valid {
            return Err(RepositoryError::InvalidProjectId(project_id.to_string()));
        }
        Ok(self.root.join(format!("{project_id}.json")))
    }
}

#[async_trait::async_trait]
impl ProjectRepository for JsonFileRepository {
    async fn load(&self, project_id: &str) -> Result<ProjectState, RepositoryError> {
        let path = self.path_for(project_id)?;
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RepositoryError::NotFound(project_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let value: serde_json::Value = serde_json::from_str(&text)?;
        let state = ProjectState::from_value(&value).map_err(|source| RepositoryError::Corrupt {
            project_id: project_id.to_string(),
            source,
        })?;

        tracing::debug!(project_id, path = %path.display(), records = state.record_count(), "project loaded");
        Ok(state)
    }

    async fn save(&self, project_id: &str, state: &ProjectState) -> Result<(), RepositoryError> {
        let path = self.path_for(project_id)?;
        tokio::fs::create_dir_all(&self.root).await?;

        let payload = serde_json::to_vec_pretty(state)?;
        let temp_path = self.root.join(format!("{project_id}.{}.tmp", Ulid::new()));
        tokio::fs::write(&temp_path, payload).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Ok(fingerprint) = state.fingerprint() {
            tracing::debug!(project_id, fingerprint = %fingerprint.short(), "project saved");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_model::{Collection, ProjectRecord, Slot};
    use serde_json::json;
    use std::sync::Arc;

    fn state() -> ProjectState {
        let tags = Collection::from_value(&json!([{"id": "t1", "label": "b2b"}]), "tags").unwrap();
        ProjectState::new(ProjectRecord::new("p1", "Acme")).with_collection(Slot::Tags, tags)
    }

    #[tokio::test]
    async fn in_memory_roundtrip() {
        let repo = InMemoryRepository::new();
        assert!(matches!(repo.load("p1").await, Err(RepositoryError::NotFound(_))));

        repo.save("p1", &state()).await.unwrap();
        assert_eq!(repo.load("p1").await.unwrap(), state());
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("projects"));

        repo.save("p1", &state()).await.unwrap();
        let loaded = repo.load("p1").await.unwrap();
        assert_eq!(loaded, state());
        let names: Vec<_> = std::fs::read_dir(dir.path().join("projects"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("p1.json")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn json_file_overlapping_saves_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Arc::new(JsonFileRepository::new(dir.path()));

        for round in 0..10 {
            let saves: Vec<_> = (0..8)
                .map(|i| {
                    let repo = Arc::clone(&repo);
                    let mut state = state();
                    state.project_mut().title = format!("Acme {round}-{i}");
                    tokio::spawn(async move { repo.save("p1", &state).await })
                })
                .collect();
            for save in saves {
                save.await.unwrap().unwrap();
            }
        }

        let loaded = repo.load("p1").await.unwrap();
        assert!(loaded.project().title.starts_with("Acme 9-"));
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter(|entry| entry.as_ref().unwrap().path().extension().is_some_and(|ext| ext == "tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn json_file_missing_project() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());
        assert!(matches!(repo.load("nope").await, Err(RepositoryError::NotFound(id)) if id == "nope"));
    }

    #[tokio::test]
    async fn json_file_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("p1.json"), r#"{"project": {"id": "p1", "title": "x"}, "gadgets": []}"#)
            .unwrap();
        let repo = JsonFileRepository::new(dir.path());
        assert!(matches!(repo.load("p1").await, Err(RepositoryError::Corrupt { .. })));
    }

    #[test]
    fn rejects_path_like_ids() {
        let repo = JsonFileRepository::new("/tmp/projects");
        assert!(repo.path_for("../etc").is_err());
        assert!(repo.path_for("a/b").is_err());
        assert!(repo.path_for("").is_err());
        assert!(repo.path_for(".hidden").is_err());
        assert!(repo.path_for("proj-01_a").is_ok());
    }
}
