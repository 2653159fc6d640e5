//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::{EntityId, EntityPrefix};

/// Represents a SAT project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .sat/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            let sat_dir = current.join(".sat");
            if sat_dir.is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());

        let sat_dir = root.join(".sat");
        if sat_dir.exists() {
            return Err(ProjectError::AlreadyExists(root.clone()));
        }

        std::fs::create_dir_all(&sat_dir)
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        let config_path = sat_dir.join("config.yaml");
        std::fs::write(&config_path, Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Self::create_entity_dirs(&root)?;

        Ok(Self { root })
    }

    /// Force initialization even if .sat/ exists
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());

        let sat_dir = root.join(".sat");

        std::fs::create_dir_all(&sat_dir)
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        let config_path = sat_dir.join("config.yaml");
        std::fs::write(&config_path, Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Self::create_entity_dirs(&root)?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# SAT Project Configuration

# Default author for new entities (can be overridden by global config)
# author: ""

# Editor to use for `sat edit` commands (default: $EDITOR)
# editor: ""
"#
    }

    fn create_entity_dirs(root: &Path) -> Result<(), ProjectError> {
        let dirs = [
            "categories",
            "checklists",
            "audits",
            "findings",
            "actions",
        ];

        for dir in dirs {
            std::fs::create_dir_all(root.join(dir))
                .map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        Ok(())
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .sat configuration directory
    pub fn sat_dir(&self) -> PathBuf {
        self.root.join(".sat")
    }

    /// Get the path for a new entity file
    pub fn entity_path(&self, prefix: EntityPrefix, id: &EntityId) -> PathBuf {
        self.root
            .join(Self::entity_directory(prefix))
            .join(format!("{}.sat.yaml", id))
    }

    /// Get the directory for a given entity prefix
    pub fn entity_directory(prefix: EntityPrefix) -> &'static str {
        match prefix {
            EntityPrefix::Aud => "audits",
            EntityPrefix::Chk => "checklists",
            EntityPrefix::Cat => "categories",
            EntityPrefix::Fnd => "findings",
            EntityPrefix::Act => "actions",
        }
    }

    /// Get the absolute directory for a given entity prefix
    pub fn entity_dir(&self, prefix: EntityPrefix) -> PathBuf {
        self.root.join(Self::entity_directory(prefix))
    }

    /// Iterate all entity files of a given prefix type
    pub fn iter_entity_files(&self, prefix: EntityPrefix) -> impl Iterator<Item = PathBuf> {
        let dir = self.root.join(Self::entity_directory(prefix));
        walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .to_string_lossy()
                    .ends_with(".sat.yaml")
            })
            .map(|e| e.path().to_path_buf())
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a SAT project (searched from {searched_from:?}). Run 'sat init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("SAT project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.sat_dir().exists());
        assert!(project.sat_dir().join("config.yaml").exists());
        assert!(project.root().join("categories").is_dir());
        assert!(project.root().join("checklists").is_dir());
        assert!(project.root().join("audits").is_dir());
        assert!(project.root().join("findings").is_dir());
        assert!(project.root().join("actions").is_dir());
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
    }

    #[test]
    fn test_project_discover_finds_sat_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_sat_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }
}
