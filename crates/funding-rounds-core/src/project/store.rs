use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::snapshot::ProjectSnapshot;
use crate::error::FundingRoundsError;
use crate::FundingRoundsResult;

/// Somewhere a project snapshot can be loaded from and saved to.
pub trait ProjectStore {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&mut self) -> FundingRoundsResult<Option<ProjectSnapshot>>;

    fn save(&mut self, snapshot: &ProjectSnapshot) -> FundingRoundsResult<()>;
}

// ─── In memory ───────────────────────────────────────────────────────────────

/// Keeps the last saved snapshot in memory. Can be told to fail saves.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshot: Option<ProjectSnapshot>,
    saves: usize,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: ProjectSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            ..Self::default()
        }
    }

    /// Make every following `save` fail until reset.
    pub fn set_fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    pub fn snapshot(&self) -> Option<&ProjectSnapshot> {
        self.snapshot.as_ref()
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl ProjectStore for MemoryStore {
    fn load(&mut self) -> FundingRoundsResult<Option<ProjectSnapshot>> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &ProjectSnapshot) -> FundingRoundsResult<()> {
        if self.fail_saves {
            return Err(FundingRoundsError::Persistence(
                "memory store is set to reject saves".into(),
            ));
        }
        self.snapshot = Some(snapshot.clone());
        self.saves += 1;
        Ok(())
    }
}

// ─── JSON file ───────────────────────────────────────────────────────────────

/// One project per pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProjectStore for JsonFileStore {
    fn load(&mut self) -> FundingRoundsResult<Option<ProjectSnapshot>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(FundingRoundsError::Persistence(format!(
                    "Failed to read '{}': {}",
                    self.path.display(),
                    e
                )))
            }
        };
        if contents.trim().is_empty() {
            return Ok(None);
        }
        ProjectSnapshot::from_json_str(&contents).map(Some)
    }

    fn save(&mut self, snapshot: &ProjectSnapshot) -> FundingRoundsResult<()> {
        let text = snapshot.to_json_string()?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| {
                FundingRoundsError::Persistence(format!(
                    "Failed to create '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        }
        fs::write(&self.path, text).map_err(|e| {
            FundingRoundsError::Persistence(format!(
                "Failed to write '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}
