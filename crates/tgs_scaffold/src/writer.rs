//! Content-aware file writer for generated trees.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::{ScaffoldError, ScaffoldResult};

/// How an existing file is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Regenerated whenever its content changes.
    Managed,
    /// Written only when absent so hand edits survive.
    ScaffoldOnce,
}

/// What happened (or would happen) to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    Create,
    Update,
    Unchanged,
    Preserved,
}

impl FileAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileAction::Create => "create",
            FileAction::Update => "update",
            FileAction::Unchanged => "unchanged",
            FileAction::Preserved => "preserved",
        }
    }

    /// Whether the file on disk differs from what was rendered.
    pub fn is_change(&self) -> bool {
        matches!(self, FileAction::Create | FileAction::Update)
    }
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A file touched by a run, relative to the writer root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub action: FileAction,
}

/// Writes files under a root, skipping writes whose content is unchanged.
#[derive(Debug)]
pub struct TreeWriter {
    root: PathBuf,
    dry_run: bool,
    records: Vec<FileRecord>,
}

impl TreeWriter {
    pub fn new(root: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            root: root.into(),
            dry_run,
            records: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Write `content` to `relative` under the root.
    pub fn write(&mut self, relative: &Path, content: &str, mode: WriteMode) -> ScaffoldResult<FileAction> {
        let path = self.root.join(relative);
        let action = self.action_for(&path, content, mode)?;

        if action.is_change() && !self.dry_run {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| ScaffoldError::io(parent, e))?;
            }
            fs::write(&path, content).map_err(|e| ScaffoldError::io(&path, e))?;
        }

        debug!("{} {:?}", action, relative);
        self.records.push(FileRecord {
            path: relative.to_path_buf(),
            action,
        });
        Ok(action)
    }

    fn action_for(&self, path: &Path, content: &str, mode: WriteMode) -> ScaffoldResult<FileAction> {
        if !path.exists() {
            return Ok(FileAction::Create);
        }
        if mode == WriteMode::ScaffoldOnce {
            return Ok(FileAction::Preserved);
        }

        let existing = fs::read(path).map_err(|e| ScaffoldError::io(path, e))?;
        if existing == content.as_bytes() {
            Ok(FileAction::Unchanged)
        } else {
            Ok(FileAction::Update)
        }
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<FileRecord> {
        self.records
    }
}
