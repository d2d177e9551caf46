//! Request DTOs for operations.

use std::path::PathBuf;

use scenegraft_core::SceneNodeHandle;
use serde::{Deserialize, Serialize};

/// Request to build a description file into a sink.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildRequest {
    /// Description file; falls back to the configured default.
    pub path: Option<PathBuf>,

    /// Overrides the configured sibling concurrency.
    #[serde(default)]
    pub sibling_concurrency: Option<usize>,

    /// Existing node to attach the built tree to.
    #[serde(default)]
    pub parent: Option<SceneNodeHandle>,
}

impl BuildRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.sibling_concurrency = Some(limit);
        self
    }

    pub fn under(mut self, parent: SceneNodeHandle) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// Request to analyze a description file without building it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub path: Option<PathBuf>,
}

impl ValidateRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}
