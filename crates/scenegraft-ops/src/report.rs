//! Build outcomes.

use std::time::Duration;

use scenegraft_core::{NodeKey, SceneNodeHandle};
use serde::Serialize;

use crate::error::{BuildError, BuildResult, NodeConstructionFailed};

/// Outcome of a build that got past the structural checks.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Handle of the built root, `None` if the root itself failed to create.
    pub root: Option<SceneNodeHandle>,
    /// Nodes created in the sink, including ones whose properties failed.
    pub created: usize,
    /// `(parent, missing child)` references that were skipped.
    pub skipped_dangling: Vec<(NodeKey, NodeKey)>,
    /// One entry per abandoned subtree.
    pub failures: Vec<NodeConstructionFailed>,
    pub duration: Duration,
}

impl BuildReport {
    pub fn is_complete(&self) -> bool {
        self.root.is_some() && self.failures.is_empty()
    }

    /// Collapse into the root handle, or an aggregate error.
    pub fn into_result(self) -> BuildResult<SceneNodeHandle> {
        match self.root {
            Some(root) if self.failures.is_empty() => Ok(root),
            root => Err(BuildError::Incomplete {
                root,
                created: self.created,
                failures: self.failures,
            }),
        }
    }

    /// Serializable view for CLI and JSON output.
    pub fn summary(&self) -> BuildSummary {
        BuildSummary {
            root: self.root,
            created: self.created,
            complete: self.is_complete(),
            skipped_dangling: self.skipped_dangling.clone(),
            failures: self
                .failures
                .iter()
                .map(|failure| FailureSummary {
                    id: failure.id.clone(),
                    stage: failure.stage.to_string(),
                    cause: failure.cause.to_string(),
                })
                .collect(),
            duration_ms: self.duration.as_millis() as u64,
        }
    }
}

/// Serializable form of a [`BuildReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildSummary {
    pub root: Option<SceneNodeHandle>,
    pub created: usize,
    pub complete: bool,
    pub skipped_dangling: Vec<(NodeKey, NodeKey)>,
    pub failures: Vec<FailureSummary>,
    pub duration_ms: u64,
}

/// Serializable form of a [`NodeConstructionFailed`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureSummary {
    pub id: NodeKey,
    pub stage: String,
    pub cause: String,
}
