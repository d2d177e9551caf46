//! Error types for the operations layer.

use std::path::PathBuf;

use scenegraft_core::{NodeKey, PropertyKey, SceneNodeHandle, SinkError};
use thiserror::Error;

/// Result type for operations.
pub type OpsResult<T> = Result<T, OpsError>;

/// Result type for scene builds.
pub type BuildResult<T> = Result<T, BuildError>;

/// Step of a node's construction that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Create,
    Property(PropertyKey),
}

impl std::fmt::Display for BuildStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildStage::Create => write!(f, "create"),
            BuildStage::Property(key) => write!(f, "set {}", key),
        }
    }
}

/// Creation or property assignment failed for one descriptor; its subtree
/// was abandoned.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("node construction failed for `{id}` ({stage}): {cause}")]
pub struct NodeConstructionFailed {
    pub id: NodeKey,
    pub stage: BuildStage,
    #[source]
    pub cause: SinkError,
}

/// Errors returned by a scene build.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// The description's root id is not a key of its nodes.
    #[error("invalid structure: root `{root}` is not present in the description")]
    InvalidStructure { root: NodeKey },

    /// A child reference leads back to an ancestor.
    #[error("cyclic structure: `{id}` is its own ancestor ({})", format_path(.path))]
    CyclicStructure { id: NodeKey, path: Vec<NodeKey> },

    /// One or more subtrees failed. Nodes already created stay in the sink.
    #[error("scene build incomplete: {} subtree(s) failed, {created} node(s) created", .failures.len())]
    Incomplete {
        root: Option<SceneNodeHandle>,
        created: usize,
        failures: Vec<NodeConstructionFailed>,
    },
}

impl BuildError {
    /// Whether nothing was sent to the sink before the error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, BuildError::Incomplete { .. })
    }
}

fn format_path(path: &[NodeKey]) -> String {
    path.iter()
        .map(NodeKey::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors that can occur during operations.
#[derive(Debug, Error)]
pub enum OpsError {
    /// Description document is missing a required member.
    #[error("Invalid description document {path}: {message}")]
    InvalidDocument { path: PathBuf, message: String },

    /// No description path given and none configured.
    #[error("No description file given. Pass a path or set `default_description`")]
    NoDescription,

    /// Scene build failed.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OpsError {
    pub fn invalid_document(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            path: path.into(),
            message: message.into(),
        }
    }
}
