//! The scene sink capability.
//!
//! A sink is the live scene-graph store of a visualization engine. The
//! builder only ever creates nodes and assigns properties through it; the
//! sink owns node storage, handle allocation and any serialization of
//! concurrent calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::property::{NodeProperty, PropertyKey};

/// Opaque identifier of a node created by a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneNodeHandle(pub u64);

impl std::fmt::Display for SceneNodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNode {
    /// Locator of the content to instantiate. Passed through verbatim,
    /// including the empty string for structural-only nodes.
    pub source_uri: String,
    /// Parent node, `None` for a scene root.
    pub parent: Option<SceneNodeHandle>,
    /// Initial enabled state.
    pub enabled: bool,
}

impl CreateNode {
    pub fn new(source_uri: impl Into<String>, parent: Option<SceneNodeHandle>) -> Self {
        Self {
            source_uri: source_uri.into(),
            parent,
            enabled: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Result type alias for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Failures surfaced by a scene sink.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SinkError {
    /// The handle does not name a live node.
    #[error("unknown node handle {0}")]
    UnknownHandle(SceneNodeHandle),

    /// The value is not acceptable for the property key.
    #[error("value rejected for {key}: {message}")]
    TypeMismatch { key: PropertyKey, message: String },

    /// The sink refused the request (malformed locator, resource exhaustion).
    #[error("request rejected: {message}")]
    Rejected { message: String },

    /// The sink could not be reached or has been torn down.
    #[error("sink unavailable: {message}")]
    Unavailable { message: String },
}

impl SinkError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

/// Capability exposed by a scene-graph store.
///
/// Every call is a suspension point. Implementations must tolerate
/// concurrent calls targeting different handles.
#[async_trait]
pub trait SceneSink: Send + Sync {
    /// Create a node and return its handle.
    async fn create_node(&self, request: CreateNode) -> SinkResult<SceneNodeHandle>;

    /// Assign a property on an existing node.
    async fn set_property(&self, handle: SceneNodeHandle, property: NodeProperty)
        -> SinkResult<()>;

    /// Read a property. `Ok(None)` means the property was never assigned.
    async fn get_property(
        &self,
        handle: SceneNodeHandle,
        key: PropertyKey,
    ) -> SinkResult<Option<NodeProperty>>;

    /// Direct children of a node, in creation order.
    async fn children(&self, handle: SceneNodeHandle) -> SinkResult<Vec<SceneNodeHandle>>;
}
