//! In-process scene sink.
//!
//! Stores the live scene in a petgraph `StableDiGraph` (parent -> child
//! edges) and journals every call it receives, failed ones included.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;
use serde::Serialize;
use tracing::trace;

use crate::property::{NodeProperty, PropertyKey, Transform};
use crate::sink::{CreateNode, SceneNodeHandle, SceneSink, SinkError, SinkResult};

/// One call received by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum SinkCall {
    /// `handle` is `None` when creation was rejected.
    Create {
        source_uri: String,
        parent: Option<SceneNodeHandle>,
        handle: Option<SceneNodeHandle>,
    },
    SetProperty {
        handle: SceneNodeHandle,
        key: PropertyKey,
    },
    GetProperty {
        handle: SceneNodeHandle,
        key: PropertyKey,
    },
    Children {
        handle: SceneNodeHandle,
    },
}

impl SinkCall {
    /// The node the call targeted, or created.
    pub fn handle(&self) -> Option<SceneNodeHandle> {
        match self {
            SinkCall::Create { handle, .. } => *handle,
            SinkCall::SetProperty { handle, .. }
            | SinkCall::GetProperty { handle, .. }
            | SinkCall::Children { handle } => Some(*handle),
        }
    }
}

#[derive(Debug, Clone)]
struct SceneNode {
    handle: SceneNodeHandle,
    parent: Option<SceneNodeHandle>,
    source_uri: String,
    enabled: bool,
    transform: Option<Transform>,
    label: Option<String>,
    appearance_uri: Option<String>,
}

#[derive(Debug, Default)]
struct SceneState {
    graph: StableDiGraph<SceneNode, ()>,
    index: HashMap<SceneNodeHandle, NodeIndex>,
    roots: Vec<SceneNodeHandle>,
    next_handle: u64,
    journal: Vec<SinkCall>,
}

impl SceneState {
    fn node(&self, handle: SceneNodeHandle) -> SinkResult<&SceneNode> {
        self.index
            .get(&handle)
            .and_then(|idx| self.graph.node_weight(*idx))
            .ok_or(SinkError::UnknownHandle(handle))
    }

    fn node_mut(&mut self, handle: SceneNodeHandle) -> SinkResult<&mut SceneNode> {
        self.index
            .get(&handle)
            .and_then(|idx| self.graph.node_weight_mut(*idx))
            .ok_or(SinkError::UnknownHandle(handle))
    }

    /// Children sorted by handle, which is creation order.
    fn children_of(&self, handle: SceneNodeHandle) -> SinkResult<Vec<SceneNodeHandle>> {
        let idx = *self
            .index
            .get(&handle)
            .ok_or(SinkError::UnknownHandle(handle))?;
        let mut children: Vec<SceneNodeHandle> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .filter_map(|child| self.graph.node_weight(child).map(|n| n.handle))
            .collect();
        children.sort();
        Ok(children)
    }

    /// World-space origin of a node: local transforms composed from its
    /// scene root down. Nodes without a transform contribute the identity.
    fn global_center(&self, handle: SceneNodeHandle) -> SinkResult<[f64; 3]> {
        let mut chain = Vec::new();
        let mut current = Some(handle);
        while let Some(h) = current {
            let node = self.node(h)?;
            chain.push(node.transform.as_ref());
            current = node.parent;
        }

        chain
            .into_iter()
            .rev()
            .flatten()
            .try_fold(Transform::identity(), |world, local| world.compose(local))
            .and_then(|world| world.translation_part())
            .ok_or_else(|| SinkError::TypeMismatch {
                key: PropertyKey::GlobalCenter,
                message: "ancestor transform is not a 4x4 matrix".to_string(),
            })
    }
}

/// In-memory [`SceneSink`] with call journaling and fault injection.
#[derive(Debug, Default)]
pub struct MemorySink {
    state: Mutex<SceneState>,
    rejected_uris: HashSet<String>,
    rejected_properties: HashSet<(String, PropertyKey)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every creation request for `source_uri`.
    pub fn with_rejected_uri(mut self, source_uri: impl Into<String>) -> Self {
        self.rejected_uris.insert(source_uri.into());
        self
    }

    /// Reject assignments of `key` on nodes created from `source_uri`.
    pub fn with_rejected_property(mut self, source_uri: impl Into<String>, key: PropertyKey) -> Self {
        self.rejected_properties.insert((source_uri.into(), key));
        self
    }

    fn lock(&self) -> SinkResult<MutexGuard<'_, SceneState>> {
        self.state.lock().map_err(|_| SinkError::Unavailable {
            message: "scene state lock poisoned".to_string(),
        })
    }

    fn lock_lossy(&self) -> MutexGuard<'_, SceneState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every call received so far, in arrival order.
    pub fn journal(&self) -> Vec<SinkCall> {
        self.lock_lossy().journal.clone()
    }

    pub fn node_count(&self) -> usize {
        self.lock_lossy().graph.node_count()
    }

    /// Nodes created without a parent, in creation order.
    pub fn roots(&self) -> Vec<SceneNodeHandle> {
        self.lock_lossy().roots.clone()
    }

    /// Serializable copy of the current scene.
    pub fn snapshot(&self) -> SceneSnapshot {
        let state = self.lock_lossy();
        let mut nodes: Vec<SnapshotNode> = state
            .graph
            .node_weights()
            .map(|node| SnapshotNode {
                handle: node.handle,
                parent: node.parent,
                source_uri: node.source_uri.clone(),
                enabled: node.enabled,
                transform: node.transform.clone(),
                label: node.label.clone(),
                appearance_uri: node.appearance_uri.clone(),
                children: state.children_of(node.handle).unwrap_or_default(),
            })
            .collect();
        nodes.sort_by_key(|node| node.handle);

        SceneSnapshot {
            roots: state.roots.clone(),
            nodes,
        }
    }

    /// Indented, human-readable rendering of the scene.
    pub fn outline(&self) -> String {
        self.snapshot().outline()
    }
}

#[async_trait]
impl SceneSink for MemorySink {
    async fn create_node(&self, request: CreateNode) -> SinkResult<SceneNodeHandle> {
        let mut state = self.lock()?;

        let parent_idx = match request.parent {
            Some(parent) => match state.index.get(&parent) {
                Some(idx) => Some(*idx),
                None => {
                    state.journal.push(SinkCall::Create {
                        source_uri: request.source_uri,
                        parent: request.parent,
                        handle: None,
                    });
                    return Err(SinkError::UnknownHandle(parent));
                }
            },
            None => None,
        };

        if self.rejected_uris.contains(&request.source_uri) {
            let message = format!("cannot instantiate `{}`", request.source_uri);
            state.journal.push(SinkCall::Create {
                source_uri: request.source_uri,
                parent: request.parent,
                handle: None,
            });
            return Err(SinkError::Rejected { message });
        }

        state.next_handle += 1;
        let handle = SceneNodeHandle(state.next_handle);
        let idx = state.graph.add_node(SceneNode {
            handle,
            parent: request.parent,
            source_uri: request.source_uri.clone(),
            enabled: request.enabled,
            transform: None,
            label: None,
            appearance_uri: None,
        });
        state.index.insert(handle, idx);
        match parent_idx {
            Some(parent_idx) => {
                state.graph.add_edge(parent_idx, idx, ());
            }
            None => state.roots.push(handle),
        }

        trace!(handle = %handle, uri = %request.source_uri, "node_created");
        state.journal.push(SinkCall::Create {
            source_uri: request.source_uri,
            parent: request.parent,
            handle: Some(handle),
        });
        Ok(handle)
    }

    async fn set_property(
        &self,
        handle: SceneNodeHandle,
        property: NodeProperty,
    ) -> SinkResult<()> {
        let mut state = self.lock()?;
        let key = property.key();
        state.journal.push(SinkCall::SetProperty { handle, key });

        let source_uri = state.node(handle)?.source_uri.clone();
        if self.rejected_properties.contains(&(source_uri, key)) {
            return Err(SinkError::TypeMismatch {
                key,
                message: "property refused by sink".to_string(),
            });
        }

        let node = state.node_mut(handle)?;
        match property {
            NodeProperty::LocalTransform(transform) => {
                if !transform.is_matrix4() {
                    return Err(SinkError::TypeMismatch {
                        key,
                        message: format!(
                            "expected 16 finite values, got {}",
                            transform.values().len()
                        ),
                    });
                }
                node.transform = Some(transform);
            }
            NodeProperty::Label(label) => node.label = Some(label),
            NodeProperty::AppearanceUri(uri) => node.appearance_uri = Some(uri),
            NodeProperty::Enabled(enabled) => node.enabled = enabled,
            NodeProperty::GlobalCenter(_) => {
                return Err(SinkError::TypeMismatch {
                    key,
                    message: "read-only property".to_string(),
                });
            }
        }
        trace!(handle = %handle, key = %key, "property_set");
        Ok(())
    }

    async fn get_property(
        &self,
        handle: SceneNodeHandle,
        key: PropertyKey,
    ) -> SinkResult<Option<NodeProperty>> {
        let mut state = self.lock()?;
        state.journal.push(SinkCall::GetProperty { handle, key });

        let node = state.node(handle)?;
        Ok(match key {
            PropertyKey::LocalTransform => node.transform.clone().map(NodeProperty::LocalTransform),
            PropertyKey::Label => node.label.clone().map(NodeProperty::Label),
            PropertyKey::AppearanceUri => {
                node.appearance_uri.clone().map(NodeProperty::AppearanceUri)
            }
            PropertyKey::Enabled => Some(NodeProperty::Enabled(node.enabled)),
            PropertyKey::GlobalCenter => Some(NodeProperty::GlobalCenter(
                state.global_center(handle)?,
            )),
        })
    }

    async fn children(&self, handle: SceneNodeHandle) -> SinkResult<Vec<SceneNodeHandle>> {
        let mut state = self.lock()?;
        state.journal.push(SinkCall::Children { handle });
        state.children_of(handle)
    }
}

/// Serializable copy of a [`MemorySink`] scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSnapshot {
    pub roots: Vec<SceneNodeHandle>,
    pub nodes: Vec<SnapshotNode>,
}

/// One node in a [`SceneSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotNode {
    pub handle: SceneNodeHandle,
    pub parent: Option<SceneNodeHandle>,
    pub source_uri: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appearance_uri: Option<String>,
    pub children: Vec<SceneNodeHandle>,
}

impl SceneSnapshot {
    pub fn node(&self, handle: SceneNodeHandle) -> Option<&SnapshotNode> {
        self.nodes.iter().find(|node| node.handle == handle)
    }

    pub fn find_by_label(&self, label: &str) -> Option<&SnapshotNode> {
        self.nodes
            .iter()
            .find(|node| node.label.as_deref() == Some(label))
    }

    /// One line per node, depth-first, indented two spaces per level.
    pub fn outline(&self) -> String {
        let by_handle: HashMap<SceneNodeHandle, &SnapshotNode> =
            self.nodes.iter().map(|node| (node.handle, node)).collect();

        let mut out = String::new();
        let mut pending: Vec<(SceneNodeHandle, usize)> =
            self.roots.iter().rev().map(|root| (*root, 0)).collect();

        while let Some((handle, depth)) = pending.pop() {
            let Some(node) = by_handle.get(&handle) else {
                continue;
            };
            write_outline_line(&mut out, node, depth);
            pending.extend(node.children.iter().rev().map(|child| (*child, depth + 1)));
        }
        out
    }
}

fn write_outline_line(out: &mut String, node: &SnapshotNode, depth: usize) {
    let label = node.label.as_deref().unwrap_or("-");
    let source = if node.source_uri.is_empty() {
        "(structural)"
    } else {
        node.source_uri.as_str()
    };
    let _ = write!(out, "{:indent$}{} {} {}", "", node.handle, label, source, indent = depth * 2);
    if let Some(appearance) = &node.appearance_uri {
        let _ = write!(out, " appearance={}", appearance);
    }
    if !node.enabled {
        out.push_str(" [disabled]");
    }
    out.push('\n');
}
