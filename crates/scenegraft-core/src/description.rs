//! Tree descriptions: the flat, id-indexed input consumed by the builder.
//!
//! A description document looks like:
//!
//! ```json
//! {
//!   "root": "1",
//!   "nodes": {
//!     "1": { "url": "", "label": "Assembly", "children": [2, 3] },
//!     "2": { "url": "urn:x-model:wheel", "localTransform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 2,0,0,1] },
//!     "3": { "url": "urn:x-model:axle", "appearanceURI": "urn:x-material:steel" }
//!   }
//! }
//! ```

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashSet, VecDeque};

use serde::{Deserialize, Deserializer, Serialize};

use crate::property::Transform;

/// Description-local node identifier.
///
/// Only meaningful inside one description; never handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeKey(pub String);

impl NodeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for NodeKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<u64> for NodeKey {
    fn from(key: u64) -> Self {
        Self(key.to_string())
    }
}

// Documents reference children by number (`"children": [2, 3]`) while map
// keys are always strings, so both spellings resolve to the same key.
impl<'de> Deserialize<'de> for NodeKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawKey {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match RawKey::deserialize(deserializer)? {
            RawKey::Text(text) => NodeKey(text),
            RawKey::Unsigned(n) => NodeKey(n.to_string()),
            RawKey::Signed(n) => NodeKey(n.to_string()),
        })
    }
}

/// One prospective scene node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Locator of the content to instantiate; empty for structural nodes.
    #[serde(rename = "url", alias = "sourceURI", default)]
    pub source_uri: String,

    /// Local transform applied after creation.
    #[serde(
        rename = "localTransform",
        alias = "transform",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub transform: Option<Transform>,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Locator of the visual appearance / material.
    #[serde(
        rename = "appearanceURI",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub appearance_uri: Option<String>,

    /// Child ids, in creation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeKey>,
}

impl NodeDescriptor {
    pub fn new(source_uri: impl Into<String>) -> Self {
        Self {
            source_uri: source_uri.into(),
            ..Self::default()
        }
    }

    pub fn with_transform(mut self, transform: impl Into<Transform>) -> Self {
        self.transform = Some(transform.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_appearance(mut self, appearance_uri: impl Into<String>) -> Self {
        self.appearance_uri = Some(appearance_uri.into());
        self
    }

    pub fn with_children<K: Into<NodeKey>>(mut self, children: impl IntoIterator<Item = K>) -> Self {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// The full input document: descriptors keyed by id plus an entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeDescription {
    pub root: NodeKey,
    pub nodes: BTreeMap<NodeKey, NodeDescriptor>,
}

impl TreeDescription {
    pub fn new(root: impl Into<NodeKey>) -> Self {
        Self {
            root: root.into(),
            nodes: BTreeMap::new(),
        }
    }

    pub fn with_node(mut self, key: impl Into<NodeKey>, descriptor: NodeDescriptor) -> Self {
        self.nodes.insert(key.into(), descriptor);
        self
    }

    /// Parse a description document.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn descriptor(&self, key: &NodeKey) -> Option<&NodeDescriptor> {
        self.nodes.get(key)
    }

    pub fn root_descriptor(&self) -> Option<&NodeDescriptor> {
        self.nodes.get(&self.root)
    }

    /// Find a cycle reachable from the root.
    ///
    /// Returns the path from the root down to the repeated id, with the
    /// repeated id as the last element. Dangling references are ignored.
    pub fn find_cycle(&self) -> Option<Vec<NodeKey>> {
        let (root, _) = self.nodes.get_key_value(&self.root)?;

        let mut on_path: HashSet<&NodeKey> = HashSet::from([root]);
        let mut finished: HashSet<&NodeKey> = HashSet::new();
        let mut stack: Vec<(&NodeKey, usize)> = vec![(root, 0)];

        while let Some(frame) = stack.last_mut() {
            let key = frame.0;
            let index = frame.1;
            frame.1 += 1;

            match self.nodes[key].children.get(index) {
                Some(child) => {
                    let Some((child, _)) = self.nodes.get_key_value(child) else {
                        continue;
                    };
                    if on_path.contains(child) {
                        let mut path: Vec<NodeKey> =
                            stack.iter().map(|(k, _)| (*k).clone()).collect();
                        path.push(child.clone());
                        return Some(path);
                    }
                    if finished.contains(child) {
                        continue;
                    }
                    on_path.insert(child);
                    stack.push((child, 0));
                }
                None => {
                    on_path.remove(key);
                    finished.insert(key);
                    stack.pop();
                }
            }
        }

        None
    }

    /// Distinct ids reachable from the root through existing child references.
    pub fn reachable(&self) -> HashSet<&NodeKey> {
        let mut seen = HashSet::new();
        let Some((root, _)) = self.nodes.get_key_value(&self.root) else {
            return seen;
        };

        let mut queue = VecDeque::from([root]);
        seen.insert(root);
        while let Some(key) = queue.pop_front() {
            for child in &self.nodes[key].children {
                if let Some((child, _)) = self.nodes.get_key_value(child) {
                    if seen.insert(child) {
                        queue.push_back(child);
                    }
                }
            }
        }
        seen
    }

    /// Structural report over the whole description.
    pub fn analyze(&self) -> DescriptionSummary {
        let reachable = self.reachable();

        let nodes = &self.nodes;
        let dangling = nodes
            .iter()
            .flat_map(|(parent, descriptor)| {
                descriptor
                    .children
                    .iter()
                    .filter(move |child| !nodes.contains_key(*child))
                    .map(move |child| (parent.clone(), child.clone()))
            })
            .collect();

        let unreachable = self
            .nodes
            .keys()
            .filter(|key| !reachable.contains(key))
            .cloned()
            .collect();

        DescriptionSummary {
            root: self.root.clone(),
            root_present: self.nodes.contains_key(&self.root),
            node_count: self.nodes.len(),
            reachable_count: reachable.len(),
            dangling,
            unreachable,
            cycle: self.find_cycle(),
        }
    }
}

/// Result of [`TreeDescription::analyze`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptionSummary {
    pub root: NodeKey,
    pub root_present: bool,
    pub node_count: usize,
    pub reachable_count: usize,
    /// `(parent, missing child)` pairs.
    pub dangling: Vec<(NodeKey, NodeKey)>,
    pub unreachable: Vec<NodeKey>,
    pub cycle: Option<Vec<NodeKey>>,
}

impl DescriptionSummary {
    /// Whether a build of this description can start.
    pub fn is_buildable(&self) -> bool {
        self.root_present && self.cycle.is_none()
    }
}
