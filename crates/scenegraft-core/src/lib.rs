//! Core domain types shared across the scenegraft workspace.
//!
//! - [`TreeDescription`] / [`NodeDescriptor`]: the flat, id-indexed input
//!   document describing a prospective scene tree.
//! - [`NodeProperty`] / [`PropertyKey`]: the closed set of typed properties
//!   a scene node accepts.
//! - [`SceneSink`]: the capability the builder writes into.
//! - [`MemorySink`]: an in-process sink backed by a petgraph scene graph.

mod description;
mod memory;
mod property;
mod sink;

pub use description::{DescriptionSummary, NodeDescriptor, NodeKey, TreeDescription};
pub use memory::{MemorySink, SceneSnapshot, SinkCall, SnapshotNode};
pub use property::{NodeProperty, PropertyKey, Transform};
pub use sink::{CreateNode, SceneNodeHandle, SceneSink, SinkError, SinkResult};
