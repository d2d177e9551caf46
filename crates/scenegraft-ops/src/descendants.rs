//! Descendant traversal over a live scene.

use scenegraft_core::{NodeProperty, PropertyKey, SceneNodeHandle, SceneSink};
use tracing::{debug, warn};

/// Which descendants [`collect_descendants`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DescendantFilter {
    #[default]
    All,
    /// Only nodes whose `enabled` property is true. Disabled nodes are
    /// still traversed.
    EnabledOnly,
}

/// All descendants of `handle`, depth-first in pre-order.
///
/// A node whose children cannot be read is treated as a leaf. With
/// [`DescendantFilter::EnabledOnly`], a node whose `enabled` property cannot
/// be read is skipped together with its subtree.
pub async fn collect_descendants<S: SceneSink + ?Sized>(
    sink: &S,
    handle: SceneNodeHandle,
    filter: DescendantFilter,
) -> Vec<SceneNodeHandle> {
    let mut descendants = Vec::new();
    let mut pending: Vec<SceneNodeHandle> = children_or_leaf(sink, handle).await;
    pending.reverse();

    while let Some(node) = pending.pop() {
        match filter {
            DescendantFilter::All => descendants.push(node),
            DescendantFilter::EnabledOnly => {
                match sink.get_property(node, PropertyKey::Enabled).await {
                    Ok(Some(NodeProperty::Enabled(true))) => descendants.push(node),
                    Ok(_) => {}
                    Err(err) => {
                        warn!(handle = %node, error = %err, "descendant_skipped");
                        continue;
                    }
                }
            }
        }

        let children = children_or_leaf(sink, node).await;
        pending.extend(children.into_iter().rev());
    }

    descendants
}

async fn children_or_leaf<S: SceneSink + ?Sized>(
    sink: &S,
    handle: SceneNodeHandle,
) -> Vec<SceneNodeHandle> {
    match sink.children(handle).await {
        Ok(children) => children,
        Err(err) => {
            debug!(handle = %handle, error = %err, "children_unreadable");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenegraft_core::{CreateNode, MemorySink};

    #[tokio::test]
    async fn unknown_handle_has_no_descendants() {
        let sink = MemorySink::new();
        let found = collect_descendants(&sink, SceneNodeHandle(9), DescendantFilter::All).await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn returns_pre_order() {
        let sink = MemorySink::new();
        let root = sink.create_node(CreateNode::new("", None)).await.unwrap();
        let a = sink.create_node(CreateNode::new("a", Some(root))).await.unwrap();
        let b = sink.create_node(CreateNode::new("b", Some(root))).await.unwrap();
        let a1 = sink.create_node(CreateNode::new("a1", Some(a))).await.unwrap();

        let found = collect_descendants(&sink, root, DescendantFilter::All).await;
        assert_eq!(found, vec![a, a1, b]);
    }
}
