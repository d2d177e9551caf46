//! Exploded views of a built scene.
//!
//! Every enabled descendant of a root is pushed away from the root's center
//! along the line through its own center, scaled by a factor. Parts whose
//! transform or center cannot be used are skipped and reported; the rest of
//! the explosion continues.

use std::collections::BTreeMap;

use scenegraft_core::{
    NodeProperty, PropertyKey, SceneNodeHandle, SceneSink, SinkError, SinkResult, Transform,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::descendants::{collect_descendants, DescendantFilter};

/// Why a part was left where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    TransformUnreadable,
    NotAMatrix,
    CenterUnavailable,
    NonFiniteCenter,
    NonFiniteVector,
    WriteFailed,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SkipReason::TransformUnreadable => "local transform could not be read",
            SkipReason::NotAMatrix => "local transform is not a 4x4 matrix",
            SkipReason::CenterUnavailable => "center could not be read",
            SkipReason::NonFiniteCenter => "center is not finite",
            SkipReason::NonFiniteVector => "explosion vector is not finite",
            SkipReason::WriteFailed => "local transform could not be written",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedPart {
    pub handle: SceneNodeHandle,
    pub reason: SkipReason,
}

/// Outcome of [`Explosion::explode`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExplosionReport {
    pub factor: f64,
    /// Parts whose transform was written, in traversal order.
    pub moved: Vec<SceneNodeHandle>,
    pub skipped: Vec<SkippedPart>,
}

/// Outcome of [`Explosion::reset`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResetReport {
    pub restored: usize,
    /// Parts still displaced; a later reset retries them.
    pub failed: Vec<SceneNodeHandle>,
}

/// Explodes the enabled descendants of one root, remembering the transforms
/// it displaced so they can be restored.
#[derive(Debug)]
pub struct Explosion<'s, S: SceneSink + ?Sized> {
    sink: &'s S,
    root: SceneNodeHandle,
    originals: BTreeMap<SceneNodeHandle, Transform>,
}

impl<'s, S: SceneSink + ?Sized> Explosion<'s, S> {
    pub fn new(sink: &'s S, root: SceneNodeHandle) -> Self {
        Self {
            sink,
            root,
            originals: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> SceneNodeHandle {
        self.root
    }

    /// Reset any previous explosion, then move every enabled descendant by
    /// `factor × (part center − root center + part translation)`.
    ///
    /// A non-positive factor writes the transforms back unchanged. Fails only
    /// when the root's own center cannot be read.
    pub async fn explode(&mut self, factor: f64) -> SinkResult<ExplosionReport> {
        info!(root = %self.root, factor, "explosion_start");
        self.reset().await;

        let mut report = ExplosionReport {
            factor,
            ..ExplosionReport::default()
        };

        let parts = collect_descendants(self.sink, self.root, DescendantFilter::EnabledOnly).await;
        if parts.is_empty() {
            warn!(root = %self.root, "explosion_without_parts");
            return Ok(report);
        }

        let center = match read_center(self.sink, self.root).await? {
            Some(center) if is_finite(&center) => center,
            _ => {
                return Err(SinkError::TypeMismatch {
                    key: PropertyKey::GlobalCenter,
                    message: format!("root {} has no finite center", self.root),
                })
            }
        };

        for part in parts {
            match self.explode_part(part, center, factor).await {
                Ok(()) => report.moved.push(part),
                Err(reason) => {
                    warn!(handle = %part, %reason, "explosion_part_skipped");
                    report.skipped.push(SkippedPart {
                        handle: part,
                        reason,
                    });
                }
            }
        }

        info!(
            moved = report.moved.len(),
            skipped = report.skipped.len(),
            "explosion_complete"
        );
        Ok(report)
    }

    async fn explode_part(
        &mut self,
        part: SceneNodeHandle,
        center: [f64; 3],
        factor: f64,
    ) -> Result<(), SkipReason> {
        let mut transform = match self.sink.get_property(part, PropertyKey::LocalTransform).await {
            Ok(Some(NodeProperty::LocalTransform(transform))) => transform,
            Ok(None) => Transform::identity(),
            Ok(Some(other)) => {
                debug!(handle = %part, key = %other.key(), "unexpected_property");
                return Err(SkipReason::TransformUnreadable);
            }
            Err(err) => {
                debug!(handle = %part, error = %err, "transform_unreadable");
                return Err(SkipReason::TransformUnreadable);
            }
        };
        let translation = transform.translation_part().ok_or(SkipReason::NotAMatrix)?;

        let part_center = match read_center(self.sink, part).await {
            Ok(Some(center)) => center,
            Ok(None) => return Err(SkipReason::CenterUnavailable),
            Err(err) => {
                debug!(handle = %part, error = %err, "center_unavailable");
                return Err(SkipReason::CenterUnavailable);
            }
        };
        if !is_finite(&part_center) {
            return Err(SkipReason::NonFiniteCenter);
        }

        let vector: [f64; 3] =
            std::array::from_fn(|i| part_center[i] - center[i] + translation[i]);
        if !is_finite(&vector) {
            return Err(SkipReason::NonFiniteVector);
        }

        self.originals
            .entry(part)
            .or_insert_with(|| transform.clone());
        if factor > 0.0 {
            for (i, offset) in vector.iter().enumerate() {
                transform.0[12 + i] += offset * factor;
            }
        }

        self.sink
            .set_property(part, NodeProperty::LocalTransform(transform))
            .await
            .map_err(|err| {
                debug!(handle = %part, error = %err, "transform_write_failed");
                SkipReason::WriteFailed
            })
    }

    /// Restore every transform this explosion displaced.
    pub async fn reset(&mut self) -> ResetReport {
        let mut report = ResetReport::default();

        for (handle, original) in std::mem::take(&mut self.originals) {
            let restore = NodeProperty::LocalTransform(original.clone());
            match self.sink.set_property(handle, restore).await {
                Ok(()) => report.restored += 1,
                Err(err) => {
                    warn!(handle = %handle, error = %err, "explosion_reset_failed");
                    report.failed.push(handle);
                    self.originals.insert(handle, original);
                }
            }
        }

        if report.restored > 0 || !report.failed.is_empty() {
            info!(restored = report.restored, failed = report.failed.len(), "explosion_reset");
        }
        report
    }
}

async fn read_center<S: SceneSink + ?Sized>(
    sink: &S,
    handle: SceneNodeHandle,
) -> SinkResult<Option<[f64; 3]>> {
    Ok(match sink.get_property(handle, PropertyKey::GlobalCenter).await? {
        Some(NodeProperty::GlobalCenter(center)) => Some(center),
        _ => None,
    })
}

fn is_finite(vector: &[f64; 3]) -> bool {
    vector.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenegraft_core::{CreateNode, MemorySink};

    struct Parts {
        root: SceneNodeHandle,
        arm: SceneNodeHandle,
        hand: SceneNodeHandle,
        base: SceneNodeHandle,
    }

    /// root ── arm (x = 2) ── hand
    ///      └─ base
    async fn parts(sink: &MemorySink) -> Parts {
        let root = sink.create_node(CreateNode::new("", None)).await.unwrap();
        let arm = sink
            .create_node(CreateNode::new("urn:arm", Some(root)))
            .await
            .unwrap();
        sink.set_property(arm, NodeProperty::LocalTransform(Transform::translation(2.0, 0.0, 0.0)))
            .await
            .unwrap();
        let hand = sink
            .create_node(CreateNode::new("urn:hand", Some(arm)))
            .await
            .unwrap();
        let base = sink
            .create_node(CreateNode::new("urn:base", Some(root)))
            .await
            .unwrap();
        Parts {
            root,
            arm,
            hand,
            base,
        }
    }

    async fn translation(sink: &MemorySink, handle: SceneNodeHandle) -> Option<[f64; 3]> {
        match sink.get_property(handle, PropertyKey::LocalTransform).await.unwrap() {
            Some(NodeProperty::LocalTransform(t)) => t.translation_part(),
            _ => None,
        }
    }

    #[tokio::test]
    async fn parts_move_away_from_root_center() {
        let sink = MemorySink::new();
        let p = parts(&sink).await;

        let report = Explosion::new(&sink, p.root).explode(1.0).await.unwrap();

        assert_eq!(report.moved, vec![p.arm, p.hand, p.base]);
        assert!(report.skipped.is_empty());
        // arm: 2 + (2 - 0 + 2)
        assert_eq!(translation(&sink, p.arm).await, Some([6.0, 0.0, 0.0]));
        // hand sits at the arm's displaced origin
        assert_eq!(translation(&sink, p.hand).await, Some([6.0, 0.0, 0.0]));
        assert_eq!(translation(&sink, p.base).await, Some([0.0, 0.0, 0.0]));
    }

    #[tokio::test]
    async fn exploding_again_starts_from_original_transforms() {
        let sink = MemorySink::new();
        let p = parts(&sink).await;
        let mut explosion = Explosion::new(&sink, p.root);

        explosion.explode(1.0).await.unwrap();
        explosion.explode(1.0).await.unwrap();

        assert_eq!(translation(&sink, p.arm).await, Some([6.0, 0.0, 0.0]));
        assert_eq!(translation(&sink, p.hand).await, Some([6.0, 0.0, 0.0]));
    }

    #[tokio::test]
    async fn reset_restores_displaced_transforms() {
        let sink = MemorySink::new();
        let p = parts(&sink).await;
        let mut explosion = Explosion::new(&sink, p.root);
        explosion.explode(0.5).await.unwrap();

        let reset = explosion.reset().await;

        assert_eq!(reset.restored, 3);
        assert!(reset.failed.is_empty());
        assert_eq!(translation(&sink, p.arm).await, Some([2.0, 0.0, 0.0]));
        assert_eq!(translation(&sink, p.hand).await, Some([0.0, 0.0, 0.0]));
        assert_eq!(explosion.reset().await, ResetReport::default());
    }

    #[tokio::test]
    async fn zero_factor_keeps_positions() {
        let sink = MemorySink::new();
        let p = parts(&sink).await;

        let report = Explosion::new(&sink, p.root).explode(0.0).await.unwrap();

        assert_eq!(report.moved.len(), 3);
        assert_eq!(translation(&sink, p.arm).await, Some([2.0, 0.0, 0.0]));
    }

    #[tokio::test]
    async fn disabled_parts_stay_put() {
        let sink = MemorySink::new();
        let p = parts(&sink).await;
        sink.set_property(p.arm, NodeProperty::Enabled(false))
            .await
            .unwrap();

        let report = Explosion::new(&sink, p.root).explode(1.0).await.unwrap();

        assert_eq!(report.moved, vec![p.hand, p.base]);
        assert_eq!(translation(&sink, p.arm).await, Some([2.0, 0.0, 0.0]));
    }

    #[tokio::test]
    async fn leaf_root_has_nothing_to_explode() {
        let sink = MemorySink::new();
        let root = sink.create_node(CreateNode::new("urn:a", None)).await.unwrap();

        let report = Explosion::new(&sink, root).explode(2.0).await.unwrap();

        assert_eq!(report.factor, 2.0);
        assert!(report.moved.is_empty());
        assert!(sink.journal().iter().all(|call| !matches!(
            call,
            scenegraft_core::SinkCall::SetProperty { .. }
        )));
    }

    #[test]
    fn skip_reasons_render_plainly() {
        assert_eq!(
            SkipReason::NonFiniteCenter.to_string(),
            "center is not finite"
        );
        assert_eq!(
            serde_json::to_value(SkipReason::NotAMatrix).unwrap(),
            "not_a_matrix"
        );
    }
}
