//! Hierarchical node builder.
//!
//! Walks a [`TreeDescription`] from its root and materializes it into a
//! [`SceneSink`]. Each node is created, then its properties are assigned
//! (transform, label, appearance), and only then are its children built.
//! Sibling subtrees are independent and run concurrently on the caller's
//! task; a failed node abandons its own subtree without affecting siblings.
//!
//! Nodes are driven from one flat set of in-flight constructions rather
//! than nested futures, so description depth is bounded by memory only.
//!
//! The builder offers no cancellation. Dropping the build future stops new
//! sink calls from being issued, but calls already in flight are up to the
//! sink.

use std::collections::VecDeque;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use scenegraft_core::{
    CreateNode, NodeDescriptor, NodeKey, NodeProperty, SceneNodeHandle, SceneSink,
    TreeDescription,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{BuildError, BuildResult, BuildStage, NodeConstructionFailed};
use crate::report::BuildReport;

/// Tuning knobs for a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Maximum sibling subtrees in flight per parent. `0` means unbounded,
    /// `1` builds siblings one after another in array order.
    pub sibling_concurrency: usize,
    /// Initial enabled state of created nodes.
    pub enable_nodes: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            sibling_concurrency: 0,
            enable_nodes: true,
        }
    }
}

impl From<&Config> for BuildOptions {
    fn from(config: &Config) -> Self {
        Self {
            sibling_concurrency: config.sibling_concurrency,
            enable_nodes: config.enable_nodes,
        }
    }
}

/// Property assignments for a descriptor, in application order.
///
/// Empty labels and appearance locators count as absent.
pub fn node_properties(descriptor: &NodeDescriptor) -> Vec<NodeProperty> {
    let mut properties = Vec::with_capacity(3);
    if let Some(transform) = &descriptor.transform {
        properties.push(NodeProperty::LocalTransform(transform.clone()));
    }
    if let Some(label) = descriptor.label.as_ref().filter(|label| !label.is_empty()) {
        properties.push(NodeProperty::Label(label.clone()));
    }
    if let Some(appearance) = descriptor
        .appearance_uri
        .as_ref()
        .filter(|uri| !uri.is_empty())
    {
        properties.push(NodeProperty::AppearanceUri(appearance.clone()));
    }
    properties
}

/// A descriptor waiting to be constructed.
struct Job<'a> {
    /// Frame of the parent node, `None` for the description root.
    frame: Option<usize>,
    parent: Option<SceneNodeHandle>,
    key: &'a NodeKey,
    descriptor: &'a NodeDescriptor,
}

/// A node whose construction did not complete.
struct Abandoned {
    handle: Option<SceneNodeHandle>,
    failure: NodeConstructionFailed,
}

struct Constructed<'a> {
    job: Job<'a>,
    result: Result<SceneNodeHandle, Abandoned>,
}

/// A constructed node with children still to build.
struct Frame<'a> {
    parent: Option<usize>,
    handle: SceneNodeHandle,
    queued: VecDeque<(&'a NodeKey, &'a NodeDescriptor)>,
    /// Child subtrees started and not yet finished.
    running: usize,
}

/// Per-parent bookkeeping of which children may start.
struct Schedule<'a> {
    limit: usize,
    frames: Vec<Frame<'a>>,
    ready: Vec<Job<'a>>,
}

impl<'a> Schedule<'a> {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            frames: Vec::new(),
            ready: Vec::new(),
        }
    }

    /// Register a constructed node and release its first children.
    fn open(
        &mut self,
        parent: Option<usize>,
        handle: SceneNodeHandle,
        queued: VecDeque<(&'a NodeKey, &'a NodeDescriptor)>,
    ) {
        let idx = self.frames.len();
        self.frames.push(Frame {
            parent,
            handle,
            queued,
            running: 0,
        });
        self.fill(idx);
        if self.frames[idx].running == 0 {
            self.finish(parent);
        }
    }

    /// Start queued children of a frame up to the sibling limit.
    fn fill(&mut self, idx: usize) {
        let limit = self.limit;
        let frame = &mut self.frames[idx];
        while limit == 0 || frame.running < limit {
            let Some((key, descriptor)) = frame.queued.pop_front() else {
                break;
            };
            frame.running += 1;
            self.ready.push(Job {
                frame: Some(idx),
                parent: Some(frame.handle),
                key,
                descriptor,
            });
        }
    }

    /// A child subtree of `frame` finished. Walks up through every ancestor
    /// whose children are now all done.
    fn finish(&mut self, mut frame: Option<usize>) {
        while let Some(idx) = frame {
            self.frames[idx].running -= 1;
            self.fill(idx);
            if self.frames[idx].running > 0 {
                return;
            }
            frame = self.frames[idx].parent;
        }
    }
}

/// Totals accumulated as nodes complete.
#[derive(Debug, Default)]
struct Tally {
    root: Option<SceneNodeHandle>,
    created: usize,
    skipped_dangling: Vec<(NodeKey, NodeKey)>,
    failures: Vec<NodeConstructionFailed>,
}

/// Builds scene trees into a borrowed sink.
#[derive(Debug)]
pub struct NodeBuilder<'s, S: SceneSink + ?Sized> {
    sink: &'s S,
    options: BuildOptions,
}

impl<'s, S: SceneSink + ?Sized> NodeBuilder<'s, S> {
    pub fn new(sink: &'s S) -> Self {
        Self {
            sink,
            options: BuildOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build the description as a new scene root.
    ///
    /// Returns the root handle, or [`BuildError::Incomplete`] listing every
    /// failed subtree when the scene was only partially built.
    pub async fn build(&self, description: &TreeDescription) -> BuildResult<SceneNodeHandle> {
        self.build_report(description).await?.into_result()
    }

    /// Build the description as a new scene root, keeping partial outcomes.
    pub async fn build_report(&self, description: &TreeDescription) -> BuildResult<BuildReport> {
        self.build_at(description, None).await
    }

    /// Build the description beneath `parent` (or as a scene root).
    ///
    /// Fails with [`BuildError::InvalidStructure`] or
    /// [`BuildError::CyclicStructure`] before any sink call. Otherwise always
    /// returns a report; subtree failures are listed in it.
    pub async fn build_at(
        &self,
        description: &TreeDescription,
        parent: Option<SceneNodeHandle>,
    ) -> BuildResult<BuildReport> {
        let Some((root_key, root)) = description.nodes.get_key_value(&description.root) else {
            return Err(BuildError::InvalidStructure {
                root: description.root.clone(),
            });
        };

        if let Some(path) = description.find_cycle() {
            let id = path.last().cloned().unwrap_or_else(|| root_key.clone());
            return Err(BuildError::CyclicStructure { id, path });
        }

        let started = Instant::now();
        info!(
            root = %root_key,
            nodes = description.nodes.len(),
            concurrency = self.options.sibling_concurrency,
            "build_start"
        );

        let tally = self
            .run(
                description,
                Job {
                    frame: None,
                    parent,
                    key: root_key,
                    descriptor: root,
                },
            )
            .await;

        let report = BuildReport {
            root: tally.root,
            created: tally.created,
            skipped_dangling: tally.skipped_dangling,
            failures: tally.failures,
            duration: started.elapsed(),
        };

        info!(
            created = report.created,
            failures = report.failures.len(),
            dangling = report.skipped_dangling.len(),
            duration_ms = report.duration.as_millis() as u64,
            "build_complete"
        );

        Ok(report)
    }

    async fn run<'a>(&self, description: &'a TreeDescription, root: Job<'a>) -> Tally {
        let mut tally = Tally::default();
        let mut schedule = Schedule::new(self.options.sibling_concurrency);
        let mut in_flight = FuturesUnordered::new();
        in_flight.push(self.construct(root));

        while let Some(Constructed { job, result }) = in_flight.next().await {
            match result {
                Ok(handle) => {
                    tally.created += 1;
                    if job.frame.is_none() {
                        tally.root = Some(handle);
                    }

                    let mut queued = VecDeque::with_capacity(job.descriptor.children.len());
                    for child in &job.descriptor.children {
                        match description.nodes.get_key_value(child) {
                            Some(entry) => queued.push_back(entry),
                            None => {
                                debug!(parent = %job.key, child = %child, "dangling_child_skipped");
                                tally.skipped_dangling.push((job.key.clone(), child.clone()));
                            }
                        }
                    }
                    schedule.open(job.frame, handle, queued);
                }
                Err(Abandoned { handle, failure }) => {
                    if let Some(handle) = handle {
                        tally.created += 1;
                        if job.frame.is_none() {
                            tally.root = Some(handle);
                        }
                    }
                    tally.failures.push(failure);
                    schedule.finish(job.frame);
                }
            }

            for job in schedule.ready.drain(..) {
                in_flight.push(self.construct(job));
            }
        }

        tally
    }

    /// Create one node and assign its properties.
    async fn construct<'a>(&self, job: Job<'a>) -> Constructed<'a> {
        let result = self.create_with_properties(job.key, job.descriptor, job.parent).await;
        Constructed { job, result }
    }

    async fn create_with_properties(
        &self,
        key: &NodeKey,
        descriptor: &NodeDescriptor,
        parent: Option<SceneNodeHandle>,
    ) -> Result<SceneNodeHandle, Abandoned> {
        let request = CreateNode::new(descriptor.source_uri.clone(), parent)
            .with_enabled(self.options.enable_nodes);

        let handle = match self.sink.create_node(request).await {
            Ok(handle) => handle,
            Err(cause) => {
                warn!(id = %key, error = %cause, "node_create_failed");
                return Err(Abandoned {
                    handle: None,
                    failure: NodeConstructionFailed {
                        id: key.clone(),
                        stage: BuildStage::Create,
                        cause,
                    },
                });
            }
        };
        debug!(id = %key, handle = %handle, "node_created");

        for property in node_properties(descriptor) {
            let property_key = property.key();
            if let Err(cause) = self.sink.set_property(handle, property).await {
                warn!(id = %key, handle = %handle, key = %property_key, error = %cause, "node_property_failed");
                return Err(Abandoned {
                    handle: Some(handle),
                    failure: NodeConstructionFailed {
                        id: key.clone(),
                        stage: BuildStage::Property(property_key),
                        cause,
                    },
                });
            }
        }

        Ok(handle)
    }
}
