//! scenegraft Operations Layer
//!
//! Materializes tree descriptions into a scene sink and exposes the
//! surrounding operations (loading, validation, descendant traversal,
//! exploded views) as a typed API shared by the CLI and any other front
//! end.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use scenegraft_core::{MemorySink, TreeDescription};
//! use scenegraft_ops::NodeBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let description = TreeDescription::from_json(&std::fs::read_to_string("struct.json")?)?;
//!     let sink = MemorySink::new();
//!
//!     let root = NodeBuilder::new(&sink).build(&description).await?;
//!     println!("built {} nodes under {}", sink.node_count(), root);
//!     Ok(())
//! }
//! ```

mod builder;
mod config;
mod context;
mod descendants;
mod error;
mod explode;
mod load;
mod report;
mod requests;
mod responses;

// Re-export public API
pub use builder::{node_properties, BuildOptions, NodeBuilder};
pub use config::{Config, CONFIG_KEYS};
pub use context::OpsContext;
pub use descendants::{collect_descendants, DescendantFilter};
pub use error::{BuildError, BuildResult, BuildStage, NodeConstructionFailed, OpsError, OpsResult};
pub use explode::{Explosion, ExplosionReport, ResetReport, SkipReason, SkippedPart};
pub use load::{load_description, parse_description};
pub use report::{BuildReport, BuildSummary, FailureSummary};
pub use requests::*;
pub use responses::*;
