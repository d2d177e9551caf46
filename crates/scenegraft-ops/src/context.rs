//! OpsContext - The main service for executing operations.
//!
//! The context holds configuration only. Sinks are passed into each call by
//! whoever owns them, so one context can serve any number of scenes.

use scenegraft_core::SceneSink;
use tracing::info;

use crate::builder::{BuildOptions, NodeBuilder};
use crate::config::Config;
use crate::error::OpsResult;
use crate::load::load_description;
use crate::requests::{BuildRequest, ValidateRequest};
use crate::responses::{BuildResponse, ValidateResponse};

/// The main operations context.
#[derive(Debug, Clone, Default)]
pub struct OpsContext {
    /// Configuration for operations.
    pub config: Config,
}

impl OpsContext {
    /// Create a new OpsContext with the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Build options derived from configuration and request overrides.
    pub fn build_options(&self, request: &BuildRequest) -> BuildOptions {
        let mut options = BuildOptions::from(&self.config);
        if let Some(limit) = request.sibling_concurrency {
            options.sibling_concurrency = limit;
        }
        options
    }

    /// Load a description file and build it into `sink`.
    ///
    /// Structural errors are returned as `Err`; subtree failures are listed
    /// in the response's report.
    pub async fn build<S: SceneSink + ?Sized>(
        &self,
        sink: &S,
        request: BuildRequest,
    ) -> OpsResult<BuildResponse> {
        let options = self.build_options(&request);
        let path = self.config.resolve_description(request.path)?;
        let description = load_description(&path)?;

        info!(path = %path.display(), "building description");
        let report = NodeBuilder::new(sink)
            .with_options(options)
            .build_at(&description, request.parent)
            .await?;

        Ok(BuildResponse { path, report })
    }

    /// Load a description file and analyze its structure.
    pub fn validate(&self, request: ValidateRequest) -> OpsResult<ValidateResponse> {
        let path = self.config.resolve_description(request.path)?;
        let description = load_description(&path)?;
        let summary = description.analyze();
        Ok(ValidateResponse { path, summary })
    }
}
