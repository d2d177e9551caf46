//! Response DTOs for operations.

use std::path::PathBuf;

use scenegraft_core::DescriptionSummary;
use serde::Serialize;

use crate::report::BuildReport;

/// Response from a build operation.
#[derive(Debug, Clone)]
pub struct BuildResponse {
    /// Description file that was built.
    pub path: PathBuf,
    pub report: BuildReport,
}

/// Response from a validate operation.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateResponse {
    pub path: PathBuf,
    pub summary: DescriptionSummary,
}
