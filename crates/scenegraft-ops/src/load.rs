//! Loading tree descriptions from disk.

use std::path::Path;

use scenegraft_core::TreeDescription;
use serde_json::Value;
use tracing::debug;

use crate::error::{OpsError, OpsResult};

/// Read and parse a description document.
pub fn load_description(path: &Path) -> OpsResult<TreeDescription> {
    let contents = std::fs::read_to_string(path)?;
    let description = parse_description(path, &contents)?;
    debug!(path = %path.display(), nodes = description.nodes.len(), "description_loaded");
    Ok(description)
}

/// Parse a description document. `path` is only used in error messages.
pub fn parse_description(path: &Path, contents: &str) -> OpsResult<TreeDescription> {
    let document: Value = serde_json::from_str(contents)?;

    let Some(object) = document.as_object() else {
        return Err(OpsError::invalid_document(path, "expected a JSON object"));
    };
    match object.get("root") {
        None | Some(Value::Null) => {
            return Err(OpsError::invalid_document(path, "missing `root`"));
        }
        Some(_) => {}
    }
    if !object.get("nodes").is_some_and(Value::is_object) {
        return Err(OpsError::invalid_document(
            path,
            "missing `nodes` object",
        ));
    }

    Ok(serde_json::from_value(document)?)
}
