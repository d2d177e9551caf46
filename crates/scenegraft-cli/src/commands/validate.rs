//! Validate command implementation.

use std::path::PathBuf;

use anyhow::Result;
use scenegraft_ops::{OpsContext, ValidateRequest};

/// Execute the validate command. Fails when the description cannot be built.
pub fn execute(ctx: &OpsContext, path: Option<PathBuf>, json: bool) -> Result<()> {
    let response = ctx.validate(ValidateRequest { path })?;
    let summary = &response.summary;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("📄 {}", response.path.display());
        println!("{:─<50}", "");
        println!("Root:        {}", summary.root);
        println!("Nodes:       {}", summary.node_count);
        println!("Reachable:   {}", summary.reachable_count);
        for (parent, child) in &summary.dangling {
            println!("Dangling:    `{}` -> `{}`", parent, child);
        }
        for key in &summary.unreachable {
            println!("Unreachable: `{}`", key);
        }
    }

    if !summary.root_present {
        anyhow::bail!("root `{}` is not present in the description", summary.root);
    }
    if let Some(cycle) = &summary.cycle {
        let path: Vec<&str> = cycle.iter().map(|key| key.as_str()).collect();
        anyhow::bail!("description is cyclic: {}", path.join(" -> "));
    }

    if !json {
        println!("✅ Description is buildable");
    }
    Ok(())
}
