//! Build command implementation.
//!
//! Builds a description into a fresh in-process scene and prints it.

use std::path::PathBuf;

use anyhow::Result;
use scenegraft_core::{MemorySink, SceneNodeHandle, SceneSnapshot};
use scenegraft_ops::{
    collect_descendants, BuildRequest, BuildSummary, DescendantFilter, Explosion,
    ExplosionReport, OpsContext,
};
use serde::Serialize;

/// Arguments of `sg build`.
#[derive(Debug, Clone, Default)]
pub struct BuildArgs {
    pub path: Option<PathBuf>,
    pub json: bool,
    pub concurrency: Option<usize>,
    pub fail_uris: Vec<String>,
    pub descendants: bool,
    pub explode: Option<f64>,
}

#[derive(Debug, Serialize)]
struct BuildOutput {
    path: PathBuf,
    report: BuildSummary,
    scene: SceneSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    enabled_descendants: Option<Vec<SceneNodeHandle>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    explosion: Option<ExplosionReport>,
}

/// Execute the build command.
pub async fn execute(ctx: &OpsContext, args: BuildArgs) -> Result<()> {
    let sink = args
        .fail_uris
        .iter()
        .fold(MemorySink::new(), |sink, uri| sink.with_rejected_uri(uri.clone()));

    let request = BuildRequest {
        path: args.path,
        sibling_concurrency: args.concurrency,
        parent: None,
    };
    let response = ctx.build(&sink, request).await?;
    let report = &response.report;

    let explosion = match (args.explode, report.root) {
        (Some(factor), Some(root)) => Some(Explosion::new(&sink, root).explode(factor).await?),
        _ => None,
    };

    let enabled_descendants = match (args.descendants, report.root) {
        (true, Some(root)) => {
            Some(collect_descendants(&sink, root, DescendantFilter::EnabledOnly).await)
        }
        _ => None,
    };

    if args.json {
        let output = BuildOutput {
            path: response.path.clone(),
            report: report.summary(),
            scene: sink.snapshot(),
            enabled_descendants,
            explosion,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("🌳 Scene from {}", response.path.display());
    println!("{:─<50}", "");
    print!("{}", sink.outline());
    println!("{:─<50}", "");
    println!(
        "Created {} node(s) in {} ms",
        report.created,
        report.duration.as_millis()
    );

    for (parent, child) in &report.skipped_dangling {
        println!("ℹ️  Skipped missing child `{}` of `{}`", child, parent);
    }
    for failure in &report.failures {
        eprintln!("⚠️  {}", failure);
    }

    if let Some(explosion) = &explosion {
        println!(
            "💥 Exploded {} part(s) with factor {}",
            explosion.moved.len(),
            explosion.factor
        );
        for skipped in &explosion.skipped {
            eprintln!("⚠️  Part {} not exploded: {}", skipped.handle, skipped.reason);
        }
    }

    if let Some(descendants) = enabled_descendants {
        let handles: Vec<String> = descendants.iter().map(ToString::to_string).collect();
        println!("Enabled descendants: {}", handles.join(", "));
    }

    if report.is_complete() {
        println!("✅ Scene built");
    } else {
        println!(
            "⚠️  Scene partially built: {} subtree(s) failed",
            report.failures.len()
        );
    }

    Ok(())
}
