use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::config::RunContext;
use crate::discover::{discover_samples, SamplePair};
use crate::error::{Error, Result};
use crate::pairing::{process_sample, SampleSummary};
use crate::summary::SummaryWriter;

/// Where a directory run puts its trimmed reads and summary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    pub output_dir: PathBuf,
    pub summary_path: PathBuf,
}

impl RunLayout {
    /// `<root>/<name>TrimmedFastqs` and `<root>/<name>TrimSummary.txt`, where
    /// `name` is the run directory's own name.
    pub fn for_root(root: &Path) -> Result<Self> {
        let canonical = fs::canonicalize(root).map_err(|e| Error::file_io(root, e))?;
        let name = canonical
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("amptrim")
            .to_string();
        Ok(RunLayout {
            output_dir: root.join(format!("{}TrimmedFastqs", name)),
            summary_path: root.join(format!("{}TrimSummary.txt", name)),
        })
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Trim every sample found under `root`.
///
/// Samples missing a mate are logged and skipped; any other error aborts the
/// run, leaving the in-progress sample's outputs partially written.
pub fn run_directory(ctx: &RunContext, root: &Path, layout: &RunLayout) -> Result<Vec<SampleSummary>> {
    fs::create_dir_all(&layout.output_dir).map_err(|e| Error::file_io(&layout.output_dir, e))?;
    let mut summary = SummaryWriter::create(&layout.summary_path, ctx.spacers.is_some())?;

    let mut rows = Vec::new();
    for input in discover_samples(root)? {
        if same_directory(&input.directory, &layout.output_dir) {
            continue;
        }
        let pair = match input.into_pair() {
            Ok(pair) => pair,
            Err(e) => {
                warn!("{}; skipping sample", e);
                continue;
            }
        };
        rows.push(trim_pair(ctx, &pair, &layout.output_dir, Some(&mut summary))?);
    }

    info!(
        "Trimmed {} samples into {}; summary in {}",
        rows.len(),
        layout.output_dir.display(),
        layout.summary_path.display()
    );
    Ok(rows)
}

/// Trim a single explicit pair, optionally appending its summary row.
pub fn trim_pair(
    ctx: &RunContext,
    pair: &SamplePair,
    output_dir: &Path,
    summary: Option<&mut SummaryWriter>,
) -> Result<SampleSummary> {
    fs::create_dir_all(output_dir).map_err(|e| Error::file_io(output_dir, e))?;
    let row = process_sample(ctx, &pair.sample, &pair.forward, &pair.reverse, output_dir)?;
    if let Some(summary) = summary {
        summary.append(&row)?;
    }
    Ok(row)
}
