use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::application::RewriteJob;

/// Extension of serialized tree files.
pub const TREE_EXTENSION: &str = "json";

pub struct ProjectLoader;

impl ProjectLoader {
    /// Builds one job per tree file. Loose inputs land directly in `output`;
    /// files found under a folder keep their path relative to that folder.
    /// Destinations carry `extension` instead of `.json`.
    pub fn plan_jobs(
        inputs: &[PathBuf],
        folders: &[PathBuf],
        output: &Path,
        extension: &str,
    ) -> Result<Vec<RewriteJob>> {
        let mut jobs = Vec::new();

        for input in inputs {
            if !input.is_file() {
                bail!("Input file {} does not exist", input.display());
            }
            let name = input
                .file_name()
                .with_context(|| format!("Input {} has no file name", input.display()))?;
            jobs.push(RewriteJob::new(
                input.clone(),
                output.join(destination_name(Path::new(name), extension)),
            ));
        }

        for folder in folders {
            for file in Self::collect_trees(folder)? {
                let relative = file.strip_prefix(folder).unwrap_or(&file).to_path_buf();
                jobs.push(RewriteJob::new(
                    file,
                    output.join(destination_name(&relative, extension)),
                ));
            }
        }

        // Same source named twice (e.g. as input and inside a folder).
        let mut seen = std::collections::HashSet::new();
        jobs.retain(|job| seen.insert(job.source.clone()));

        Ok(jobs)
    }

    /// Every tree file under `dir`, skipping hidden entries, `target` and `.git`.
    pub fn collect_trees(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        Self::collect_trees_recursive(dir, &mut files)?;
        files.sort();
        Ok(files)
    }

    fn collect_trees_recursive(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
        if dir.ends_with("target") || dir.ends_with(".git") {
            return Ok(());
        }
        if !dir.is_dir() {
            bail!("Folder {} does not exist", dir.display());
        }

        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if hidden {
                continue;
            }

            if path.is_dir() {
                Self::collect_trees_recursive(&path, out)?;
            } else if path.extension().is_some_and(|ext| ext == TREE_EXTENSION) {
                out.push(path);
            }
        }
        Ok(())
    }
}

/// `main.json` -> `main.go`; `main.go.json` -> `main.go`.
fn destination_name(relative: &Path, extension: &str) -> PathBuf {
    let stem = relative.with_extension("");
    if stem.extension().is_some_and(|ext| ext == extension) {
        stem
    } else {
        stem.with_extension(extension)
    }
}
