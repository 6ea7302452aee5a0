// Batch use case for virtime.

pub mod pipeline;

use std::path::PathBuf;

use rayon::prelude::*;

use crate::domain::diagnostics::RewriteError;
use crate::ports::{TreeEmitter, TreeLoader};
use pipeline::{FileOutcome, Pipeline};

/// One input tree and where its rewritten form goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteJob {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl RewriteJob {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

#[derive(Debug)]
pub struct FileReport {
    pub job: RewriteJob,
    /// `None` when the file could not be loaded.
    pub outcome: Option<FileOutcome>,
    pub error: Option<RewriteError>,
}

impl FileReport {
    pub fn diagnostic_count(&self) -> usize {
        self.outcome.as_ref().map_or(0, |o| o.diagnostics.len())
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn failures(&self) -> usize {
        self.files.iter().filter(|f| f.error.is_some()).count()
    }

    pub fn diagnostics(&self) -> usize {
        self.files.iter().map(FileReport::diagnostic_count).sum()
    }

    /// No file failed; under `strict`, no file has diagnostics either.
    pub fn is_clean(&self, strict: bool) -> bool {
        self.failures() == 0 && (!strict || self.diagnostics() == 0)
    }
}

pub struct RewriteUsecase<'a> {
    pub loader: &'a dyn TreeLoader,
    pub emitter: &'a dyn TreeEmitter,
    pub pipeline: &'a Pipeline,
}

impl<'a> RewriteUsecase<'a> {
    /// Rewrites every job on the current rayon pool. Files are independent;
    /// the report lists them in input order.
    pub fn run(&self, jobs: &[RewriteJob]) -> BatchReport {
        let files = jobs.par_iter().map(|job| self.run_one(job)).collect();
        BatchReport { files }
    }

    fn run_one(&self, job: &RewriteJob) -> FileReport {
        let mut unit = match self.loader.load(&job.source) {
            Ok(unit) => unit,
            Err(e) => {
                tracing::warn!("{}", e);
                return FileReport {
                    job: job.clone(),
                    outcome: None,
                    error: Some(e),
                };
            }
        };

        let outcome = self.pipeline.rewrite(&mut unit);
        tracing::info!(
            "{}: {} statements instrumented, {} time calls redirected, {} diagnostics",
            job.source.display(),
            outcome.stats.total(),
            outcome.converted_calls,
            outcome.diagnostics.len()
        );
        for diagnostic in &outcome.diagnostics {
            tracing::debug!("{}", diagnostic);
        }

        let error = self.emitter.emit(&unit, &job.destination).err();
        if let Some(e) = &error {
            tracing::warn!("{}", e);
        }

        FileReport {
            job: job.clone(),
            outcome: Some(outcome),
            error,
        }
    }
}
