// Main library entry point for virtime.
//
// Rewrites channel-based programs so a virtual-time scheduler can drive
// them deterministically. Layers, inner to outer: `domain` (tree model and
// rewriting passes), `application` (per-file pipeline and batch use case),
// `ports` (loader/emitter traits), `infrastructure` (adapters), `api`
// (report DTOs).

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::pipeline::{FileOutcome, Pipeline, SourceUnit};
pub use application::{BatchReport, RewriteJob, RewriteUsecase};
