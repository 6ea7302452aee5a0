//! Positioned diagnostics and the rewrite error taxonomy.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::source_map::Position;

pub const MSG_NESTED_PRIMITIVE: &str = "concurrency primitive outside top-level statement context";
pub const MSG_SELECT_FALLTHROUGH: &str = "fallthrough between select clauses is not supported";

/// A structural violation at a source position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub position: Position,
    pub message: String,
}

impl Diagnostic {
    pub fn new(position: Position, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.message)
    }
}

/// Append-only list of diagnostics accumulated during one pass over a file,
/// in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", render_lines(.diagnostics))]
pub struct ErrorQueue {
    diagnostics: Vec<Diagnostic>,
}

fn render_lines(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

impl ErrorQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// `Ok(())` when nothing was reported, the queue itself otherwise.
    pub fn into_result(self) -> Result<(), ErrorQueue> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl IntoIterator for ErrorQueue {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

/// Failures that stop one file from being rewritten or written.
/// Structural violations are never fatal and travel in an [`ErrorQueue`] instead.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("cannot parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RewriteError {
    pub fn parse(path: impl Into<PathBuf>, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Parse {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: usize, column: usize) -> Position {
        Position {
            filename: "main.go".to_string(),
            line,
            column,
        }
    }

    #[test]
    fn test_queue_preserves_discovery_order() {
        let mut queue = ErrorQueue::new();
        queue.push(Diagnostic::new(at(7, 3), MSG_NESTED_PRIMITIVE));
        queue.push(Diagnostic::new(at(2, 1), MSG_SELECT_FALLTHROUGH));
        assert_eq!(queue.len(), 2);
        assert_eq!(
            queue.to_string(),
            format!(
                "main.go:7:3: {}\nmain.go:2:1: {}",
                MSG_NESTED_PRIMITIVE, MSG_SELECT_FALLTHROUGH
            )
        );
    }

    #[test]
    fn test_into_result() {
        assert!(ErrorQueue::new().into_result().is_ok());
        let mut queue = ErrorQueue::new();
        queue.push(Diagnostic::new(at(1, 1), "boom"));
        let err = queue.into_result().unwrap_err();
        assert_eq!(err.diagnostics()[0].message, "boom");
    }

    #[test]
    fn test_write_error_names_path() {
        let err = RewriteError::write(
            "out/main.go",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "cannot write out/main.go: denied");
    }
}
