//! Traversal context shared by the rewriting and prohibiting passes.

use std::fmt;

use crate::domain::ast::Pos;
use crate::domain::diagnostics::{Diagnostic, ErrorQueue};
use crate::domain::source_map::SourceMap;

/// Context threaded through every recursive call of one top-level rewrite.
///
/// Child frames reborrow the caller's queue, so all frames of a rewrite append
/// to the same [`ErrorQueue`] in call/return order. `depth` only drives the
/// indentation of trace output.
pub struct TraversalFrame<'a> {
    source_map: &'a SourceMap,
    errors: &'a mut ErrorQueue,
    depth: usize,
}

impl<'a> TraversalFrame<'a> {
    pub fn root(source_map: &'a SourceMap, errors: &'a mut ErrorQueue) -> Self {
        Self {
            source_map,
            errors,
            depth: 0,
        }
    }

    /// Frame for a callee: same source map and queue, one level deeper.
    pub fn recurse(&mut self) -> TraversalFrame<'_> {
        TraversalFrame {
            source_map: self.source_map,
            errors: &mut *self.errors,
            depth: self.depth + 1,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn source_map(&self) -> &SourceMap {
        self.source_map
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn add_error(&mut self, pos: Pos, message: &str) {
        let diagnostic = Diagnostic::new(self.source_map.position(pos), message);
        tracing::debug!("{}[¢] {}", indent(self.depth), diagnostic);
        self.errors.push(diagnostic);
    }

    pub fn trace(&self, args: fmt::Arguments<'_>) {
        tracing::trace!("{}{}", indent(self.depth), args);
    }
}

fn indent(depth: usize) -> String {
    let mut out = "··".repeat(depth);
    out.push(' ');
    out
}
