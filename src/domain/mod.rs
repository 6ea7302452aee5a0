//! Tree model and rewriting passes. No I/O happens below this module.

pub mod ast;
pub mod calls;
pub mod classify;
pub mod diagnostics;
pub mod frame;
pub mod hooks;
pub mod imports;
pub mod prohibit;
pub mod rewrite;
pub mod source_map;
pub mod visit;
