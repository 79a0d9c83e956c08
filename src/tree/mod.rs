//! The action-tree engine: edit accumulation, conflict policies, and
//! production of the rewritten text.

mod action;
mod apply;
pub mod enforcer;
pub mod errors;
pub mod rewriter;

pub use enforcer::{
    Conflict, ConflictKind, Diagnostic, DiagnosticSink, Enforcer, Policy, PolicySet, TracingSink,
};
pub use errors::RewriteError;
pub use rewriter::TreeRewriter;
