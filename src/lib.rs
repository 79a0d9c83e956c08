//! Treewrite: conflict-checked source rewriting
//!
//! A library for accumulating local edits over a source buffer (insert
//! before/after a range, replace, remove, wrap) and producing the
//! rewritten text from a single, conflict-checked edit plan.
//!
//! # Architecture
//!
//! Edits are held in an action tree over half-open byte ranges: children
//! are strictly contained by their parent, siblings are pairwise disjoint,
//! and a node that replaces its whole range has no children. Every edit
//! call builds a leaf action and combines it into the tree; colliding
//! edits are classified into four conflict kinds, each governed by a
//! configurable policy (`accept`, `warn`, `raise`). Producing the output
//! flattens the tree into ordered splices and applies them in one pass.
//!
//! # Safety
//!
//! - A refused edit leaves the tree in its previous valid state
//! - Ranges are validated against buffer bounds and character boundaries
//! - Producing the output never fails and can be repeated
//!
//! # Example
//!
//! ```
//! use treewrite::{Range, SourceBuffer, TreeRewriter};
//!
//! let buffer = SourceBuffer::new("example.rs", "fn hello() {}");
//! let mut rewriter = TreeRewriter::new(&buffer);
//!
//! rewriter.replace(Range::new(3, 8), "greet")?;
//! rewriter.insert_before(Range::at(11), "-> () ")?;
//!
//! assert_eq!(rewriter.process(), "fn greet() -> () {}");
//! # Ok::<(), treewrite::RewriteError>(())
//! ```

pub mod range;
pub mod script;
pub mod source;
pub mod tree;

// Re-exports
pub use range::Range;
pub use script::{
    load_from_path, load_from_str, run_script, run_script_with_sink, EditOutcome, LoadError,
    RewriteScript, ScriptError, ScriptReport,
};
pub use source::SourceBuffer;
pub use tree::{
    Conflict, ConflictKind, Diagnostic, DiagnosticSink, Enforcer, Policy, PolicySet, RewriteError,
    TreeRewriter,
};
