//! TOML rewrite scripts: schema, loading, and application.

pub mod loader;
pub mod runner;
pub mod schema;

pub use loader::{load_from_path, load_from_str, LoadError};
pub use runner::{run_script, run_script_with_sink, EditOutcome, ScriptError, ScriptReport};
pub use schema::{
    EditDefinition, EditOp, Metadata, RewriteScript, Selector, ValidationError, ValidationIssue,
};
