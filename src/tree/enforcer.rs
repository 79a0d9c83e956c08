//! Conflict policies and their enforcement.
//!
//! The combine algorithm detects four kinds of collisions between edits.
//! What happens next is not its decision: it hands the conflict to the
//! [`Enforcer`], which looks up the configured [`Policy`] for that kind and
//! either proceeds silently, emits a diagnostic and proceeds, or aborts the
//! edit with a clobbering error.

use crate::range::Range;
use crate::tree::errors::RewriteError;
use serde::Deserialize;
use std::fmt;

/// The four conflict conditions the combine algorithm can detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictKind {
    CrossingDeletions,
    CrossingInsertions,
    DifferentReplacements,
    SwallowedInsertions,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::CrossingDeletions => "crossing_deletions",
            ConflictKind::CrossingInsertions => "crossing_insertions",
            ConflictKind::DifferentReplacements => "different_replacements",
            ConflictKind::SwallowedInsertions => "swallowed_insertions",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do when a conflict of a given kind is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Proceed silently.
    Accept,
    /// Emit a diagnostic to the sink and proceed.
    Warn,
    /// Abort the current edit with a clobbering error.
    Raise,
}

/// Per-kind conflict policies.
///
/// The defaults fuse crossing deletions and refuse everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PolicySet {
    pub crossing_deletions: Policy,
    pub crossing_insertions: Policy,
    pub different_replacements: Policy,
    pub swallowed_insertions: Policy,
}

impl Default for PolicySet {
    fn default() -> Self {
        Self {
            crossing_deletions: Policy::Accept,
            crossing_insertions: Policy::Raise,
            different_replacements: Policy::Raise,
            swallowed_insertions: Policy::Raise,
        }
    }
}

impl PolicySet {
    pub fn for_kind(&self, kind: ConflictKind) -> Policy {
        match kind {
            ConflictKind::CrossingDeletions => self.crossing_deletions,
            ConflictKind::CrossingInsertions => self.crossing_insertions,
            ConflictKind::DifferentReplacements => self.different_replacements,
            ConflictKind::SwallowedInsertions => self.swallowed_insertions,
        }
    }
}

/// Payload handed to the enforcer when a conflict is detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    DifferentReplacements {
        range: Range,
        replacement: String,
        other_replacement: String,
    },
    CrossingDeletions {
        range: Range,
        conflict: Range,
    },
    CrossingInsertions {
        range: Range,
        conflict: Range,
    },
    SwallowedInsertions {
        range: Range,
        conflict: Vec<Range>,
    },
}

impl Conflict {
    pub fn kind(&self) -> ConflictKind {
        match self {
            Conflict::DifferentReplacements { .. } => ConflictKind::DifferentReplacements,
            Conflict::CrossingDeletions { .. } => ConflictKind::CrossingDeletions,
            Conflict::CrossingInsertions { .. } => ConflictKind::CrossingInsertions,
            Conflict::SwallowedInsertions { .. } => ConflictKind::SwallowedInsertions,
        }
    }

    fn into_error(self) -> RewriteError {
        match self {
            Conflict::DifferentReplacements {
                range,
                replacement,
                other_replacement,
            } => RewriteError::DifferentReplacements {
                range,
                replacement,
                other_replacement,
            },
            Conflict::CrossingDeletions { range, conflict } => {
                RewriteError::CrossingDeletions { range, conflict }
            }
            Conflict::CrossingInsertions { range, conflict } => {
                RewriteError::CrossingInsertions { range, conflict }
            }
            Conflict::SwallowedInsertions { range, conflict } => {
                RewriteError::SwallowedInsertions { range, conflict }
            }
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::DifferentReplacements {
                range,
                replacement,
                other_replacement,
            } => write!(
                f,
                "conflicting replacements for {range}: {replacement:?} vs {other_replacement:?}"
            ),
            Conflict::CrossingDeletions { range, conflict } => {
                write!(f, "deletion of {range} crosses deletion of {conflict}")
            }
            Conflict::CrossingInsertions { range, conflict } => {
                write!(f, "edit at {range} crosses insertion at {conflict}")
            }
            Conflict::SwallowedInsertions { range, conflict } => {
                write!(f, "replacing {range} would discard insertions at ")?;
                for (index, child) in conflict.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{child}")?;
                }
                Ok(())
            }
        }
    }
}

/// A rendered conflict report, delivered to the sink for `warn` policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    conflict: Conflict,
}

impl Diagnostic {
    fn new(conflict: Conflict) -> Self {
        Self { conflict }
    }

    pub fn kind(&self) -> ConflictKind {
        self.conflict.kind()
    }

    pub fn conflict(&self) -> &Conflict {
        &self.conflict
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.conflict, self.conflict.kind())
    }
}

/// Receives diagnostics for conflicts whose policy is `warn`.
pub trait DiagnosticSink {
    fn emit(&self, diagnostic: &Diagnostic);
}

/// Default sink: forwards diagnostics to `tracing::warn!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: &Diagnostic) {
        tracing::warn!("{diagnostic}");
    }
}

/// Owns the policy table and the diagnostic sink.
///
/// One enforcer is shared (by reference) across all actions of one tree and
/// is never mutated by the combine algorithm.
pub struct Enforcer {
    policy: PolicySet,
    sink: Box<dyn DiagnosticSink>,
}

impl Enforcer {
    pub fn new(policy: PolicySet) -> Self {
        Self::with_sink(policy, Box::new(TracingSink))
    }

    pub fn with_sink(policy: PolicySet, sink: Box<dyn DiagnosticSink>) -> Self {
        Self { policy, sink }
    }

    pub fn policy(&self) -> &PolicySet {
        &self.policy
    }

    /// Apply the configured policy to a detected conflict.
    pub(crate) fn check(&self, conflict: Conflict) -> Result<(), RewriteError> {
        match self.policy.for_kind(conflict.kind()) {
            Policy::Accept => Ok(()),
            Policy::Warn => {
                self.sink.emit(&Diagnostic::new(conflict));
                Ok(())
            }
            Policy::Raise => Err(conflict.into_error()),
        }
    }
}

impl fmt::Debug for Enforcer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enforcer")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
