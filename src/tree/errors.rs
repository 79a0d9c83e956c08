use crate::range::Range;
use thiserror::Error;

/// Errors surfaced by the public edit operations.
///
/// The clobbering variants are raised by the policy enforcer when two edits
/// collide and the policy for that conflict kind is `raise`. A failed edit
/// leaves the tree in its previous valid state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    #[error("range {range} is outside the buffer range {buffer}")]
    OutOfBounds { range: Range, buffer: Range },

    #[error("range [{begin}, {end}) does not fall on character boundaries")]
    NotCharBoundary { begin: usize, end: usize },

    #[error("cannot import edits accumulated over a different buffer")]
    BufferMismatch,

    #[error("conflicting replacements for {range}: {replacement:?} vs {other_replacement:?}")]
    DifferentReplacements {
        range: Range,
        replacement: String,
        other_replacement: String,
    },

    #[error("deletion of {range} crosses deletion of {conflict}")]
    CrossingDeletions { range: Range, conflict: Range },

    #[error("edit at {range} crosses insertion at {conflict}")]
    CrossingInsertions { range: Range, conflict: Range },

    #[error("replacing {range} would discard {} insertion(s)", .conflict.len())]
    SwallowedInsertions { range: Range, conflict: Vec<Range> },
}
