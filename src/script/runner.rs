//! Applies a rewrite script to a source buffer.
//!
//! Each edit definition is resolved to a concrete range and fed through a
//! [`TreeRewriter`]. A refused edit (ambiguous selector, out-of-bounds
//! range, clobbering conflict) is reported per edit and does not disturb
//! the edits already accumulated.

use crate::range::Range;
use crate::script::schema::{EditDefinition, EditOp, RewriteScript, Selector};
use crate::source::SourceBuffer;
use crate::tree::enforcer::{DiagnosticSink, Enforcer};
use crate::tree::errors::RewriteError;
use crate::tree::rewriter::TreeRewriter;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("no occurrence of {search:?} in {name}")]
    NoMatch { name: String, search: String },

    #[error("{count} occurrences of {search:?} in {name} (expected exactly 1)")]
    AmbiguousMatch {
        name: String,
        search: String,
        count: usize,
    },

    #[error("selector range begin {begin} is after end {end}")]
    InvertedRange { begin: usize, end: usize },

    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

/// Outcome of one edit definition.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "EditOutcome should be checked for applied/no-change"]
pub enum EditOutcome {
    /// The edit changed the accumulated plan.
    Applied { range: Range },
    /// The edit was a no-op (empty insertion, identical replacement).
    NoChange { range: Range },
}

/// Result of applying a whole script to one buffer.
#[derive(Debug)]
pub struct ScriptReport {
    /// Per-edit outcomes, in script order, keyed by edit id.
    pub outcomes: Vec<(String, Result<EditOutcome, ScriptError>)>,
    /// The rewritten text after all successful edits.
    pub output: String,
}

impl ScriptReport {
    pub fn changed(&self, buffer: &SourceBuffer) -> bool {
        self.output != buffer.source()
    }

    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_err())
            .count()
    }
}

/// Run `script` against `buffer` with the script's own policies and the
/// default diagnostic sink.
pub fn run_script(script: &RewriteScript, buffer: &SourceBuffer) -> ScriptReport {
    run_script_with(script, buffer, Enforcer::new(script.policy))
}

/// Run `script` against `buffer`, warning through `sink`.
pub fn run_script_with_sink(
    script: &RewriteScript,
    buffer: &SourceBuffer,
    sink: Box<dyn DiagnosticSink>,
) -> ScriptReport {
    run_script_with(script, buffer, Enforcer::with_sink(script.policy, sink))
}

fn run_script_with(
    script: &RewriteScript,
    buffer: &SourceBuffer,
    enforcer: Enforcer,
) -> ScriptReport {
    let mut rewriter = TreeRewriter::with_enforcer(buffer, enforcer);
    let mut outcomes = Vec::with_capacity(script.edits.len());

    for edit in &script.edits {
        let outcome = apply_edit(&mut rewriter, buffer, edit);
        match &outcome {
            Ok(EditOutcome::Applied { range }) => {
                tracing::debug!(id = %edit.id, %range, "edit applied");
            }
            Ok(EditOutcome::NoChange { range }) => {
                tracing::debug!(id = %edit.id, %range, "edit was a no-op");
            }
            Err(error) => {
                tracing::debug!(id = %edit.id, %error, "edit refused");
            }
        }
        outcomes.push((edit.id.clone(), outcome));
    }

    let output = rewriter.process();
    ScriptReport { outcomes, output }
}

fn apply_edit(
    rewriter: &mut TreeRewriter<'_>,
    buffer: &SourceBuffer,
    edit: &EditDefinition,
) -> Result<EditOutcome, ScriptError> {
    let range = resolve_selector(buffer, &edit.select)?;
    let plan_before = rewriter.replacements();

    match &edit.op {
        EditOp::InsertBefore { text } => rewriter.insert_before(range, text.clone())?,
        EditOp::InsertAfter { text } => rewriter.insert_after(range, text.clone())?,
        EditOp::Replace { text } => rewriter.replace(range, text.clone())?,
        EditOp::Remove => rewriter.remove(range)?,
        EditOp::Wrap { before, after } => rewriter.wrap(range, before.clone(), after.clone())?,
    }

    if rewriter.replacements() == plan_before {
        Ok(EditOutcome::NoChange { range })
    } else {
        Ok(EditOutcome::Applied { range })
    }
}

fn resolve_selector(buffer: &SourceBuffer, selector: &Selector) -> Result<Range, ScriptError> {
    match selector {
        Selector::Range { begin, end } => {
            if begin > end {
                return Err(ScriptError::InvertedRange {
                    begin: *begin,
                    end: *end,
                });
            }
            Ok(Range::new(*begin, *end))
        }
        Selector::Text { search } => {
            let occurrences: Vec<usize> = buffer
                .source()
                .match_indices(search.as_str())
                .map(|(offset, _)| offset)
                .collect();
            match occurrences.as_slice() {
                [] => Err(ScriptError::NoMatch {
                    name: buffer.name().to_string(),
                    search: search.clone(),
                }),
                [offset] => Ok(Range::new(*offset, *offset + search.len())),
                _ => Err(ScriptError::AmbiguousMatch {
                    name: buffer.name().to_string(),
                    search: search.clone(),
                    count: occurrences.len(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::loader::load_from_str;

    fn script(input: &str) -> RewriteScript {
        load_from_str(input).expect("script")
    }

    #[test]
    fn applies_text_selected_edits() {
        let buffer = SourceBuffer::new("demo.rs", "fn old_name() { body() }");
        let script = script(
            r#"
[[edits]]
id = "rename"

[edits.select]
type = "text"
search = "old_name"

[edits.op]
type = "replace"
text = "new_name"
"#,
        );
        let report = run_script(&script, &buffer);
        assert_eq!(report.failures(), 0);
        assert_eq!(report.output, "fn new_name() { body() }");
        assert!(report.changed(&buffer));
    }

    #[test]
    fn reports_missing_and_ambiguous_selectors() {
        let buffer = SourceBuffer::new("demo.rs", "aa bb aa");
        let script = script(
            r#"
[[edits]]
id = "missing"

[edits.select]
type = "text"
search = "zz"

[edits.op]
type = "remove"

[[edits]]
id = "ambiguous"

[edits.select]
type = "text"
search = "aa"

[edits.op]
type = "remove"
"#,
        );
        let report = run_script(&script, &buffer);
        assert_eq!(report.failures(), 2);
        assert!(matches!(
            report.outcomes[0].1,
            Err(ScriptError::NoMatch { .. })
        ));
        assert!(matches!(
            report.outcomes[1].1,
            Err(ScriptError::AmbiguousMatch { count: 2, .. })
        ));
        assert!(!report.changed(&buffer));
    }

    #[test]
    fn conflicting_edit_fails_without_losing_earlier_edits() {
        let buffer = SourceBuffer::new("demo.rs", "abcdef");
        let script = script(
            r#"
[[edits]]
id = "first"

[edits.select]
type = "range"
begin = 1
end = 3

[edits.op]
type = "replace"
text = "X"

[[edits]]
id = "second"

[edits.select]
type = "range"
begin = 1
end = 3

[edits.op]
type = "replace"
text = "Y"
"#,
        );
        let report = run_script(&script, &buffer);
        assert_eq!(report.failures(), 1);
        assert!(matches!(
            report.outcomes[1].1,
            Err(ScriptError::Rewrite(RewriteError::DifferentReplacements { .. }))
        ));
        assert_eq!(report.output, "aXdef");
    }

    #[test]
    fn identical_replacement_leaves_output_unchanged() {
        let buffer = SourceBuffer::new("demo.rs", "abc");
        let script = script(
            r#"
[[edits]]
id = "same"

[edits.select]
type = "range"
begin = 0
end = 3

[edits.op]
type = "replace"
text = "abc"
"#,
        );
        let report = run_script(&script, &buffer);
        assert_eq!(report.failures(), 0);
        // the replacement is recorded even though the text is identical
        assert!(matches!(
            report.outcomes[0].1,
            Ok(EditOutcome::Applied { .. })
        ));
        assert_eq!(report.output, "abc");
        assert!(!report.changed(&buffer));
    }

    #[test]
    fn wrap_edit_wraps_the_selection() {
        let buffer = SourceBuffer::new("demo.rs", "call arg here");
        let script = script(
            r#"
[[edits]]
id = "parenthesize"

[edits.select]
type = "text"
search = "arg"

[edits.op]
type = "wrap"
before = "("
after = ")"
"#,
        );
        let report = run_script(&script, &buffer);
        assert_eq!(report.failures(), 0);
        assert_eq!(report.output, "call (arg) here");
    }
}
