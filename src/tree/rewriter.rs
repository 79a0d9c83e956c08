//! The public edit surface.
//!
//! A [`TreeRewriter`] owns the action tree for one source buffer. Edit
//! calls build leaf actions and combine them into the root; requesting the
//! result flattens the tree and splices the buffer. All conflict handling
//! goes through the rewriter's [`Enforcer`].

use crate::range::Range;
use crate::source::SourceBuffer;
use crate::tree::action::Action;
use crate::tree::apply;
use crate::tree::enforcer::{Enforcer, PolicySet};
use crate::tree::errors::RewriteError;

/// Accumulates local edits over one buffer and produces the rewritten text.
///
/// Every mutating operation either succeeds, leaving the tree in a valid
/// state, or returns a [`RewriteError`] and leaves the tree exactly as it
/// was. `process` is pure and can be called at any point.
///
/// # Example
///
/// ```
/// use treewrite::{Range, SourceBuffer, TreeRewriter};
///
/// let buffer = SourceBuffer::new("example", "let x = 1;");
/// let mut rewriter = TreeRewriter::new(&buffer);
/// rewriter.replace(Range::new(4, 5), "answer")?;
/// rewriter.replace(Range::new(8, 9), "42")?;
/// assert_eq!(rewriter.process(), "let answer = 42;");
/// # Ok::<(), treewrite::RewriteError>(())
/// ```
pub struct TreeRewriter<'a> {
    buffer: &'a SourceBuffer,
    enforcer: Enforcer,
    root: Action,
}

impl<'a> TreeRewriter<'a> {
    /// A rewriter with the default conflict policies.
    pub fn new(buffer: &'a SourceBuffer) -> Self {
        Self::with_enforcer(buffer, Enforcer::new(PolicySet::default()))
    }

    pub fn with_policy(buffer: &'a SourceBuffer, policy: PolicySet) -> Self {
        Self::with_enforcer(buffer, Enforcer::new(policy))
    }

    /// A rewriter with a fully custom enforcer (policies plus sink).
    pub fn with_enforcer(buffer: &'a SourceBuffer, enforcer: Enforcer) -> Self {
        Self {
            buffer,
            enforcer,
            root: Action::new(buffer.full_range()),
        }
    }

    pub fn buffer(&self) -> &SourceBuffer {
        self.buffer
    }

    pub fn enforcer(&self) -> &Enforcer {
        &self.enforcer
    }

    /// Insert `text` immediately before `range`.
    pub fn insert_before(
        &mut self,
        range: Range,
        text: impl Into<String>,
    ) -> Result<(), RewriteError> {
        self.combine(Action::with_insert_before(range, text))
    }

    /// Insert `text` immediately after `range`.
    pub fn insert_after(
        &mut self,
        range: Range,
        text: impl Into<String>,
    ) -> Result<(), RewriteError> {
        self.combine(Action::with_insert_after(range, text))
    }

    /// Replace the text at `range` with `text`.
    ///
    /// An empty `text` over an empty range is a no-op.
    pub fn replace(&mut self, range: Range, text: impl Into<String>) -> Result<(), RewriteError> {
        self.combine(Action::with_replacement(range, text))
    }

    /// Delete the text at `range`.
    pub fn remove(&mut self, range: Range) -> Result<(), RewriteError> {
        self.replace(range, "")
    }

    /// Insert `before` at the start of `range` and `after` at its end.
    pub fn wrap(
        &mut self,
        range: Range,
        before: impl Into<String>,
        after: impl Into<String>,
    ) -> Result<(), RewriteError> {
        self.insert_before(range.begin_only(), before)?;
        self.insert_after(range.end_only(), after)
    }

    /// True when no effective edit has been recorded.
    pub fn is_unchanged(&self) -> bool {
        self.root.is_nop()
    }

    /// The flattened edit plan, in source order.
    pub fn replacements(&self) -> Vec<(Range, String)> {
        let mut flat = Vec::new();
        self.root.ordered_replacements(&mut flat);
        flat.into_iter()
            .map(|(range, text)| (range, text.to_string()))
            .collect()
    }

    /// Produce the rewritten text. Pure; callable repeatedly.
    pub fn process(&self) -> String {
        let mut flat = Vec::new();
        self.root.ordered_replacements(&mut flat);
        apply::splice(self.buffer.source(), &flat)
    }

    /// Merge all edits accumulated by `other` into this rewriter, running
    /// the usual conflict checks. Both rewriters must address the same
    /// buffer.
    pub fn import(&mut self, other: &TreeRewriter<'_>) -> Result<(), RewriteError> {
        if !std::ptr::eq(self.buffer, other.buffer) {
            return Err(RewriteError::BufferMismatch);
        }
        self.root = self.root.combine(other.root.clone(), &self.enforcer)?;
        Ok(())
    }

    fn combine(&mut self, action: Action) -> Result<(), RewriteError> {
        self.check_range(action.range())?;
        self.root = self.root.combine(action, &self.enforcer)?;
        Ok(())
    }

    fn check_range(&self, range: Range) -> Result<(), RewriteError> {
        let buffer = self.buffer.full_range();
        if range.end() > buffer.end() {
            return Err(RewriteError::OutOfBounds { range, buffer });
        }
        let source = self.buffer.source();
        if !source.is_char_boundary(range.begin()) || !source.is_char_boundary(range.end()) {
            return Err(RewriteError::NotCharBoundary {
                begin: range.begin(),
                end: range.end(),
            });
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.root.check_invariants();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::enforcer::Policy;

    fn buffer(source: &str) -> SourceBuffer {
        SourceBuffer::new("test", source)
    }

    #[test]
    fn surrounding_insertions() {
        let buffer = buffer("abc");
        let mut rewriter = TreeRewriter::new(&buffer);
        rewriter.insert_before(Range::new(0, 3), "X").unwrap();
        rewriter.insert_after(Range::new(0, 3), "Y").unwrap();
        assert_eq!(rewriter.process(), "XabcY");
    }

    #[test]
    fn nested_insertions_wrap_outside_inner_ones() {
        let buffer = buffer("abc");
        let mut rewriter = TreeRewriter::new(&buffer);
        rewriter.insert_before(Range::new(0, 3), "1").unwrap();
        rewriter.insert_after(Range::new(0, 3), "2").unwrap();
        rewriter.insert_before(Range::new(0, 1), "3").unwrap();
        rewriter.insert_after(Range::new(0, 1), "4").unwrap();
        rewriter.check_invariants();
        assert_eq!(rewriter.process(), "13a4bc2");
    }

    #[test]
    fn crossing_deletions_fuse_by_default() {
        let buffer = buffer("abcdef");
        let mut rewriter = TreeRewriter::new(&buffer);
        rewriter.remove(Range::new(1, 3)).unwrap();
        rewriter.remove(Range::new(2, 5)).unwrap();
        rewriter.check_invariants();
        assert_eq!(rewriter.process(), "af");
    }

    #[test]
    fn different_replacements_raise_by_default() {
        let buffer = buffer("abcdef");
        let mut rewriter = TreeRewriter::new(&buffer);
        rewriter.replace(Range::new(1, 3), "X").unwrap();
        let err = rewriter.replace(Range::new(1, 3), "Y").unwrap_err();
        assert!(matches!(err, RewriteError::DifferentReplacements { .. }));
        // the failed edit left the tree untouched
        assert_eq!(rewriter.process(), "aXdef");
    }

    #[test]
    fn newer_replacement_wins_when_accepted() {
        let buffer = buffer("abcdef");
        let policy = PolicySet {
            different_replacements: Policy::Accept,
            ..PolicySet::default()
        };
        let mut rewriter = TreeRewriter::with_policy(&buffer, policy);
        rewriter.replace(Range::new(1, 3), "X").unwrap();
        rewriter.replace(Range::new(1, 3), "Y").unwrap();
        assert_eq!(rewriter.process(), "aYdef");
    }

    #[test]
    fn insertions_at_the_same_point() {
        let buffer = buffer("hello");
        let mut rewriter = TreeRewriter::new(&buffer);
        rewriter.insert_before(Range::at(2), "_").unwrap();
        rewriter.insert_after(Range::at(2), "_").unwrap();
        assert_eq!(rewriter.process(), "he__llo");
    }

    #[test]
    fn replacement_swallowing_an_insertion() {
        let buffer = buffer("abc");
        let mut rewriter = TreeRewriter::new(&buffer);
        rewriter.insert_before(Range::new(1, 2), "X").unwrap();
        let err = rewriter.replace(Range::new(0, 3), "Z").unwrap_err();
        assert!(matches!(err, RewriteError::SwallowedInsertions { .. }));

        let policy = PolicySet {
            swallowed_insertions: Policy::Accept,
            ..PolicySet::default()
        };
        let mut rewriter = TreeRewriter::with_policy(&buffer, policy);
        rewriter.insert_before(Range::new(1, 2), "X").unwrap();
        rewriter.replace(Range::new(0, 3), "Z").unwrap();
        assert_eq!(rewriter.process(), "Z");
    }

    #[test]
    fn disjoint_edits_commute() {
        let buffer = buffer("abcdef");

        let mut forward = TreeRewriter::new(&buffer);
        forward.replace(Range::new(0, 2), "AB").unwrap();
        forward.remove(Range::new(3, 4)).unwrap();
        forward.insert_after(Range::new(5, 6), "!").unwrap();

        let mut backward = TreeRewriter::new(&buffer);
        backward.insert_after(Range::new(5, 6), "!").unwrap();
        backward.remove(Range::new(3, 4)).unwrap();
        backward.replace(Range::new(0, 2), "AB").unwrap();

        assert_eq!(forward.process(), backward.process());
        assert_eq!(forward.process(), "ABcef!");
    }

    #[test]
    fn empty_edits_change_nothing() {
        let buffer = buffer("abcdef");
        let mut rewriter = TreeRewriter::new(&buffer);
        rewriter.insert_before(Range::new(1, 3), "").unwrap();
        rewriter.insert_after(Range::new(2, 4), "").unwrap();
        rewriter.replace(Range::new(1, 3), "bc").unwrap();
        assert_eq!(rewriter.process(), "abcdef");
    }

    #[test]
    fn wrap_is_two_boundary_insertions() {
        let buffer = buffer("abcdef");
        let mut wrapped = TreeRewriter::new(&buffer);
        wrapped.wrap(Range::new(1, 4), "(", ")").unwrap();

        let mut split = TreeRewriter::new(&buffer);
        split.insert_before(Range::at(1), "(").unwrap();
        split.insert_after(Range::at(4), ")").unwrap();

        assert_eq!(wrapped.process(), split.process());
        assert_eq!(wrapped.process(), "a(bcd)ef");
    }

    #[test]
    fn flattened_plan_is_monotonic() {
        let buffer = buffer("abcdefgh");
        let mut rewriter = TreeRewriter::new(&buffer);
        rewriter.wrap(Range::new(1, 6), "<", ">").unwrap();
        rewriter.replace(Range::new(2, 4), "X").unwrap();
        rewriter.insert_after(Range::new(6, 7), "!").unwrap();
        let plan = rewriter.replacements();
        assert!(!plan.is_empty());
        for pair in plan.windows(2) {
            assert!(pair[0].0.begin() <= pair[1].0.begin());
        }
    }

    #[test]
    fn out_of_bounds_range_is_refused() {
        let buffer = buffer("abc");
        let mut rewriter = TreeRewriter::new(&buffer);
        let err = rewriter.replace(Range::new(1, 7), "X").unwrap_err();
        assert!(matches!(err, RewriteError::OutOfBounds { .. }));
    }

    #[test]
    fn non_char_boundary_is_refused() {
        let buffer = buffer("héllo");
        let mut rewriter = TreeRewriter::new(&buffer);
        let err = rewriter.remove(Range::new(1, 2)).unwrap_err();
        assert!(matches!(err, RewriteError::NotCharBoundary { .. }));
    }

    #[test]
    fn import_merges_two_rewriters() {
        let buffer = buffer("abcdef");
        let mut first = TreeRewriter::new(&buffer);
        first.insert_before(Range::new(0, 2), "<").unwrap();

        let mut second = TreeRewriter::new(&buffer);
        second.insert_after(Range::new(4, 6), ">").unwrap();
        second.replace(Range::new(2, 3), "C").unwrap();

        first.import(&second).unwrap();
        first.check_invariants();
        assert_eq!(first.process(), "<abCdef>");
    }

    #[test]
    fn import_detects_conflicts() {
        let buffer = buffer("abcdef");
        let mut first = TreeRewriter::new(&buffer);
        first.replace(Range::new(1, 3), "X").unwrap();

        let mut second = TreeRewriter::new(&buffer);
        second.replace(Range::new(1, 3), "Y").unwrap();

        let err = first.import(&second).unwrap_err();
        assert!(matches!(err, RewriteError::DifferentReplacements { .. }));
        // failed import leaves the original plan intact
        assert_eq!(first.process(), "aXdef");
    }

    #[test]
    fn import_requires_the_same_buffer() {
        let a = buffer("abc");
        let b = buffer("abc");
        let mut first = TreeRewriter::new(&a);
        let second = TreeRewriter::new(&b);
        let err = first.import(&second).unwrap_err();
        assert!(matches!(err, RewriteError::BufferMismatch));
    }

    #[test]
    fn is_unchanged_tracks_effective_edits() {
        let buffer = buffer("abc");
        let mut rewriter = TreeRewriter::new(&buffer);
        assert!(rewriter.is_unchanged());
        rewriter.insert_before(Range::new(0, 1), "").unwrap();
        assert!(rewriter.is_unchanged());
        rewriter.insert_before(Range::new(0, 1), "x").unwrap();
        assert!(!rewriter.is_unchanged());
    }
}
