//! Action nodes and the combination algorithm.
//!
//! An [`Action`] records the edits contributed at one range: optional text
//! before, an optional whole-range replacement, optional text after, and
//! child actions strictly contained within the range. The tree keeps three
//! structural invariants: children are strictly contained by their parent,
//! siblings are pairwise disjoint and sorted by begin offset, and a node
//! carrying a replacement has no children.
//!
//! Nodes are immutable. Combining returns fresh nodes and leaves the
//! originals untouched, so a refused edit never corrupts the tree.

use crate::range::Range;
use crate::tree::enforcer::{Conflict, Enforcer};
use crate::tree::errors::RewriteError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Action {
    range: Range,
    insert_before: String,
    replacement: Option<String>,
    insert_after: String,
    children: Vec<Action>,
}

impl Action {
    pub(crate) fn new(range: Range) -> Self {
        Self {
            range,
            insert_before: String::new(),
            replacement: None,
            insert_after: String::new(),
            children: Vec::new(),
        }
    }

    pub(crate) fn with_insert_before(range: Range, text: impl Into<String>) -> Self {
        Self {
            insert_before: text.into(),
            ..Self::new(range)
        }
    }

    pub(crate) fn with_insert_after(range: Range, text: impl Into<String>) -> Self {
        Self {
            insert_after: text.into(),
            ..Self::new(range)
        }
    }

    pub(crate) fn with_replacement(range: Range, text: impl Into<String>) -> Self {
        Self {
            replacement: Some(text.into()),
            ..Self::new(range)
        }
    }

    pub(crate) fn range(&self) -> Range {
        self.range
    }

    /// A no-op action: no insertions, no children, and no replacement that
    /// could change anything (an empty replacement of an empty range
    /// rewrites nothing).
    pub(crate) fn is_nop(&self) -> bool {
        self.insert_before.is_empty()
            && self.insert_after.is_empty()
            && self.children.is_empty()
            && match &self.replacement {
                None => true,
                Some(text) => text.is_empty() && self.range.is_empty(),
            }
    }

    /// Whether this subtree inserts any text: a non-empty insertion, a
    /// non-empty replacement, or any descendant doing so. Pure deletions
    /// and bare container nodes answer false.
    fn has_insertions(&self) -> bool {
        !self.insert_before.is_empty()
            || !self.insert_after.is_empty()
            || self.replacement.as_ref().is_some_and(|text| !text.is_empty())
            || self.children.iter().any(Action::has_insertions)
    }

    /// Combine a fresh `action` into this subtree.
    ///
    /// `self.range` must contain or equal `action.range`. Equal ranges
    /// merge into one node; contained ranges are placed among the children.
    pub(crate) fn combine(
        &self,
        action: Action,
        enforcer: &Enforcer,
    ) -> Result<Action, RewriteError> {
        if action.is_nop() {
            return Ok(self.clone());
        }
        if action.range == self.range {
            self.merge(action, enforcer)
        } else {
            self.place_in_hierarchy(action, enforcer)
        }
    }

    /// Flatten the subtree into `(range, text)` splices in source order:
    /// insert-before, replacement, children, insert-after.
    pub(crate) fn ordered_replacements<'a>(&'a self, out: &mut Vec<(Range, &'a str)>) {
        if !self.insert_before.is_empty() {
            out.push((self.range.begin_only(), &self.insert_before));
        }
        if let Some(replacement) = &self.replacement {
            out.push((self.range, replacement));
        }
        for child in &self.children {
            child.ordered_replacements(out);
        }
        if !self.insert_after.is_empty() {
            out.push((self.range.end_only(), &self.insert_after));
        }
    }

    /// Equal ranges collapse into one node. The newer edit wraps outside
    /// the older insertions and its replacement wins.
    fn merge(&self, action: Action, enforcer: &Enforcer) -> Result<Action, RewriteError> {
        if let (Some(newer), Some(older)) = (&action.replacement, &self.replacement) {
            if newer != older {
                enforcer.check(Conflict::DifferentReplacements {
                    range: self.range,
                    replacement: newer.clone(),
                    other_replacement: older.clone(),
                })?;
            }
        }

        let Action {
            insert_before,
            replacement,
            insert_after,
            children: new_children,
            ..
        } = action;

        let merged = Action {
            range: self.range,
            insert_before: format!("{}{}", insert_before, self.insert_before),
            replacement: replacement.or_else(|| self.replacement.clone()),
            insert_after: format!("{}{}", self.insert_after, insert_after),
            children: Vec::new(),
        };
        let merged = merged.adopt(self.children.clone(), enforcer)?;
        merged.combine_children(new_children, enforcer)
    }

    /// Insert `action` among our children: as a new sibling, as a
    /// descendant of the child containing it, as the new parent of the
    /// children it contains, or fused with the children it crosses.
    fn place_in_hierarchy(
        &self,
        action: Action,
        enforcer: &Enforcer,
    ) -> Result<Action, RewriteError> {
        let r = action.range;
        let children = &self.children;

        // Two probes over the sorted children: the first child not entirely
        // to the left of `action`, and the first child entirely to its
        // right. Everything in between needs a closer look.
        let mut left_index = children.partition_point(|child| child.range.end() <= r.begin());
        let start = left_index.saturating_sub(1);
        let mut right_index =
            start + children[start..].partition_point(|child| child.range.begin() < r.end());

        let mut parent_index = None;
        let mut adopted = 0..0;
        let mut fusible: Vec<usize> = Vec::new();

        if right_index + 1 == left_index {
            // An empty child at the same position as an empty `action`
            // looks disjoint to both probes. Re-include it as the parent so
            // the equal ranges collapse via merge.
            left_index -= 1;
            right_index += 1;
            parent_index = Some(left_index);
        } else if right_index > left_index {
            let first = &children[left_index];
            let last = &children[right_index - 1];
            if right_index - left_index == 1
                && first.range.begin() <= r.begin()
                && last.range.end() >= r.end()
            {
                // A single child with the same range as `action` or
                // containing it: recurse into that child.
                parent_index = Some(left_index);
            } else {
                // The children in the middle belong under `action`, except
                // the two extremes when they straddle its boundary.
                let mut lo = left_index;
                let mut hi = right_index;
                if first.range.begin() < r.begin() {
                    fusible.push(lo);
                    lo += 1;
                }
                if hi > lo && last.range.end() > r.end() {
                    hi -= 1;
                    fusible.push(hi);
                }
                adopted = lo..hi;
            }
        }

        if !fusible.is_empty() {
            return self.fuse(action, &fusible, enforcer);
        }

        let placed = if let Some(index) = parent_index {
            children[index].combine(action, enforcer)?
        } else if !adopted.is_empty() {
            // `action` becomes the parent of the children it contains, then
            // re-combines its own children over them.
            let Action {
                range,
                insert_before,
                replacement,
                insert_after,
                children: own_children,
            } = action;
            let node = Action {
                range,
                insert_before,
                replacement,
                insert_after,
                children: Vec::new(),
            };
            let node = node.adopt(children[adopted.clone()].to_vec(), enforcer)?;
            node.combine_children(own_children, enforcer)?
        } else {
            action
        };

        let mut next = Vec::with_capacity(left_index + 1 + (children.len() - right_index));
        next.extend_from_slice(&children[..left_index]);
        next.push(placed);
        next.extend_from_slice(&children[right_index..]);
        self.clone_shell().adopt(next, enforcer)
    }

    /// Crossing edits collapse into a single action spanning the join of
    /// all the crossing ranges. Contained children are kept and re-combined
    /// so any insertions among them still reach the swallow check.
    fn fuse(
        &self,
        action: Action,
        fusible: &[usize],
        enforcer: &Enforcer,
    ) -> Result<Action, RewriteError> {
        for &index in fusible {
            let child = &self.children[index];
            let conflict = if action.has_insertions() || child.has_insertions() {
                Conflict::CrossingInsertions {
                    range: action.range,
                    conflict: child.range,
                }
            } else {
                Conflict::CrossingDeletions {
                    range: action.range,
                    conflict: child.range,
                }
            };
            enforcer.check(conflict)?;
        }

        let mut fused = action;
        for &index in fusible {
            fused.range = fused.range.join(self.children[index].range);
        }

        let kept: Vec<Action> = self
            .children
            .iter()
            .enumerate()
            .filter(|(index, _)| !fusible.contains(index))
            .map(|(_, child)| child.clone())
            .collect();

        self.clone_shell().adopt(kept, enforcer)?.combine(fused, enforcer)
    }

    /// Fold `more` into this node one child at a time.
    fn combine_children(
        self,
        more: Vec<Action>,
        enforcer: &Enforcer,
    ) -> Result<Action, RewriteError> {
        more.into_iter()
            .try_fold(self, |parent, child| parent.combine(child, enforcer))
    }

    /// Attach `children`, discarding them (after the swallow check) when
    /// this node replaces its whole range.
    fn adopt(mut self, children: Vec<Action>, enforcer: &Enforcer) -> Result<Action, RewriteError> {
        self.children = if self.replacement.is_some() {
            Self::swallow(children, self.range, enforcer)?
        } else {
            children
        };
        Ok(self)
    }

    /// A replacement covers the whole range, so child edits are dropped.
    /// Children that insert text are reported to the enforcer first; pure
    /// deletions vanish silently.
    fn swallow(
        children: Vec<Action>,
        range: Range,
        enforcer: &Enforcer,
    ) -> Result<Vec<Action>, RewriteError> {
        let insertions: Vec<Range> = children
            .iter()
            .filter(|child| child.has_insertions())
            .map(|child| child.range)
            .collect();
        if !insertions.is_empty() {
            enforcer.check(Conflict::SwallowedInsertions {
                range,
                conflict: insertions,
            })?;
        }
        Ok(Vec::new())
    }

    fn clone_shell(&self) -> Action {
        Action {
            range: self.range,
            insert_before: self.insert_before.clone(),
            replacement: self.replacement.clone(),
            insert_after: self.insert_after.clone(),
            children: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        for pair in self.children.windows(2) {
            assert!(
                pair[0].range.begin() <= pair[1].range.begin(),
                "siblings out of order: {} before {}",
                pair[0].range,
                pair[1].range
            );
            assert!(
                pair[0].range.disjoint(pair[1].range),
                "siblings overlap: {} and {}",
                pair[0].range,
                pair[1].range
            );
        }
        for child in &self.children {
            assert!(
                self.range.contains(child.range),
                "child {} not contained in {}",
                child.range,
                self.range
            );
            child.check_invariants();
        }
        if self.replacement.is_some() {
            assert!(
                self.children.is_empty(),
                "replacement node {} still has children",
                self.range
            );
        }
    }
}
