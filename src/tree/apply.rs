//! Splicing of flattened replacements into the output text.

use crate::range::Range;

/// Apply ordered `(range, text)` splices to `source`.
///
/// The ranges are monotonic in `begin` by construction (flattening emits
/// them in source order), so a single forward pass suffices. Pure
/// insertions have empty ranges and do not consume source text.
pub(crate) fn splice(source: &str, replacements: &[(Range, &str)]) -> String {
    let mut output = String::with_capacity(source.len());
    let mut cursor = 0;
    for (range, text) in replacements {
        output.push_str(&source[cursor..range.begin()]);
        output.push_str(text);
        cursor = range.end();
    }
    output.push_str(&source[cursor..]);
    output
}
