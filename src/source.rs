use crate::range::Range;
use std::fs;
use std::path::Path;

/// An immutable piece of source text with a display name.
///
/// The buffer is opaque to the rewriting engine: it only exposes the text
/// and the full addressable range. The content must not change while a
/// rewriter holds a reference to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBuffer {
    name: String,
    source: String,
}

impl SourceBuffer {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Read a buffer from disk, using the path as its name.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        Ok(Self::new(path.display().to_string(), source))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The range covering the whole buffer.
    pub fn full_range(&self) -> Range {
        Range::new(0, self.source.len())
    }

    /// The text at `range`, if it is in bounds and on character boundaries.
    pub fn slice(&self, range: Range) -> Option<&str> {
        self.source.get(range.begin()..range.end())
    }
}
