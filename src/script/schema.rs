//! Rewrite script schema.
//!
//! A script is a TOML document: metadata, conflict policies, and an
//! ordered list of edit definitions. Each definition selects a range of
//! the buffer (explicitly or by unique text search) and applies one of the
//! five edit operations to it.

use crate::tree::enforcer::PolicySet;
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RewriteScript {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub policy: PolicySet,
    #[serde(default)]
    pub edits: Vec<EditDefinition>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EditDefinition {
    pub id: String,
    pub select: Selector,
    pub op: EditOp,
}

/// How an edit definition locates its target range.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Selector {
    /// Explicit byte offsets.
    Range { begin: usize, end: usize },
    /// The unique occurrence of `search` in the buffer.
    Text { search: String },
}

/// The edit applied at the selected range.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EditOp {
    InsertBefore { text: String },
    InsertAfter { text: String },
    Replace { text: String },
    Remove,
    Wrap { before: String, after: String },
}

impl RewriteScript {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.edits.is_empty() {
            issues.push(ValidationIssue::EmptyEditList);
        }

        for edit in &self.edits {
            if edit.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    edit_id: None,
                    field: "id",
                });
            }

            match &edit.select {
                Selector::Range { begin, end } => {
                    if begin > end {
                        issues.push(ValidationIssue::InvalidRange {
                            edit_id: edit.id.clone(),
                            begin: *begin,
                            end: *end,
                        });
                    }
                }
                Selector::Text { search } => {
                    if search.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            edit_id: Some(edit.id.clone()),
                            field: "select.search",
                        });
                    }
                }
            }

            match &edit.op {
                EditOp::InsertBefore { text } | EditOp::InsertAfter { text } => {
                    if text.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            edit_id: Some(edit.id.clone()),
                            field: "op.text",
                        });
                    }
                }
                EditOp::Wrap { before, after } => {
                    if before.is_empty() && after.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            edit_id: Some(edit.id.clone()),
                            field: "op.before/op.after",
                        });
                    }
                }
                // an empty replacement is a deletion, so nothing to check
                EditOp::Replace { .. } | EditOp::Remove => {}
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyEditList,
    MissingField {
        edit_id: Option<String>,
        field: &'static str,
    },
    InvalidRange {
        edit_id: String,
        begin: usize,
        end: usize,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyEditList => write!(f, "script contains no edits"),
            ValidationIssue::MissingField { edit_id, field } => match edit_id {
                Some(id) => write!(f, "edit '{id}': missing or empty field '{field}'"),
                None => write!(f, "missing or empty field '{field}'"),
            },
            ValidationIssue::InvalidRange {
                edit_id,
                begin,
                end,
            } => {
                write!(f, "edit '{edit_id}': range begin {begin} is after end {end}")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid rewrite script:")?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
