//! Tree and commit comparison at file granularity.
//!
//! Diffs here are structural: two trees are compared entry by entry,
//! recursing into subtrees, and every difference becomes one record naming
//! the file path, the change kind, and the blob ids on each side. No text
//! diffing happens at this layer — consumers fetch the blobs themselves when
//! they want content.

mod tree;

pub use tree::{diff_commit_with_parent, diff_commits, diff_trees};

use std::fmt;

use bstr::BString;
use gitscope_hash::ObjectId;
use gitscope_odb::OdbError;

/// Errors produced by diff operations.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    #[error("object {id} is a {actual}, expected {expected}")]
    UnexpectedType {
        id: ObjectId,
        expected: &'static str,
        actual: String,
    },

    #[error(transparent)]
    Odb(#[from] OdbError),
}

/// How a file changed between two trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Added => "+",
            Self::Removed => "-",
            Self::Modified => "*",
        })
    }
}

/// One file-level change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRecord {
    /// The commit this change is attributed to, when comparing commits.
    pub commit: Option<ObjectId>,
    /// Slash-separated path from the tree root.
    pub path: BString,
    pub change: ChangeKind,
    /// Blob id on the old side (absent for additions).
    pub old_id: Option<ObjectId>,
    /// Blob id on the new side (absent for removals).
    pub new_id: Option<ObjectId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_kind_renders_as_method_glyph() {
        assert_eq!(ChangeKind::Added.to_string(), "+");
        assert_eq!(ChangeKind::Removed.to_string(), "-");
        assert_eq!(ChangeKind::Modified.to_string(), "*");
    }
}
