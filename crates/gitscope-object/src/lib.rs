//! Object model for the gitscope repository reader.
//!
//! Rust types for git's four stored object kinds and their parsing from raw
//! decompressed bytes. The two transport kinds that appear inside packfiles
//! (offset-delta and reference-delta) are resolved by the object database and
//! never surface here.

mod blob;
mod commit;
pub mod header;
mod ident;
mod tag;
mod tree;

pub use blob::Blob;
pub use commit::Commit;
pub use tag::Tag;
pub use tree::{Tree, TreeEntry, TREE_MODE};

use bstr::BString;
use gitscope_hash::{HashError, ObjectId};

/// Errors produced by object parsing.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    #[error("invalid object type: {0}")]
    InvalidType(BString),

    #[error("invalid object header: {0}")]
    InvalidHeader(String),

    #[error("truncated object: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("invalid tree entry at offset {offset}: {reason}")]
    InvalidTreeEntry { offset: usize, reason: String },

    #[error("invalid commit {id}: missing '{field}' header")]
    MissingCommitField { id: ObjectId, field: &'static str },

    #[error("invalid tag {id}: missing '{field}' header")]
    MissingTagField { id: ObjectId, field: &'static str },

    #[error(transparent)]
    Hash(#[from] HashError),
}

/// The four stored object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Commit,
    Tree,
    Blob,
    Tag,
}

impl ObjectType {
    /// Parse from the type word in loose object headers.
    pub fn from_bytes(s: &[u8]) -> Result<Self, ObjectError> {
        match s {
            b"commit" => Ok(Self::Commit),
            b"tree" => Ok(Self::Tree),
            b"blob" => Ok(Self::Blob),
            b"tag" => Ok(Self::Tag),
            _ => Err(ObjectError::InvalidType(BString::from(s))),
        }
    }

    /// The canonical byte representation.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            Self::Commit => b"commit",
            Self::Tree => b"tree",
            Self::Blob => b"blob",
            Self::Tag => b"tag",
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Commit => "commit",
            Self::Tree => "tree",
            Self::Blob => "blob",
            Self::Tag => "tag",
        })
    }
}

impl std::str::FromStr for ObjectType {
    type Err = ObjectError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes())
    }
}

/// A decoded git object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Commit(Commit),
    Tree(Tree),
    Blob(Blob),
    Tag(Tag),
}

impl Object {
    /// Parse from content bytes with known type (no loose header).
    pub fn parse_content(
        obj_type: ObjectType,
        id: ObjectId,
        content: &[u8],
    ) -> Result<Self, ObjectError> {
        match obj_type {
            ObjectType::Commit => Ok(Self::Commit(Commit::parse(id, content)?)),
            ObjectType::Tree => Ok(Self::Tree(Tree::parse(id, content)?)),
            ObjectType::Blob => Ok(Self::Blob(Blob::new(id, content.to_vec()))),
            ObjectType::Tag => Ok(Self::Tag(Tag::parse(id, content)?)),
        }
    }

    /// Get the object type.
    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Commit(_) => ObjectType::Commit,
            Self::Tree(_) => ObjectType::Tree,
            Self::Blob(_) => ObjectType::Blob,
            Self::Tag(_) => ObjectType::Tag,
        }
    }

    /// Get the object id.
    pub fn id(&self) -> ObjectId {
        match self {
            Self::Commit(c) => c.id,
            Self::Tree(t) => t.id,
            Self::Blob(b) => b.id,
            Self::Tag(t) => t.id,
        }
    }

    /// Borrow as a commit, if this is one.
    pub fn as_commit(&self) -> Option<&Commit> {
        match self {
            Self::Commit(c) => Some(c),
            _ => None,
        }
    }

    /// Borrow as a tree, if this is one.
    pub fn as_tree(&self) -> Option<&Tree> {
        match self {
            Self::Tree(t) => Some(t),
            _ => None,
        }
    }

    /// Borrow as a blob, if this is one.
    pub fn as_blob(&self) -> Option<&Blob> {
        match self {
            Self::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Borrow as an annotated tag, if this is one.
    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Self::Tag(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_type_from_bytes() {
        assert_eq!(ObjectType::from_bytes(b"blob").unwrap(), ObjectType::Blob);
        assert_eq!(ObjectType::from_bytes(b"tree").unwrap(), ObjectType::Tree);
        assert_eq!(ObjectType::from_bytes(b"commit").unwrap(), ObjectType::Commit);
        assert_eq!(ObjectType::from_bytes(b"tag").unwrap(), ObjectType::Tag);
        assert!(ObjectType::from_bytes(b"unknown").is_err());
    }

    #[test]
    fn object_type_display() {
        assert_eq!(ObjectType::Blob.to_string(), "blob");
        assert_eq!(ObjectType::Commit.to_string(), "commit");
    }

    #[test]
    fn object_type_from_str() {
        assert_eq!("tree".parse::<ObjectType>().unwrap(), ObjectType::Tree);
        assert!("invalid".parse::<ObjectType>().is_err());
    }

    #[test]
    fn parse_content_dispatch() {
        let id = ObjectId::NULL;
        let obj = Object::parse_content(ObjectType::Blob, id, b"payload").unwrap();
        assert_eq!(obj.object_type(), ObjectType::Blob);
        assert_eq!(obj.as_blob().unwrap().data, b"payload");
        assert!(obj.as_commit().is_none());
    }
}
