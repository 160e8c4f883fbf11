//! Object identity for the gitscope repository reader.
//!
//! This crate provides the core `ObjectId` type — a 20-byte content digest —
//! together with hex encoding/decoding.

pub mod hex;
mod oid;

pub use oid::ObjectId;

/// Errors produced by id and hex operations.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("invalid hex character at position {position}: '{character}'")]
    InvalidHex { position: usize, character: char },

    #[error("invalid hex length: expected {expected}, got {actual}")]
    InvalidHexLength { expected: usize, actual: usize },

    #[error("invalid id length: expected {expected} bytes, got {actual}")]
    InvalidIdLength { expected: usize, actual: usize },
}
