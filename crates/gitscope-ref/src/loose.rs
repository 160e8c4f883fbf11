//! Loose ref loading.
//!
//! Walks `refs/heads/`, `refs/remotes/`, and `refs/tags/`; each file's path
//! relative to its category directory (separators normalized to `/`) is the
//! ref name, and its first line is the hex id. Symbolic refs, empty files,
//! and anything that is not a 40-hex id are skipped. Files literally named
//! `HEAD` under `refs/remotes/` are remote-HEAD pointers, not branches.

use std::fs;
use std::path::{Path, PathBuf};

use bstr::{BString, ByteSlice};
use gitscope_hash::ObjectId;

use crate::{RefError, RefIndex};

pub(crate) fn load_into(git_dir: &Path, index: &mut RefIndex) -> Result<(), RefError> {
    let refs_dir = git_dir.join("refs");

    for file in collect_files(&refs_dir.join("heads"))? {
        if let Some((name, id)) = read_ref_file(&refs_dir.join("heads"), &file) {
            index.branches.insert(name, id);
        }
    }

    for file in collect_files(&refs_dir.join("remotes"))? {
        if file.file_name().is_some_and(|n| n == "HEAD") {
            continue;
        }
        if let Some((name, id)) = read_ref_file(&refs_dir.join("remotes"), &file) {
            index.branches.insert(name, id);
        }
    }

    for file in collect_files(&refs_dir.join("tags"))? {
        if let Some((name, id)) = read_ref_file(&refs_dir.join("tags"), &file) {
            index.tags.insert(name, id);
        }
    }

    Ok(())
}

/// Recursively collect regular files under `dir`, sorted for determinism.
fn collect_files(dir: &Path) -> Result<Vec<PathBuf>, RefError> {
    let mut files = Vec::new();
    if dir.is_dir() {
        walk(dir, &mut files)?;
        files.sort();
    }
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), RefError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            walk(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

/// Read one loose ref file; `None` for anything that is not a direct ref.
///
/// The name keeps the file name's raw bytes — ref names are not required to
/// be UTF-8.
fn read_ref_file(base: &Path, file: &Path) -> Option<(BString, ObjectId)> {
    let contents = fs::read(file).ok()?;
    let hex = std::str::from_utf8(contents.trim()).ok()?;
    let id = ObjectId::from_hex(hex).ok()?;

    let rel = file.strip_prefix(base).ok()?;
    let mut name = BString::from(Vec::new());
    for component in rel.components() {
        if !name.is_empty() {
            name.push(b'/');
        }
        name.extend_from_slice(component.as_os_str().as_encoded_bytes());
    }
    Some((name, id))
}
