//! Tree-to-tree and commit-to-commit comparison.

use std::collections::BTreeMap;

use bstr::BString;
use gitscope_hash::ObjectId;
use gitscope_object::{Commit, Tree};
use gitscope_odb::ObjectDatabase;

use crate::{ChangeKind, DiffError, DiffRecord};

/// Compare two trees, producing records sorted by full path.
///
/// Either side may be absent; an absent side contributes no entries, so
/// `(None, T)` yields only additions and `(T, None)` only removals.
pub fn diff_trees(
    odb: &ObjectDatabase,
    old_tree: Option<&ObjectId>,
    new_tree: Option<&ObjectId>,
) -> Result<Vec<DiffRecord>, DiffError> {
    let mut records = Vec::new();
    diff_level(odb, old_tree, new_tree, &BString::from(""), &mut records)?;
    records.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(records)
}

/// Compare the root trees of two commits.
///
/// Every record is attributed to the new commit. Either side may be absent.
pub fn diff_commits(
    odb: &ObjectDatabase,
    old_commit: Option<&ObjectId>,
    new_commit: Option<&ObjectId>,
) -> Result<Vec<DiffRecord>, DiffError> {
    let old_tree = match old_commit {
        Some(id) => Some(read_commit(odb, id)?.tree),
        None => None,
    };
    let new_tree = match new_commit {
        Some(id) => Some(read_commit(odb, id)?.tree),
        None => None,
    };

    let mut records = diff_trees(odb, old_tree.as_ref(), new_tree.as_ref())?;
    for record in &mut records {
        record.commit = new_commit.copied();
    }
    Ok(records)
}

/// Compare a commit against its first parent (or the empty tree for roots).
pub fn diff_commit_with_parent(
    odb: &ObjectDatabase,
    commit_id: &ObjectId,
) -> Result<Vec<DiffRecord>, DiffError> {
    let commit = read_commit(odb, commit_id)?;
    let old_tree = match commit.parent {
        Some(parent_id) => Some(read_commit(odb, &parent_id)?.tree),
        None => None,
    };

    let mut records = diff_trees(odb, old_tree.as_ref(), Some(&commit.tree))?;
    for record in &mut records {
        record.commit = Some(*commit_id);
    }
    Ok(records)
}

/// Diff one directory level, partitioning entries into files and subtrees.
fn diff_level(
    odb: &ObjectDatabase,
    old_tree: Option<&ObjectId>,
    new_tree: Option<&ObjectId>,
    prefix: &BString,
    records: &mut Vec<DiffRecord>,
) -> Result<(), DiffError> {
    let (old_files, old_dirs) = partition(odb, old_tree)?;
    let (new_files, new_dirs) = partition(odb, new_tree)?;

    for (name, new_id) in &new_files {
        match old_files.get(name) {
            Some(old_id) if old_id == new_id => {}
            Some(old_id) => records.push(DiffRecord {
                commit: None,
                path: join(prefix, name),
                change: ChangeKind::Modified,
                old_id: Some(*old_id),
                new_id: Some(*new_id),
            }),
            None => records.push(DiffRecord {
                commit: None,
                path: join(prefix, name),
                change: ChangeKind::Added,
                old_id: None,
                new_id: Some(*new_id),
            }),
        }
    }
    for (name, old_id) in &old_files {
        if !new_files.contains_key(name) {
            records.push(DiffRecord {
                commit: None,
                path: join(prefix, name),
                change: ChangeKind::Removed,
                old_id: Some(*old_id),
                new_id: None,
            });
        }
    }

    for (name, old_id) in &old_dirs {
        let sub_prefix = join_dir(prefix, name);
        match new_dirs.get(name) {
            Some(new_id) if old_id == new_id => {}
            Some(new_id) => {
                diff_level(odb, Some(old_id), Some(new_id), &sub_prefix, records)?
            }
            None => diff_level(odb, Some(old_id), None, &sub_prefix, records)?,
        }
    }
    for (name, new_id) in &new_dirs {
        if !old_dirs.contains_key(name) {
            let sub_prefix = join_dir(prefix, name);
            diff_level(odb, None, Some(new_id), &sub_prefix, records)?;
        }
    }

    Ok(())
}

type NameMap = BTreeMap<BString, ObjectId>;

/// Split a tree's entries into (files, subtrees) by mode.
fn partition(
    odb: &ObjectDatabase,
    tree_id: Option<&ObjectId>,
) -> Result<(NameMap, NameMap), DiffError> {
    let mut files = NameMap::new();
    let mut dirs = NameMap::new();

    if let Some(id) = tree_id {
        let tree = read_tree(odb, id)?;
        for entry in tree.iter() {
            if entry.is_dir() {
                dirs.insert(entry.name.clone(), entry.id);
            } else {
                files.insert(entry.name.clone(), entry.id);
            }
        }
    }
    Ok((files, dirs))
}

fn join(prefix: &BString, name: &BString) -> BString {
    let mut path = prefix.clone();
    path.extend_from_slice(name);
    path
}

fn join_dir(prefix: &BString, name: &BString) -> BString {
    let mut path = join(prefix, name);
    path.push(b'/');
    path
}

fn read_tree(odb: &ObjectDatabase, id: &ObjectId) -> Result<Tree, DiffError> {
    let obj = odb.read(id)?;
    match obj {
        gitscope_object::Object::Tree(tree) => Ok(tree),
        other => Err(DiffError::UnexpectedType {
            id: *id,
            expected: "tree",
            actual: other.object_type().to_string(),
        }),
    }
}

pub(crate) fn read_commit(odb: &ObjectDatabase, id: &ObjectId) -> Result<Commit, DiffError> {
    let obj = odb.read(id)?;
    match obj {
        gitscope_object::Object::Commit(commit) => Ok(commit),
        other => Err(DiffError::UnexpectedType {
            id: *id,
            expected: "commit",
            actual: other.object_type().to_string(),
        }),
    }
}
