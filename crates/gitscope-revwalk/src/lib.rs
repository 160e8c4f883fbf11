//! Linear history walking and per-file history.
//!
//! The walk is strictly first-parent: merge parents are captured on each
//! commit but never traversed, so a branch reads as a single line of
//! descent. Both walks return plain vectors — restart by calling again.

use std::collections::HashSet;

use bstr::{BString, ByteSlice};
use gitscope_diff::{ChangeKind, DiffRecord};
use gitscope_hash::ObjectId;
use gitscope_object::{Commit, Object, ObjectType};
use gitscope_odb::OdbError;
use gitscope_repo::Repository;

/// Upper bound on tag-of-tag chains when peeling a ref to its commit.
const MAX_PEEL_DEPTH: usize = 10;

/// Errors produced by history walks.
#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    #[error("object {id} is a {actual}, expected a commit")]
    NotACommit { id: ObjectId, actual: String },

    #[error(transparent)]
    Odb(#[from] OdbError),
}

/// List the linear first-parent history of a branch or tag.
///
/// `name` resolves against branches first, then tags; an unknown name yields
/// an empty list. A name pointing at an annotated tag is peeled to its
/// commit. With `base`, that name's own linear history forms a stop-set: the
/// walk ends just before entering it, so `list_commits(b, Some(b))` is
/// empty. Each returned commit carries its walk position in `seq`.
pub fn list_commits(
    repo: &Repository,
    name: &str,
    base: Option<&str>,
) -> Result<Vec<Commit>, WalkError> {
    let Some(tip) = resolve_tip(repo, name)? else {
        return Ok(Vec::new());
    };

    let mut stop = HashSet::new();
    if let Some(base_name) = base {
        for commit in list_commits(repo, base_name, None)? {
            stop.insert(commit.id);
        }
    }

    let mut commits = Vec::new();
    let mut current = Some(tip);
    while let Some(id) = current {
        if stop.contains(&id) || !repo.odb().contains(&id) {
            break;
        }
        let commit = read_commit(repo, &id)?;
        current = commit.parent;
        commits.push(commit);
    }

    for (seq, commit) in commits.iter_mut().enumerate() {
        commit.seq = seq;
    }
    Ok(commits)
}

/// List the revisions of one file along a commit's linear history.
///
/// Walks first parents from `tip`, resolving `path` inside each commit's
/// tree, and stops at the first commit where the path is absent. Consecutive
/// commits sharing one file id collapse into a single revision keyed by the
/// oldest commit of the run. Adjacent revisions become modify records
/// (newest first); the oldest revision becomes the add record. Empty when
/// the path is absent at the tip.
pub fn file_history(
    repo: &Repository,
    tip: &ObjectId,
    path: &str,
) -> Result<Vec<DiffRecord>, WalkError> {
    let mut revisions: Vec<(Commit, ObjectId)> = Vec::new();
    let mut current = Some(*tip);

    while let Some(id) = current {
        if !repo.odb().contains(&id) {
            break;
        }
        let commit = read_commit(repo, &id)?;
        let Some(file_id) = resolve_path(repo, &commit.tree, path)? else {
            break;
        };
        current = commit.parent;

        match revisions.last_mut() {
            // Same file id as the newer run: this older commit becomes the
            // run's representative.
            Some(last) if last.1 == file_id => last.0 = commit,
            _ => revisions.push((commit, file_id)),
        }
    }

    let Some((oldest, oldest_file)) = revisions.last() else {
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for pair in revisions.windows(2) {
        records.push(DiffRecord {
            commit: Some(pair[0].0.id),
            path: BString::from(path),
            change: ChangeKind::Modified,
            old_id: Some(pair[1].1),
            new_id: Some(pair[0].1),
        });
    }
    records.push(DiffRecord {
        commit: Some(oldest.id),
        path: BString::from(path),
        change: ChangeKind::Added,
        old_id: None,
        new_id: Some(*oldest_file),
    });
    Ok(records)
}

/// Resolve a slash-separated path inside a tree to the entry's object id.
pub fn resolve_path(
    repo: &Repository,
    root_tree: &ObjectId,
    path: &str,
) -> Result<Option<ObjectId>, WalkError> {
    let mut id = *root_tree;
    for component in path.split('/') {
        if !repo.odb().contains(&id) {
            return Ok(None);
        }
        let obj = repo.read(&id)?;
        let Some(tree) = obj.as_tree() else {
            return Ok(None);
        };
        match tree.find(component.as_bytes().as_bstr()) {
            Some(entry) => id = entry.id,
            None => return Ok(None),
        }
    }
    Ok(Some(id))
}

/// Resolve a branch/tag name to a commit id, peeling annotated tags.
fn resolve_tip(repo: &Repository, name: &str) -> Result<Option<ObjectId>, WalkError> {
    let Some(mut id) = repo.refs().resolve(name) else {
        return Ok(None);
    };

    for _ in 0..MAX_PEEL_DEPTH {
        if !repo.odb().contains(&id) {
            // Let the walk report nothing for a dangling ref.
            return Ok(Some(id));
        }
        match repo.probe_type(&id)? {
            ObjectType::Commit => return Ok(Some(id)),
            ObjectType::Tag => {
                let obj = repo.read(&id)?;
                match obj {
                    Object::Tag(tag) => id = tag.target,
                    _ => return Ok(None),
                }
            }
            // A ref naming a tree or blob has no history.
            _ => return Ok(None),
        }
    }
    Ok(None)
}

fn read_commit(repo: &Repository, id: &ObjectId) -> Result<Commit, WalkError> {
    match repo.read(id)? {
        Object::Commit(commit) => Ok(commit),
        other => Err(WalkError::NotACommit {
            id: *id,
            actual: other.object_type().to_string(),
        }),
    }
}
