//! Reference index for the gitscope repository reader.
//!
//! Produces two name → id maps: *branches* (local heads plus remote heads
//! under their remote prefix) and *tags*. Packed refs are read first from
//! `packed-refs`, then loose ref files under `refs/heads/`, `refs/remotes/`,
//! and `refs/tags/` overlay them, so a loose ref always wins over a packed
//! ref of the same name.
//!
//! Ref names are byte strings: git does not require them to be UTF-8, so the
//! maps are keyed by `BString` rather than `String`.
//!
//! A tag value may point at a commit directly or at an annotated tag object;
//! the reference index does not peel — that is the history walker's job.

mod loose;
mod packed;

use std::collections::BTreeMap;
use std::path::Path;

use bstr::{BStr, BString};
use gitscope_hash::{HashError, ObjectId};

/// Errors produced while loading references.
#[derive(Debug, thiserror::Error)]
pub enum RefError {
    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Branch and tag name → id maps for one repository.
#[derive(Debug, Clone, Default)]
pub struct RefIndex {
    /// Local branches by short name, remote branches as `<remote>/<branch>`.
    pub branches: BTreeMap<BString, ObjectId>,
    /// Tags by short name. Values may be commit ids or annotated tag ids.
    pub tags: BTreeMap<BString, ObjectId>,
}

impl RefIndex {
    /// Load references from a repository metadata directory.
    pub fn load(git_dir: impl AsRef<Path>) -> Result<Self, RefError> {
        let git_dir = git_dir.as_ref();
        let mut index = Self::default();

        let packed_path = git_dir.join("packed-refs");
        if packed_path.is_file() {
            let data = std::fs::read(&packed_path)?;
            packed::parse_into(&data, &mut index);
        }

        loose::load_into(git_dir, &mut index)?;
        Ok(index)
    }

    /// Resolve a name, consulting branches first, then tags.
    pub fn resolve(&self, name: &str) -> Option<ObjectId> {
        let key = BStr::new(name);
        self.branches
            .get(key)
            .or_else(|| self.tags.get(key))
            .copied()
    }

    /// Install a ref path (`refs/heads/main`, `refs/tags/v1`, ...) into the
    /// matching map. Paths outside the three known categories are ignored.
    fn install(&mut self, ref_path: &[u8], id: ObjectId) {
        if let Some(name) = ref_path.strip_prefix(b"refs/heads/") {
            self.branches.insert(BString::from(name), id);
        } else if let Some(name) = ref_path.strip_prefix(b"refs/remotes/") {
            if !name.ends_with(b"/HEAD") {
                self.branches.insert(BString::from(name), id);
            }
        } else if let Some(name) = ref_path.strip_prefix(b"refs/tags/") {
            self.tags.insert(BString::from(name), id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn hex(n: u8) -> String {
        format!("{:040x}", n)
    }

    fn oid(n: u8) -> ObjectId {
        ObjectId::from_hex(&hex(n)).unwrap()
    }

    fn write_ref(git_dir: &Path, rel: &str, n: u8) {
        let path = git_dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, format!("{}\n", hex(n))).unwrap();
    }

    #[test]
    fn loads_packed_and_loose() {
        let dir = tempfile::tempdir().unwrap();
        let git_dir = dir.path();

        fs::write(
            git_dir.join("packed-refs"),
            format!(
                "# pack-refs with: peeled fully-peeled sorted \n\
                 {} refs/heads/main\n\
                 {} refs/remotes/origin/main\n\
                 {} refs/tags/v1.0\n\
                 ^{}\n",
                hex(1),
                hex(2),
                hex(3),
                hex(4),
            ),
        )
        .unwrap();
        write_ref(git_dir, "refs/heads/feature/fast", 5);
        write_ref(git_dir, "refs/tags/v2.0", 6);

        let index = RefIndex::load(git_dir).unwrap();
        assert_eq!(index.branches.get(BStr::new("main")), Some(&oid(1)));
        assert_eq!(index.branches.get(BStr::new("origin/main")), Some(&oid(2)));
        assert_eq!(index.branches.get(BStr::new("feature/fast")), Some(&oid(5)));
        assert_eq!(index.tags.get(BStr::new("v1.0")), Some(&oid(3)));
        assert_eq!(index.tags.get(BStr::new("v2.0")), Some(&oid(6)));
    }

    #[test]
    fn loose_overrides_packed() {
        let dir = tempfile::tempdir().unwrap();
        let git_dir = dir.path();

        fs::write(
            git_dir.join("packed-refs"),
            format!("{} refs/heads/main\n", hex(1)),
        )
        .unwrap();
        write_ref(git_dir, "refs/heads/main", 2);

        let index = RefIndex::load(git_dir).unwrap();
        assert_eq!(index.branches.get(BStr::new("main")), Some(&oid(2)));
    }

    #[test]
    fn loose_refs_load_without_packed_refs_file() {
        let dir = tempfile::tempdir().unwrap();
        let git_dir = dir.path();
        write_ref(git_dir, "refs/heads/main", 7);

        let index = RefIndex::load(git_dir).unwrap();
        assert_eq!(index.branches.get(BStr::new("main")), Some(&oid(7)));
    }

    #[test]
    fn remote_head_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let git_dir = dir.path();
        write_ref(git_dir, "refs/remotes/origin/main", 1);
        let head = git_dir.join("refs/remotes/origin/HEAD");
        fs::write(&head, "ref: refs/remotes/origin/main\n").unwrap();

        let index = RefIndex::load(git_dir).unwrap();
        assert_eq!(index.branches.get(BStr::new("origin/main")), Some(&oid(1)));
        assert!(index.branches.get(BStr::new("origin/HEAD")).is_none());
    }

    #[test]
    fn resolve_prefers_branches() {
        let dir = tempfile::tempdir().unwrap();
        let git_dir = dir.path();
        write_ref(git_dir, "refs/heads/v1", 1);
        write_ref(git_dir, "refs/tags/v1", 2);
        write_ref(git_dir, "refs/tags/only-tag", 3);

        let index = RefIndex::load(git_dir).unwrap();
        assert_eq!(index.resolve("v1"), Some(oid(1)));
        assert_eq!(index.resolve("only-tag"), Some(oid(3)));
        assert_eq!(index.resolve("absent"), None);
    }

    #[test]
    fn empty_repo_has_no_refs() {
        let dir = tempfile::tempdir().unwrap();
        let index = RefIndex::load(dir.path()).unwrap();
        assert!(index.branches.is_empty());
        assert!(index.tags.is_empty());
    }
}
