//! Repository facade tying the object database and reference index together.
//!
//! A `Repository` is a self-contained, read-only session over one metadata
//! directory. Filesystem state is captured at open: external writes to the
//! repository are not observed until a new `Repository` is opened.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bstr::BString;
use gitscope_hash::ObjectId;
use gitscope_object::{Object, ObjectType};
use gitscope_odb::{CommitObjects, ObjectDatabase, OdbError};
use gitscope_ref::{RefError, RefIndex};

/// Errors produced while opening a repository.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not a repository: {0}")]
    NotARepository(PathBuf),

    #[error(transparent)]
    Odb(#[from] OdbError),

    #[error(transparent)]
    Ref(#[from] RefError),
}

/// A read-only session over one repository metadata directory.
pub struct Repository {
    git_dir: PathBuf,
    odb: ObjectDatabase,
    refs: RefIndex,
}

impl Repository {
    /// Open a repository.
    ///
    /// `path` may be the metadata directory itself (a bare repository or a
    /// `.git` directory) or a working tree root containing `.git`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let path = path.as_ref();
        let git_dir = if path.join("objects").is_dir() {
            path.to_path_buf()
        } else if path.join(".git").join("objects").is_dir() {
            path.join(".git")
        } else {
            return Err(RepoError::NotARepository(path.to_path_buf()));
        };

        let odb = ObjectDatabase::open(git_dir.join("objects"))?;
        let refs = RefIndex::load(&git_dir)?;

        Ok(Self { git_dir, odb, refs })
    }

    /// Path to the metadata directory.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// The object database.
    pub fn odb(&self) -> &ObjectDatabase {
        &self.odb
    }

    /// The reference index.
    pub fn refs(&self) -> &RefIndex {
        &self.refs
    }

    /// Branch name → commit id map.
    pub fn branches(&self) -> &BTreeMap<BString, ObjectId> {
        &self.refs.branches
    }

    /// Tag name → id map (ids may be commits or annotated tags).
    pub fn tags(&self) -> &BTreeMap<BString, ObjectId> {
        &self.refs.tags
    }

    /// Read and decode an object.
    pub fn read(&self, id: &ObjectId) -> Result<Object, OdbError> {
        self.odb.read(id)
    }

    /// Answer an object's type without materializing its payload.
    pub fn probe_type(&self, id: &ObjectId) -> Result<ObjectType, OdbError> {
        self.odb.probe_type(id)
    }

    /// Enumerate every commit object in the repository.
    pub fn commit_objects(&self) -> CommitObjects<'_> {
        self.odb.commit_objects()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstr::BStr;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::fs;
    use std::io::Write;

    fn oid(n: u8) -> ObjectId {
        ObjectId::from_hex(&format!("{:040x}", n)).unwrap()
    }

    fn write_loose(git_dir: &Path, id: &ObjectId, obj_type: &str, payload: &[u8]) {
        let mut raw = Vec::new();
        raw.extend_from_slice(obj_type.as_bytes());
        raw.push(b' ');
        raw.extend_from_slice(payload.len().to_string().as_bytes());
        raw.push(0);
        raw.extend_from_slice(payload);

        let mut compressed = Vec::new();
        let mut encoder = ZlibEncoder::new(&mut compressed, Compression::default());
        encoder.write_all(&raw).unwrap();
        encoder.finish().unwrap();

        let path = git_dir.join("objects").join(id.loose_path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, compressed).unwrap();
    }

    fn init_git_dir(git_dir: &Path) {
        fs::create_dir_all(git_dir.join("objects")).unwrap();
        fs::create_dir_all(git_dir.join("refs/heads")).unwrap();
    }

    #[test]
    fn open_metadata_dir_directly() {
        let dir = tempfile::tempdir().unwrap();
        init_git_dir(dir.path());
        write_loose(dir.path(), &oid(1), "blob", b"hello");
        fs::write(
            dir.path().join("refs/heads/main"),
            format!("{}\n", oid(1)),
        )
        .unwrap();

        let repo = Repository::open(dir.path()).unwrap();
        assert_eq!(repo.git_dir(), dir.path());
        assert_eq!(repo.branches().get(BStr::new("main")), Some(&oid(1)));
        assert_eq!(
            repo.read(&oid(1)).unwrap().as_blob().unwrap().data,
            b"hello"
        );
        assert_eq!(repo.probe_type(&oid(1)).unwrap(), ObjectType::Blob);
    }

    #[test]
    fn open_worktree_root() {
        let dir = tempfile::tempdir().unwrap();
        let git_dir = dir.path().join(".git");
        init_git_dir(&git_dir);

        let repo = Repository::open(dir.path()).unwrap();
        assert_eq!(repo.git_dir(), git_dir);
    }

    #[test]
    fn open_non_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Repository::open(dir.path()),
            Err(RepoError::NotARepository(_))
        ));
    }

    #[test]
    fn commit_objects_through_facade() {
        let dir = tempfile::tempdir().unwrap();
        init_git_dir(dir.path());
        let commit = format!(
            "tree {:040x}\nauthor A <a@b.c> 7 +0000\n\nmsg\n",
            0x10
        );
        write_loose(dir.path(), &oid(1), "commit", commit.as_bytes());
        write_loose(dir.path(), &oid(2), "blob", b"data");

        let repo = Repository::open(dir.path()).unwrap();
        let commits: Vec<_> = repo.commit_objects().map(|r| r.unwrap()).collect();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].id, oid(1));
    }
}
