use std::fmt;

use bstr::{BString, ByteSlice};
use gitscope_hash::ObjectId;

use crate::ident::parse_ident;
use crate::ObjectError;

/// A decoded commit object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Object id of this commit.
    pub id: ObjectId,
    /// Id of the root tree.
    pub tree: ObjectId,
    /// First parent (None for root commits).
    pub parent: Option<ObjectId>,
    /// Second parent of a merge commit. Third and later parents are ignored.
    pub merge_parent: Option<ObjectId>,
    /// Author name.
    pub author: BString,
    /// Author timestamp, seconds since the epoch.
    pub author_time: i64,
    /// Committer name, when the committer line parsed.
    pub committer: Option<BString>,
    /// Committer timestamp, seconds since the epoch.
    pub committer_time: Option<i64>,
    /// GPG signature block, consumed through its END line.
    pub gpgsig: Option<BString>,
    /// Commit message, newlines preserved verbatim.
    pub message: BString,
    /// Position in a history walk; 0 until assigned by the walker.
    pub seq: usize,
}

impl Commit {
    /// Parse commit content from decompressed bytes (no loose header).
    ///
    /// Header lines run until the first blank line; the remainder is the
    /// message. Unrecognized header prefixes are skipped for forward
    /// compatibility.
    pub fn parse(id: ObjectId, content: &[u8]) -> Result<Self, ObjectError> {
        let mut tree: Option<ObjectId> = None;
        let mut parent: Option<ObjectId> = None;
        let mut merge_parent: Option<ObjectId> = None;
        let mut author: Option<(BString, i64)> = None;
        let mut committer: Option<(BString, i64)> = None;
        let mut gpgsig: Option<BString> = None;

        let data = content;
        let mut pos = 0;

        while pos < data.len() {
            // A blank line separates headers from the message.
            if data[pos] == b'\n' {
                pos += 1;
                break;
            }

            let line_end = data[pos..]
                .find_byte(b'\n')
                .map(|p| p + pos)
                .unwrap_or(data.len());
            let line = &data[pos..line_end];
            pos = line_end + 1;

            let Some(space_pos) = line.find_byte(b' ') else {
                continue;
            };
            let key = &line[..space_pos];
            let value = &line[space_pos + 1..];

            match key {
                b"tree" => {
                    tree = Some(parse_hex_field(id, "tree", value)?);
                }
                b"parent" => {
                    let pid = parse_hex_field(id, "parent", value)?;
                    if parent.is_none() {
                        parent = Some(pid);
                    } else if merge_parent.is_none() {
                        merge_parent = Some(pid);
                    }
                    // Octopus merges: third and later parents dropped.
                }
                b"author" => {
                    author = parse_ident(value);
                }
                b"committer" => {
                    committer = parse_ident(value);
                }
                b"gpgsig" => {
                    let mut sig = BString::from(value);
                    let mut done = sig.contains_str("END PGP SIGNATURE");
                    while !done && pos < data.len() {
                        let cont_end = data[pos..]
                            .find_byte(b'\n')
                            .map(|p| p + pos)
                            .unwrap_or(data.len());
                        let cont = data[pos..cont_end]
                            .strip_prefix(b" ")
                            .unwrap_or(&data[pos..cont_end]);
                        sig.push(b'\n');
                        sig.extend_from_slice(cont);
                        done = cont.contains_str("END PGP SIGNATURE");
                        pos = cont_end + 1;
                    }
                    gpgsig = Some(sig);
                }
                _ => {}
            }
        }

        let tree = tree.ok_or(ObjectError::MissingCommitField { id, field: "tree" })?;
        let (author, author_time) =
            author.ok_or(ObjectError::MissingCommitField { id, field: "author" })?;
        let (committer, committer_time) = match committer {
            Some((name, time)) => (Some(name), Some(time)),
            None => (None, None),
        };

        let message = BString::from(&data[pos.min(data.len())..]);

        Ok(Self {
            id,
            tree,
            parent,
            merge_parent,
            author,
            author_time,
            committer,
            committer_time,
            gpgsig,
            message,
            seq: 0,
        })
    }

    /// Is this a merge commit?
    pub fn is_merge(&self) -> bool {
        self.merge_parent.is_some()
    }

    /// Is this a root commit?
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// The first line of the message.
    pub fn summary(&self) -> &bstr::BStr {
        let msg: &[u8] = self.message.as_ref();
        match msg.find_byte(b'\n') {
            Some(p) => msg[..p].as_bstr(),
            None => msg.as_bstr(),
        }
    }
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "commit {}", self.id)?;
        if let Some(parent) = self.parent {
            writeln!(f, "parent {parent}")?;
        }
        if let Some(merge) = self.merge_parent {
            writeln!(f, "merge {merge}")?;
        }
        writeln!(f, "author {}", self.author)?;
        writeln!(f, "date {}", format_utc(self.author_time))?;
        writeln!(f)?;
        write!(f, "{}", self.message)
    }
}

/// Render a timestamp as a UTC `YYYY-MM-DD HH:MM:SS` string.
pub(crate) fn format_utc(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| secs.to_string())
}

fn parse_hex_field(
    _id: ObjectId,
    field: &'static str,
    value: &[u8],
) -> Result<ObjectId, ObjectError> {
    let hex = std::str::from_utf8(value)
        .map_err(|_| ObjectError::InvalidHeader(format!("non-UTF8 {field} id")))?;
    Ok(ObjectId::from_hex(hex.trim_end())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREE_HEX: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

    fn oid(n: u8) -> ObjectId {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        ObjectId::from_bytes(&bytes).unwrap()
    }

    fn sample_commit_bytes() -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(format!("tree {TREE_HEX}\n").as_bytes());
        out.extend_from_slice(b"parent 0000000000000000000000000000000000000001\n");
        out.extend_from_slice(b"author John Doe <john@example.com> 1234567890 +0000\n");
        out.extend_from_slice(b"committer Jane Doe <jane@example.com> 1234567899 +0000\n");
        out.extend_from_slice(b"\n");
        out.extend_from_slice(b"Initial commit\n");
        out
    }

    #[test]
    fn parse_commit() {
        let commit = Commit::parse(oid(9), &sample_commit_bytes()).unwrap();
        assert_eq!(commit.tree.to_hex(), TREE_HEX);
        assert_eq!(commit.parent, Some(oid(1)));
        assert_eq!(commit.merge_parent, None);
        assert_eq!(commit.author, "John Doe");
        assert_eq!(commit.author_time, 1234567890);
        assert_eq!(commit.committer.as_ref().unwrap(), "Jane Doe");
        assert_eq!(commit.committer_time, Some(1234567899));
        assert_eq!(commit.message, "Initial commit\n");
        assert_eq!(commit.seq, 0);
    }

    #[test]
    fn parse_root_commit() {
        let data = format!(
            "tree {TREE_HEX}\nauthor A <a@b.com> 1000000000 +0000\n\nroot\n"
        );
        let commit = Commit::parse(oid(1), data.as_bytes()).unwrap();
        assert!(commit.is_root());
        assert!(!commit.is_merge());
        assert_eq!(commit.committer, None);
    }

    #[test]
    fn merge_parent_is_second_and_third_is_ignored() {
        let data = format!(
            "tree {TREE_HEX}\n\
             parent 0000000000000000000000000000000000000001\n\
             parent 0000000000000000000000000000000000000002\n\
             parent 0000000000000000000000000000000000000003\n\
             author A <a@b.com> 1000000000 +0000\n\nMerge\n"
        );
        let commit = Commit::parse(oid(1), data.as_bytes()).unwrap();
        assert_eq!(commit.parent, Some(oid(1)));
        assert_eq!(commit.merge_parent, Some(oid(2)));
        assert!(commit.is_merge());
    }

    #[test]
    fn gpgsig_block_is_consumed() {
        let data = format!(
            "tree {TREE_HEX}\n\
             author A <a@b.com> 1000000000 +0000\n\
             gpgsig -----BEGIN PGP SIGNATURE-----\n \n abcdef\n -----END PGP SIGNATURE-----\n\
             \n\
             Signed message\n"
        );
        let commit = Commit::parse(oid(1), data.as_bytes()).unwrap();
        let sig = commit.gpgsig.unwrap();
        assert!(sig.starts_with(b"-----BEGIN PGP SIGNATURE-----"));
        assert!(sig.ends_with(b"-----END PGP SIGNATURE-----"));
        assert_eq!(commit.message, "Signed message\n");
    }

    #[test]
    fn unknown_headers_are_ignored() {
        let data = format!(
            "tree {TREE_HEX}\n\
             frobnicator yes\n\
             author A <a@b.com> 1000000000 +0000\n\nmsg\n"
        );
        let commit = Commit::parse(oid(1), data.as_bytes()).unwrap();
        assert_eq!(commit.message, "msg\n");
    }

    #[test]
    fn message_keeps_internal_newlines() {
        let data = format!(
            "tree {TREE_HEX}\nauthor A <a@b.com> 5 +0000\n\nSummary\n\nBody line 1\nBody line 2\n"
        );
        let commit = Commit::parse(oid(1), data.as_bytes()).unwrap();
        assert_eq!(commit.message, "Summary\n\nBody line 1\nBody line 2\n");
        assert_eq!(commit.summary(), "Summary");
    }

    #[test]
    fn missing_tree_errors() {
        let data = b"author A <a@b.com> 1000000000 +0000\n\nmsg\n";
        let err = Commit::parse(oid(1), data).unwrap_err();
        assert!(matches!(
            err,
            ObjectError::MissingCommitField { field: "tree", .. }
        ));
    }

    #[test]
    fn missing_author_errors() {
        let data = format!("tree {TREE_HEX}\n\nmsg\n");
        let err = Commit::parse(oid(1), data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            ObjectError::MissingCommitField { field: "author", .. }
        ));
    }

    #[test]
    fn display_summary_format() {
        let commit = Commit::parse(oid(9), &sample_commit_bytes()).unwrap();
        let rendered = commit.to_string();
        assert!(rendered.starts_with(&format!("commit {}\n", oid(9))));
        assert!(rendered.contains("author John Doe\n"));
        assert!(rendered.contains("date 2009-02-13 23:31:30\n"));
        assert!(rendered.ends_with("Initial commit\n"));
    }
}
