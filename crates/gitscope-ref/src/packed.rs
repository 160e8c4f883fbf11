//! packed-refs parsing.
//!
//! Format:
//! ```text
//! # pack-refs with: peeled fully-peeled sorted
//! <hex-id> <refname>
//! ^<hex-id>   (peeled target of the annotated tag above)
//! ```

use bstr::ByteSlice;
use gitscope_hash::ObjectId;

use crate::RefIndex;

/// Parse packed-refs content into the index.
///
/// Comment lines, peel lines, zero-length lines, and lines that do not parse
/// as `<40-hex> <path>` are all skipped; a packed-refs file never makes the
/// load fail.
pub(crate) fn parse_into(data: &[u8], index: &mut RefIndex) {
    for line in data.lines() {
        if line.is_empty() || line[0] == b'#' || line[0] == b'^' {
            continue;
        }

        let Some(space_pos) = line.find_byte(b' ') else {
            continue;
        };
        let Ok(hex) = std::str::from_utf8(&line[..space_pos]) else {
            continue;
        };
        let Ok(id) = ObjectId::from_hex(hex) else {
            continue;
        };

        let ref_path = line[space_pos + 1..].trim_end();
        index.install(ref_path, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstr::BStr;

    fn hex(n: u8) -> String {
        format!("{:040x}", n)
    }

    fn oid(n: u8) -> ObjectId {
        ObjectId::from_hex(&hex(n)).unwrap()
    }

    #[test]
    fn routes_each_category_to_its_map() {
        let mut index = RefIndex::default();
        let data = format!(
            "{} refs/heads/main\n\
             {} refs/remotes/origin/dev\n\
             {} refs/tags/v0.9\n",
            hex(1),
            hex(2),
            hex(3),
        );
        parse_into(data.as_bytes(), &mut index);

        assert_eq!(index.branches.get(BStr::new("main")), Some(&oid(1)));
        assert_eq!(index.branches.get(BStr::new("origin/dev")), Some(&oid(2)));
        assert_eq!(index.tags.get(BStr::new("v0.9")), Some(&oid(3)));
        assert!(index.tags.get(BStr::new("origin/dev")).is_none());
    }

    #[test]
    fn skips_comments_and_peel_lines() {
        let mut index = RefIndex::default();
        let data = format!(
            "# pack-refs with: peeled fully-peeled sorted \n\
             {} refs/tags/v1\n\
             ^{}\n",
            hex(1),
            hex(2),
        );
        parse_into(data.as_bytes(), &mut index);
        assert_eq!(index.tags.len(), 1);
        assert_eq!(index.tags.get(BStr::new("v1")), Some(&oid(1)));
    }

    #[test]
    fn skips_malformed_lines() {
        let mut index = RefIndex::default();
        let data = format!(
            "\n\
             not-a-hex-id refs/heads/x\n\
             {}\n\
             {} refs/heads/ok\n",
            hex(7),
            hex(8),
        );
        parse_into(data.as_bytes(), &mut index);
        assert_eq!(index.branches.len(), 1);
        assert_eq!(index.branches.get(BStr::new("ok")), Some(&oid(8)));
    }

    #[test]
    fn non_utf8_ref_names_are_kept_distinct() {
        let mut index = RefIndex::default();
        let mut data = Vec::new();
        data.extend_from_slice(hex(1).as_bytes());
        data.extend_from_slice(b" refs/heads/topic-\xc3\x28-a\n");
        data.extend_from_slice(hex(2).as_bytes());
        data.extend_from_slice(b" refs/heads/topic-\xc3\x29-b\n");
        parse_into(&data, &mut index);

        assert_eq!(index.branches.len(), 2);
        assert_eq!(
            index.branches.get(BStr::new(b"topic-\xc3\x28-a")),
            Some(&oid(1))
        );
        assert_eq!(
            index.branches.get(BStr::new(b"topic-\xc3\x29-b")),
            Some(&oid(2))
        );
    }

    #[test]
    fn unknown_categories_are_ignored() {
        let mut index = RefIndex::default();
        let data = format!("{} refs/stash\n{} refs/notes/commits\n", hex(1), hex(2));
        parse_into(data.as_bytes(), &mut index);
        assert!(index.branches.is_empty());
        assert!(index.tags.is_empty());
    }
}
