use std::fmt;

use bstr::{BString, ByteSlice};
use gitscope_hash::ObjectId;

use crate::commit::format_utc;
use crate::ident::parse_ident;
use crate::ObjectError;

/// A decoded annotated tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Object id of the tag itself.
    pub id: ObjectId,
    /// Id of the referenced object.
    pub target: ObjectId,
    /// Type name of the referenced object ("commit", "tree", ...).
    pub target_type: BString,
    /// Tag name.
    pub name: BString,
    /// Tagger name, when the tagger line parsed.
    pub tagger: Option<BString>,
    /// Tag creation timestamp, seconds since the epoch.
    pub tagged_time: Option<i64>,
}

impl Tag {
    /// Parse tag content from decompressed bytes (no loose header).
    ///
    /// Only the header lines matter; the optional message body is dropped.
    pub fn parse(id: ObjectId, content: &[u8]) -> Result<Self, ObjectError> {
        let mut target: Option<ObjectId> = None;
        let mut target_type: Option<BString> = None;
        let mut name: Option<BString> = None;
        let mut tagger: Option<(BString, i64)> = None;

        for line in content.lines() {
            if line.is_empty() {
                break;
            }
            let Some(space_pos) = line.find_byte(b' ') else {
                continue;
            };
            let key = &line[..space_pos];
            let value = &line[space_pos + 1..];

            match key {
                b"object" => {
                    let hex = std::str::from_utf8(value).map_err(|_| {
                        ObjectError::InvalidHeader("non-UTF8 object id".into())
                    })?;
                    target = Some(ObjectId::from_hex(hex.trim_end())?);
                }
                b"type" => target_type = Some(BString::from(value)),
                b"tag" => name = Some(BString::from(value)),
                b"tagger" => tagger = parse_ident(value),
                _ => {}
            }
        }

        let target = target.ok_or(ObjectError::MissingTagField { id, field: "object" })?;
        let target_type =
            target_type.ok_or(ObjectError::MissingTagField { id, field: "type" })?;
        let name = name.ok_or(ObjectError::MissingTagField { id, field: "tag" })?;
        let (tagger, tagged_time) = match tagger {
            Some((who, when)) => (Some(who), Some(when)),
            None => (None, None),
        };

        Ok(Self {
            id,
            target,
            target_type,
            name,
            tagger,
            tagged_time,
        })
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "tag {}", self.id)?;
        writeln!(f, "{} {}", self.target_type, self.target)?;
        writeln!(f, "name {}", self.name)?;
        if let Some(tagger) = &self.tagger {
            writeln!(f, "tagger {tagger}")?;
        }
        if let Some(when) = self.tagged_time {
            writeln!(f, "date {}", format_utc(when))?;
        }
        Ok(())
    }
}
