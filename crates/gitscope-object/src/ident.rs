use bstr::BString;

/// Extract (name, seconds-since-epoch) from an ident line value.
///
/// The value has the shape `Name <email> <unix-seconds> <tz>`. Only the name
/// and the timestamp are retained; the email and timezone are skipped.
/// Returns `None` when the value does not follow the shape.
pub(crate) fn parse_ident(value: &[u8]) -> Option<(BString, i64)> {
    let gt_pos = value.iter().rposition(|&b| b == b'>')?;
    let lt_pos = value[..gt_pos].iter().rposition(|&b| b == b'<')?;

    let name: &[u8] = &value[..lt_pos];
    let name = trim_ascii(name);

    let rest = &value[gt_pos + 1..];
    let rest = trim_ascii(rest);
    let secs_end = rest
        .iter()
        .position(|&b| b == b' ')
        .unwrap_or(rest.len());
    let secs: i64 = std::str::from_utf8(&rest[..secs_end]).ok()?.parse().ok()?;

    Some((BString::from(name), secs))
}

fn trim_ascii(mut s: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = s {
        s = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = s {
        s = rest;
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_ident() {
        let (name, secs) = parse_ident(b"John Doe <john@example.com> 1234567890 +0000").unwrap();
        assert_eq!(name, "John Doe");
        assert_eq!(secs, 1234567890);
    }

    #[test]
    fn parse_ident_without_tz() {
        let (name, secs) = parse_ident(b"A <a@b.c> 77").unwrap();
        assert_eq!(name, "A");
        assert_eq!(secs, 77);
    }

    #[test]
    fn angle_brackets_in_name() {
        // Rightmost <...> wins, so a '<' inside the name does not confuse parsing.
        let (name, secs) = parse_ident(b"Weird <o> Name <w@x.y> 5 -0500").unwrap();
        assert_eq!(name, "Weird <o> Name");
        assert_eq!(secs, 5);
    }

    #[test]
    fn malformed_idents() {
        assert!(parse_ident(b"no brackets at all").is_none());
        assert!(parse_ident(b"Name <e@f.g> not-a-number +0000").is_none());
        assert!(parse_ident(b"Name <e@f.g>").is_none());
    }
}
