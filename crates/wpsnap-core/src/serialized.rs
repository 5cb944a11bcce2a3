//! Text replacement that keeps PHP serialized payloads valid.
//!
//! WordPress stores option values as PHP serialized blobs, so a naive
//! search-and-replace over a SQL dump (to move a site between URLs, for
//! instance) breaks the `s:<len>:"…";` length declarations. The walker
//! here rewrites each dump line: occurrences inside a serialized string
//! get their declared length recomputed, everything else is replaced
//! verbatim. Both plain `s:N:"…";` segments and the backslash-escaped
//! form emitted inside quoted SQL literals are handled.

use std::sync::LazyLock;

use regex::bytes::Regex;

use crate::settings::ReplaceRule;

static SERIALIZED_STR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"s:(\d+):(\\?)""#).expect("serialized string regex is valid")
});

/// Ordered search/replacement byte pairs.
#[derive(Debug, Clone, Default)]
pub struct ReplaceMap {
    pairs: Vec<(Vec<u8>, Vec<u8>)>,
}

impl ReplaceMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a search/replacement pair. Pairs apply in insertion order.
    pub fn push(&mut self, search: impl Into<Vec<u8>>, replace: impl Into<Vec<u8>>) {
        self.pairs.push((search.into(), replace.into()));
    }

    /// Whether the map holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn pairs(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.pairs.iter().map(|(s, r)| (s.as_slice(), r.as_slice()))
    }
}

impl From<&[ReplaceRule]> for ReplaceMap {
    fn from(rules: &[ReplaceRule]) -> Self {
        let mut map = Self::new();
        for rule in rules {
            map.push(rule.search.as_bytes(), rule.replace.as_bytes());
        }
        map
    }
}

/// Apply a replace map to one dump line.
///
/// Serialized strings that turn out malformed (wrong declared length,
/// missing terminator) are copied through with plain replacement only,
/// which is also what happens to all text between them.
pub fn walk(line: &[u8], map: &ReplaceMap) -> Vec<u8> {
    if map.is_empty() {
        return line.to_vec();
    }

    let mut out = Vec::with_capacity(line.len());
    let mut pos = 0;

    for caps in SERIALIZED_STR.captures_iter(line) {
        let header = caps.get(0).expect("whole match always present");
        if header.start() < pos {
            continue;
        }

        let declared = std::str::from_utf8(&caps[1])
            .ok()
            .and_then(|digits| digits.parse::<usize>().ok());
        let escaped = !caps[2].is_empty();

        let parsed =
            declared.and_then(|len| read_serialized(line, header.end(), len, escaped));
        let Some((after, content)) = parsed else {
            out.extend_from_slice(&replace_plain(&line[pos..header.end()], map));
            pos = header.end();
            continue;
        };

        out.extend_from_slice(&replace_plain(&line[pos..header.start()], map));

        let replaced = replace_plain(&content, map);
        let quote: &[u8] = if escaped { b"\\\"" } else { b"\"" };
        out.extend_from_slice(format!("s:{}:", replaced.len()).as_bytes());
        out.extend_from_slice(quote);
        out.extend_from_slice(&escape_content(&replaced, escaped));
        out.extend_from_slice(quote);
        out.push(b';');
        pos = after;
    }

    out.extend_from_slice(&replace_plain(&line[pos..], map));
    out
}

/// Read `declared` logical bytes of serialized content starting at
/// `start`, undoing dump escapes, and check the closing `";`.
///
/// Returns the position just past the terminator and the unescaped
/// content, or None when the segment does not line up.
fn read_serialized(
    line: &[u8],
    start: usize,
    declared: usize,
    escaped: bool,
) -> Option<(usize, Vec<u8>)> {
    let mut content = Vec::with_capacity(declared);
    let mut pos = start;

    while content.len() < declared {
        let byte = *line.get(pos)?;
        if byte == b'\\' {
            let next = *line.get(pos + 1)?;
            content.push(unescape_byte(next));
            pos += 2;
        } else {
            content.push(byte);
            pos += 1;
        }
    }

    let terminator: &[u8] = if escaped { b"\\\";" } else { b"\";" };
    if line[pos..].starts_with(terminator) {
        Some((pos + terminator.len(), content))
    } else {
        None
    }
}

fn unescape_byte(byte: u8) -> u8 {
    match byte {
        b'n' => b'\n',
        b'r' => b'\r',
        b't' => b'\t',
        b'0' => 0,
        b'Z' => 0x1a,
        other => other,
    }
}

fn escape_content(content: &[u8], escaped: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len());
    for &byte in content {
        match byte {
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'\'' => out.extend_from_slice(b"\\'"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            0 => out.extend_from_slice(b"\\0"),
            0x1a => out.extend_from_slice(b"\\Z"),
            b'"' if escaped => out.extend_from_slice(b"\\\""),
            other => out.push(other),
        }
    }
    out
}

fn replace_plain(input: &[u8], map: &ReplaceMap) -> Vec<u8> {
    let mut current = input.to_vec();

    for (search, replace) in map.pairs() {
        if search.is_empty() {
            continue;
        }
        let mut next = Vec::with_capacity(current.len());
        let mut i = 0;
        while i < current.len() {
            if current[i..].starts_with(search) {
                next.extend_from_slice(replace);
                i += search.len();
            } else {
                next.push(current[i]);
                i += 1;
            }
        }
        current = next;
    }

    current
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url_map() -> ReplaceMap {
        let mut map = ReplaceMap::new();
        map.push(&b"http://example.com"[..], &b"https://example.org"[..]);
        map
    }

    #[test]
    fn replaces_plain_text() {
        let out = walk(b"siteurl = http://example.com/blog", &url_map());
        assert_eq!(out, b"siteurl = https://example.org/blog");
    }

    #[test]
    fn fixes_serialized_length_on_grow() {
        let line = br#"a:1:{s:23:"http://example.com/blog";}"#;
        let out = walk(line, &url_map());
        assert_eq!(out, br#"a:1:{s:24:"https://example.org/blog";}"#);
    }

    #[test]
    fn fixes_serialized_length_on_shrink() {
        let mut map = ReplaceMap::new();
        map.push(&b"https://example.org"[..], &b"http://e.org"[..]);
        let line = br#"s:19:"https://example.org";"#;
        assert_eq!(walk(line, &map), br#"s:12:"http://e.org";"#);
    }

    #[test]
    fn handles_escaped_quotes_inside_sql_literal() {
        let line = br#"VALUES ('a:1:{s:18:\"http://example.com\";}')"#;
        let out = walk(line, &url_map());
        assert_eq!(out, br#"VALUES ('a:1:{s:19:\"https://example.org\";}')"#);
    }

    #[test]
    fn counts_dump_escapes_as_single_bytes() {
        // Content is the three bytes a \ b, dumped as a\\b.
        let line = br#"s:3:"a\\b";"#;
        let out = walk(line, &url_map());
        assert_eq!(out, line.to_vec());
    }

    #[test]
    fn leaves_malformed_serialized_untouched() {
        let line = br#"s:99:"too short";"#;
        assert_eq!(walk(line, &url_map()), line.to_vec());
    }

    #[test]
    fn applies_multiple_rules_in_order() {
        let mut map = ReplaceMap::new();
        map.push(&b"alpha"[..], &b"beta"[..]);
        map.push(&b"beta"[..], &b"gamma"[..]);
        assert_eq!(walk(b"alpha", &map), b"gamma");
    }

    #[test]
    fn empty_map_is_identity() {
        let line = br#"s:5:"hello";"#;
        assert_eq!(walk(line, &ReplaceMap::new()), line.to_vec());
    }
}
