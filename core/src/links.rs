//! `Link` header parsing for paginated responses.

use std::collections::BTreeMap;

/// One pagination relation: the target URL and the link's extra parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Link {
    pub url: String,
    pub params: BTreeMap<String, String>,
}

/// Relations by name (`next`, `prev`, ...).
pub type Links = BTreeMap<String, Link>;

/// Parse a raw `Link` header value.
///
/// Segments without a `rel` parameter or without a target are dropped. A
/// `rel` may list several whitespace-separated names; each is registered
/// separately and the first segment naming a relation wins.
pub fn parse_link_header(header: &str) -> Links {
    let mut links = Links::new();
    for segment in split_segments(header) {
        let Some((rels, link)) = parse_link(segment) else {
            continue;
        };
        for rel in rels.split_whitespace() {
            links.entry(rel.to_string()).or_insert_with(|| link.clone());
        }
    }
    links
}

/// Split on `,` followed by optional whitespace and `<`, consuming all three.
fn split_segments(header: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let bytes = header.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b',' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b'<' {
                segments.push(&header[start..i]);
                start = j + 1;
                i = j + 1;
                continue;
            }
        }
        i += 1;
    }
    segments.push(&header[start..]);
    segments
}

fn parse_link(segment: &str) -> Option<(String, Link)> {
    let segment = segment.trim_start();
    let segment = segment.strip_prefix('<').unwrap_or(segment);
    let (url, rest) = segment.split_once('>')?;
    if url.is_empty() {
        return None;
    }

    let mut rel = None;
    let mut params = BTreeMap::new();
    for param in rest.split(';') {
        let Some((key, value)) = parse_param(param) else {
            continue;
        };
        if key == "rel" {
            rel.get_or_insert(value);
        } else {
            params.insert(key, value);
        }
    }

    let link = Link {
        url: url.to_string(),
        params,
    };
    rel.map(|rel| (rel, link))
}

fn parse_param(param: &str) -> Option<(String, String)> {
    let (key, value) = param.split_once('=')?;
    let key = key.trim();
    let value = value.trim().trim_matches('"');
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}
