use std::fmt;

use percent_encoding::percent_decode_str;
use url::Url;

const TOPIC_PATH_MARKER: &str = "/cloudpubsub/topic/detail/";

/// Logical publish target derived from the console URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic(String);

impl Topic {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the decoded topic id from a (still percent-encoded) URL path.
///
/// Returns `None` when the path has no topic detail segment or when the
/// segment does not decode, which callers treat as the global scope.
pub fn topic_from_path(path: &str) -> Option<Topic> {
    let segment = path
        .match_indices(TOPIC_PATH_MARKER)
        .find_map(|(start, marker)| {
            let rest = &path[start + marker.len()..];
            let segment = rest.split(['/', '?', '#']).next().unwrap_or_default();
            (!segment.is_empty()).then_some(segment)
        })?;
    decode_component(segment).map(Topic)
}

/// Same as [`topic_from_path`], starting from a full `href`.
pub fn topic_from_href(href: &str) -> Option<Topic> {
    let url = Url::parse(href).ok()?;
    topic_from_path(url.path())
}

// Mirrors `decodeURIComponent`: stray `%` or invalid UTF-8 is a failure, not a passthrough.
fn decode_component(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'%' {
            let well_formed = bytes
                .get(idx + 1..idx + 3)
                .is_some_and(|pair| pair.iter().all(u8::is_ascii_hexdigit));
            if !well_formed {
                return None;
            }
            idx += 3;
        } else {
            idx += 1;
        }
    }
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_truncated_escape() {
        assert_eq!(decode_component("abc%2"), None);
        assert_eq!(decode_component("abc%zz"), None);
        assert_eq!(decode_component("%E0%A4%A"), None);
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        assert_eq!(decode_component("%FF"), None);
    }

    #[test]
    fn decode_keeps_plus_literal() {
        assert_eq!(decode_component("a+b").as_deref(), Some("a+b"));
    }
}
