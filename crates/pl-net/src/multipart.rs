//! Multipart body parsing
//!
//! Splits a `multipart/*` body into parts. Parts keep wire order, header
//! names are lower-cased and the last occurrence of a header wins.

use std::collections::HashMap;

/// A single part of a multipart body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartPart {
    /// Lower-cased header name to value. Lines without `": "` have no value.
    pub headers: HashMap<String, Option<String>>,
    pub body: String,
}

impl MultipartPart {
    /// Header value by name, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|value| value.as_deref())
    }

    /// Whether the header is present, with or without a value
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(&name.to_ascii_lowercase())
    }
}

/// Parse `raw` into parts delimited by `--{boundary}`
pub fn parse(raw: &str, boundary: &str) -> Vec<MultipartPart> {
    let delimiter = format!("--{}", boundary);

    raw.split(delimiter.as_str())
        .filter(|section| {
            let trimmed = section.trim();
            !trimmed.is_empty() && trimmed != "--"
        })
        .map(parse_part)
        .collect()
}

fn parse_part(section: &str) -> MultipartPart {
    let (raw_headers, body) = section.split_once("\r\n\r\n").unwrap_or((section, ""));

    let mut headers = HashMap::new();
    for line in raw_headers.trim().split("\r\n") {
        if line.is_empty() {
            continue;
        }
        match line.split_once(": ") {
            Some((key, value)) => headers.insert(key.to_lowercase(), Some(value.to_string())),
            None => headers.insert(line.to_lowercase(), None),
        };
    }

    MultipartPart {
        headers,
        body: body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "--b1\r\n\
        Content-Range: selector=#item-1\r\n\
        Allow: GET, DELETE\r\n\
        \r\n\
        <li id=\"item-1\">One</li>\r\n\
        --b1\r\n\
        content-range: selector=#item-2\r\n\
        \r\n\
        \r\n\
        --b1--\r\n";

    #[test]
    fn test_parts_in_wire_order() {
        let parts = parse(BODY, "b1");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].header("Content-Range"), Some("selector=#item-1"));
        assert_eq!(parts[0].header("allow"), Some("GET, DELETE"));
        assert_eq!(parts[0].body, "<li id=\"item-1\">One</li>");
        assert_eq!(parts[1].header("content-range"), Some("selector=#item-2"));
        assert_eq!(parts[1].header("allow"), None);
        assert_eq!(parts[1].body, "");
    }

    #[test]
    fn test_last_header_wins() {
        let raw = "--x\r\nAllow: GET\r\nALLOW: PUT\r\n\r\nbody\r\n--x--";
        let parts = parse(raw, "x");
        assert_eq!(parts[0].header("allow"), Some("PUT"));
    }

    #[test]
    fn test_header_without_separator() {
        let raw = "--x\r\nX-Flag\r\nA: b: c\r\n\r\n--x--";
        let parts = parse(raw, "x");
        assert!(parts[0].has_header("x-flag"));
        assert_eq!(parts[0].header("x-flag"), None);
        assert_eq!(parts[0].header("a"), Some("b: c"));
    }

    #[test]
    fn test_body_keeps_inner_blank_lines() {
        let raw = "--x\r\nA: 1\r\n\r\nfirst\r\n\r\nsecond\r\n--x--";
        let parts = parse(raw, "x");
        assert_eq!(parts[0].body, "first\r\n\r\nsecond");
    }

    #[test]
    fn test_no_delimiters() {
        assert!(parse("", "x").is_empty());
        assert!(parse("--x--", "x").is_empty());
    }
}
