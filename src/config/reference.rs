// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! `$`-prefixed references into task data, e.g. `$image` or `$pages[2].url`.

use serde_json::{Map, Value};

/// One step of a data path.
#[derive(Debug, Clone, PartialEq)]
enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

/// Whether an attribute value names task data rather than a literal.
pub fn is_reference(raw: &str) -> bool {
    raw.starts_with('$')
}

/// Resolve an attribute value against task data.
///
/// Values without a leading `$` are literals and come back as strings.
/// References that do not match the data resolve to `None`.
pub fn resolve(raw: &str, data: &Map<String, Value>) -> Option<Value> {
    if !is_reference(raw) {
        return Some(Value::String(raw.to_string()));
    }
    let segments = parse_path(&raw[1..])?;
    let (first, rest) = segments.split_first()?;
    let Segment::Key(first) = first else {
        return None;
    };

    let mut current = data.get(*first)?;
    for segment in rest {
        current = match segment {
            Segment::Key(key) => current.as_object()?.get(*key)?,
            Segment::Index(index) => current.as_array()?.get(*index)?,
        };
    }
    Some(current.clone())
}

fn parse_path(path: &str) -> Option<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        let (key, mut indexes) = match part.find('[') {
            Some(open) => (&part[..open], &part[open..]),
            None => (part, ""),
        };
        if !key.is_empty() {
            segments.push(Segment::Key(key));
        } else if segments.is_empty() || indexes.is_empty() {
            return None;
        }
        while !indexes.is_empty() {
            let inner = indexes.strip_prefix('[')?;
            let close = inner.find(']')?;
            segments.push(Segment::Index(inner[..close].parse().ok()?));
            indexes = &inner[close + 1..];
        }
    }
    if segments.is_empty() {
        None
    } else {
        Some(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve() {
        struct TestCase {
            name: &'static str,
            raw: &'static str,
            expected: Option<Value>,
        }

        let data = json!({
            "image": "http://example.com/a.jpg",
            "pages": [{"url": "p0"}, {"url": "p1"}, {"url": "p2"}],
            "meta": {"author": {"name": "kim"}},
            "grid": [[1, 2], [3, 4]]
        });
        let data = data.as_object().unwrap();

        let cases = vec![
            TestCase {
                name: "literal",
                raw: "plain text",
                expected: Some(json!("plain text")),
            },
            TestCase {
                name: "top level key",
                raw: "$image",
                expected: Some(json!("http://example.com/a.jpg")),
            },
            TestCase {
                name: "array index then key",
                raw: "$pages[2].url",
                expected: Some(json!("p2")),
            },
            TestCase {
                name: "nested keys",
                raw: "$meta.author.name",
                expected: Some(json!("kim")),
            },
            TestCase {
                name: "double index",
                raw: "$grid[1][0]",
                expected: Some(json!(3)),
            },
            TestCase {
                name: "missing key",
                raw: "$video",
                expected: None,
            },
            TestCase {
                name: "index out of range",
                raw: "$pages[9].url",
                expected: None,
            },
            TestCase {
                name: "malformed index",
                raw: "$pages[x]",
                expected: None,
            },
            TestCase {
                name: "bare dollar",
                raw: "$",
                expected: None,
            },
        ];

        for case in cases {
            assert_eq!(resolve(case.raw, data), case.expected, "{}", case.name);
        }
    }
}
