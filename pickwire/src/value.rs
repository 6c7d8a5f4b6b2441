//! Serialized value format.
//!
//! A selection list serializes as `title1=value1;title2=value2`, or just
//! `value` for a segment whose title equals its value. `;`, `=` and `%`
//! inside a title or value are written as `%3B`, `%3D` and `%25`. An empty
//! title is written as `=value`.
//!
//! Any list of valid records with unique, non-empty values round-trips.
//! An empty value has no encoding of its own: `title=` reads back as
//! `title=title`.
//!
//! Decoding is lenient: persisted values must degrade gracefully, so a
//! segment that cannot be split into exactly one title and one value is
//! taken whole as `value=value` instead of failing. A `%` that does not
//! start a known escape is kept as is.

use std::collections::HashSet;

use crate::record::SelectionRecord;

const ESCAPES: [(char, &str); 3] = [('%', "%25"), (';', "%3B"), ('=', "%3D")];

/// Escape the reserved characters of the value format.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match ESCAPES.iter().find(|(reserved, _)| *reserved == c) {
            Some((_, escaped)) => out.push_str(escaped),
            None => out.push(c),
        }
    }
    out
}

/// Reverse [`escape`].
pub fn unescape(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped;
    while let Some(at) = rest.find('%') {
        out.push_str(&rest[..at]);
        let tail = &rest[at..];
        let known = ESCAPES.iter().find(|(_, code)| {
            tail.get(..code.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(code))
        });
        match known {
            Some((reserved, code)) => {
                out.push(*reserved);
                rest = &tail[code.len()..];
            }
            None => {
                out.push('%');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Serialize the valid records in order.
pub fn encode_value<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a SelectionRecord>,
{
    records
        .into_iter()
        .filter(|record| record.valid)
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join(";")
}

fn encode_segment(record: &SelectionRecord) -> String {
    if record.title == record.value {
        escape(&record.value)
    } else {
        format!("{}={}", escape(&record.title), escape(&record.value))
    }
}

/// Parse a serialized value. Never fails; see the module docs for how
/// malformed segments are read.
pub fn decode_value(serialized: &str) -> Vec<SelectionRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for segment in serialized.split(';') {
        let Some(record) = decode_segment(segment) else {
            continue;
        };
        if seen.insert(record.value.clone()) {
            records.push(record);
        } else {
            log::debug!("[value] dropping duplicate value '{}'", record.value);
        }
    }

    records
}

fn decode_segment(segment: &str) -> Option<SelectionRecord> {
    if segment.is_empty() {
        return None;
    }

    let mut parts = segment.split('=');
    let (title, value) = match (parts.next(), parts.next(), parts.next()) {
        (Some(title), Some(value), None) => (unescape(title), unescape(value)),
        (Some(_), Some(_), Some(_)) => {
            log::warn!("[value] ambiguous segment '{}', reading it as value=value", segment);
            let whole = unescape(segment);
            (whole.clone(), whole)
        }
        _ => {
            let whole = unescape(segment);
            (whole.clone(), whole)
        }
    };

    match (title.is_empty(), value.is_empty()) {
        (true, true) => None,
        (true, false) => Some(SelectionRecord::new(title, value)),
        (false, true) => Some(SelectionRecord::titled_as_value(title)),
        (false, false) => Some(SelectionRecord::new(title, value)),
    }
}
