// ABOUTME: Regex miners for values embedded in inline script text: publish timestamps and topic literals.
// ABOUTME: Absence is a normal outcome here; every extractor returns Option instead of an error.

//! Pattern extractors.
//!
//! Pages carry some metadata only inside `<script>` bodies. Each extractor here
//! has exactly one capture group and a defined "not found" result:
//! - timestamps come back as `None` when the pattern is missing or the digits
//!   do not form a valid Unix time;
//! - `publicTagInfo` topic literals come back as `None` only when the array
//!   itself is missing, and object literals lacking any required field are dropped.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::records::TopicRef;

static TIME_CONVERT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"document\.write\(timeConvert\('(\d+)'\)\)").expect("valid timeConvert regex")
});

static ORI_CREATE_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"oriCreateTime\s*=\s*['"](\d+)['"]"#).expect("valid oriCreateTime regex")
});

static QUOTED_EPOCH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(1[6-9]\d{8})""#).expect("valid quoted epoch regex"));

static TAG_ARRAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)publicTagInfo\s*=\s*\[(.*?)\]\s*;").expect("valid publicTagInfo regex")
});

static OBJECT_LITERAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]*)\}").expect("valid object literal regex"));

// One `key: value` pair at the start of the remaining literal. The value is
// `'...'`, `"..."` or a bare token; anything after it up to the next comma is
// ignored, so `size: '12' * 1` reads as `12`.
static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*([A-Za-z_$][\w$]*)\s*:\s*(?:'([^']*)'|"([^"]*)"|([^,\s}'"]+))"#)
        .expect("valid object field regex")
});

/// Return the first capture group of `re` in `text`, if the pattern matches.
pub fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Parse base-10 Unix seconds. Anything unparseable or out of range is `None`.
pub fn parse_unix_seconds(raw: &str) -> Option<DateTime<Utc>> {
    let secs: i64 = raw.trim().parse().ok()?;
    DateTime::from_timestamp(secs, 0)
}

/// The document variants that embed a publish time in script text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampPattern {
    /// `document.write(timeConvert('1640966400'))`, used on search result pages.
    TimeConvert,
    /// `var oriCreateTime = '1640966400'`, used by some article layouts.
    OriCreateTime,
    /// A quoted ten-digit epoch such as `"1640966400"`, used by the article `publish_time` block.
    QuotedEpoch,
}

impl TimestampPattern {
    fn regex(self) -> &'static Regex {
        match self {
            TimestampPattern::TimeConvert => &TIME_CONVERT_RE,
            TimestampPattern::OriCreateTime => &ORI_CREATE_TIME_RE,
            TimestampPattern::QuotedEpoch => &QUOTED_EPOCH_RE,
        }
    }

    /// Find the first timestamp of this variant in `text`.
    pub fn find(self, text: &str) -> Option<DateTime<Utc>> {
        capture(self.regex(), text).and_then(parse_unix_seconds)
    }
}

/// Extract topic references from a script declaring `publicTagInfo = [ ... ];`.
///
/// Returns `None` when the script has no such array. Otherwise returns every
/// object literal that carries all of `title`, `size`, `link` and `albumId`,
/// in source order.
pub fn topic_refs(script: &str) -> Option<Vec<TopicRef>> {
    let body = capture(&TAG_ARRAY_RE, script)?;
    let topics = OBJECT_LITERAL_RE
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .filter_map(|object| topic_from_literal(object.as_str()))
        .collect();
    Some(topics)
}

fn topic_from_literal(object: &str) -> Option<TopicRef> {
    let fields = object_fields(object);
    let field = |name: &str| {
        fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    };
    Some(TopicRef {
        name: field("title")?,
        count: field("size")?,
        url: field("link")?,
        id: field("albumId")?,
    })
}

/// Key/value pairs of an object literal body, in source order.
///
/// Pairs are read one comma-separated entry at a time, so text inside a quoted
/// value is never taken for a key.
fn object_fields(object: &str) -> Vec<(&str, &str)> {
    let mut fields = Vec::new();
    let mut rest = object;
    while !rest.trim().is_empty() {
        let mut consumed = 0;
        if let Some(caps) = FIELD_RE.captures(rest) {
            let value = caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4));
            if let (Some(key), Some(value)) = (caps.get(1), value) {
                fields.push((key.as_str(), value.as_str()));
            }
            consumed = caps.get(0).map_or(0, |m| m.end());
        }
        match next_entry(&rest[consumed..]) {
            Some(offset) => rest = &rest[consumed + offset..],
            None => break,
        }
    }
    fields
}

// Byte offset just past the next comma outside a quoted string.
fn next_entry(text: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ',') => return Some(i + 1),
            (None, _) => {}
        }
    }
    None
}
