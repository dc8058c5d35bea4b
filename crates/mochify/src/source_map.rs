//! Inline source map extraction and Source Map v3 lookups.
//!
//! Bundlers append the map as a base64 data URL comment:
//!
//! ```text
//! //# sourceMappingURL=data:application/json;charset=utf-8;base64,eyJ2ZXJzaW9uIjozLC...
//! ```
//!
//! `mappings` is decoded eagerly into per-line segment lists so lookups are a
//! binary search on the generated line.

use crate::result::{MochifyError, MochifyResult};
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

#[allow(clippy::expect_used)]
fn comment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?m)^[ \t]*/[/*][@#][ \t]+sourceMappingURL=data:(?:(?:application|text)/json)?(?:;charset=[^;,]+)?(?:;(base64))?,(.*)$",
        )
        .expect("source map comment pattern is valid")
    })
}

/// Find and decode the last inline source map comment in `script`
pub fn extract_inline(script: &str) -> MochifyResult<Option<SourceMap>> {
    let Some(captures) = comment_pattern().captures_iter(script).last() else {
        return Ok(None);
    };
    let payload = captures.get(2).map_or("", |m| m.as_str());
    let payload = payload.trim_end().trim_end_matches("*/").trim_end();
    let json = if captures.get(1).is_some() {
        let bytes = STANDARD
            .decode(payload)
            .or_else(|_| STANDARD_NO_PAD.decode(payload))
            .map_err(|e| MochifyError::source_map(format!("base64: {e}")))?;
        String::from_utf8(bytes).map_err(|e| MochifyError::source_map(e.to_string()))?
    } else {
        percent_decode_str(payload).decode_utf8_lossy().into_owned()
    };
    SourceMap::parse(&json).map(Some)
}

/// Strip every source map comment from `script`
#[must_use]
pub fn remove_comments(script: &str) -> String {
    comment_pattern().replace_all(script, "").into_owned()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSourceMap {
    version: u32,
    #[serde(default)]
    sources: Vec<Option<String>>,
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    source_root: Option<String>,
    #[serde(default)]
    mappings: String,
}

/// One decoded segment of `mappings`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Generated column (0-based)
    pub generated_column: u32,
    /// Index into `sources` and the original position, if mapped
    pub original: Option<(usize, u32, u32)>,
    /// Index into `names`
    pub name: Option<usize>,
}

/// Original position returned by a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalPosition {
    /// Source file, with `sourceRoot` applied
    pub source: String,
    /// Line (1-based)
    pub line: u32,
    /// Column (0-based)
    pub column: u32,
    /// Original symbol name
    pub name: Option<String>,
}

/// Decoded Source Map v3
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    sources: Vec<String>,
    names: Vec<String>,
    lines: Vec<Vec<Segment>>,
}

impl SourceMap {
    /// Parse a Source Map v3 JSON document
    pub fn parse(json: &str) -> MochifyResult<Self> {
        let raw: RawSourceMap = serde_json::from_str(json)
            .map_err(|e| MochifyError::source_map(format!("json: {e}")))?;
        if raw.version != 3 {
            return Err(MochifyError::source_map(format!(
                "unsupported version {}",
                raw.version
            )));
        }
        let root = raw
            .source_root
            .filter(|root| !root.is_empty())
            .map(|root| format!("{}/", root.trim_end_matches('/')));
        let sources = raw
            .sources
            .into_iter()
            .map(|source| {
                let source = source.unwrap_or_default();
                match &root {
                    Some(root) if !source.contains("://") && !source.starts_with('/') => {
                        format!("{root}{source}")
                    }
                    _ => source,
                }
            })
            .collect();
        let lines = decode_mappings(&raw.mappings)?;
        Ok(Self {
            sources,
            names: raw.names,
            lines,
        })
    }

    /// Source files listed by the map
    #[must_use]
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Segments of a generated line (1-based)
    #[must_use]
    pub fn segments(&self, line: u32) -> &[Segment] {
        line.checked_sub(1)
            .and_then(|index| self.lines.get(index as usize))
            .map_or(&[], Vec::as_slice)
    }

    /// Original position for a generated line (1-based) and column (0-based).
    ///
    /// Picks the closest segment at or before `column` on the same line.
    #[must_use]
    pub fn original_position_for(&self, line: u32, column: u32) -> Option<OriginalPosition> {
        let segments = self.segments(line);
        let index = segments.partition_point(|s| s.generated_column <= column);
        let segment = segments.get(index.checked_sub(1)?)?;
        let (source, line, column) = segment.original?;
        Some(OriginalPosition {
            source: self.sources.get(source)?.clone(),
            line: line + 1,
            column,
            name: segment.name.and_then(|n| self.names.get(n).cloned()),
        })
    }
}

fn base64_digit(c: u8) -> Option<i64> {
    let value = match c {
        b'A'..=b'Z' => c - b'A',
        b'a'..=b'z' => c - b'a' + 26,
        b'0'..=b'9' => c - b'0' + 52,
        b'+' => 62,
        b'/' => 63,
        _ => return None,
    };
    Some(i64::from(value))
}

/// Decode one segment's base64 VLQ fields
pub fn decode_vlq(segment: &str) -> MochifyResult<Vec<i64>> {
    let mut values = Vec::new();
    let mut value: i64 = 0;
    let mut shift = 0;
    let mut open = false;
    for byte in segment.bytes() {
        let digit = base64_digit(byte)
            .ok_or_else(|| MochifyError::source_map(format!("invalid VLQ character {:?}", byte as char)))?;
        if shift > 60 {
            return Err(MochifyError::source_map("VLQ value overflow"));
        }
        value += (digit & 31) << shift;
        if digit & 32 == 0 {
            let negative = value & 1 == 1;
            let magnitude = value >> 1;
            values.push(if negative { -magnitude } else { magnitude });
            value = 0;
            shift = 0;
            open = false;
        } else {
            shift += 5;
            open = true;
        }
    }
    if open {
        return Err(MochifyError::source_map("unterminated VLQ value"));
    }
    Ok(values)
}

fn to_index(value: i64, what: &str) -> MochifyResult<u32> {
    u32::try_from(value).map_err(|_| MochifyError::source_map(format!("negative {what}")))
}

fn decode_mappings(mappings: &str) -> MochifyResult<Vec<Vec<Segment>>> {
    let mut lines = Vec::new();
    let mut source: i64 = 0;
    let mut original_line: i64 = 0;
    let mut original_column: i64 = 0;
    let mut name: i64 = 0;

    for line in mappings.split(';') {
        let mut generated_column: i64 = 0;
        let mut segments = Vec::new();
        for field in line.split(',').filter(|f| !f.is_empty()) {
            let values = decode_vlq(field)?;
            if values.is_empty() {
                continue;
            }
            generated_column += values[0];
            let mut segment = Segment {
                generated_column: to_index(generated_column, "generated column")?,
                original: None,
                name: None,
            };
            if values.len() >= 4 {
                source += values[1];
                original_line += values[2];
                original_column += values[3];
                segment.original = Some((
                    to_index(source, "source index")? as usize,
                    to_index(original_line, "original line")?,
                    to_index(original_column, "original column")?,
                ));
                if values.len() >= 5 {
                    name += values[4];
                    segment.name = Some(to_index(name, "name index")? as usize);
                }
            }
            segments.push(segment);
        }
        segments.sort_by_key(|s| s.generated_column);
        lines.push(segments);
    }
    Ok(lines)
}
