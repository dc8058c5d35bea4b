//! Stack trace parsing and source map projection.
//!
//! Supports the V8 (`    at name (file:1:2)`) and Gecko/WebKit
//! (`name@file:1:2`) formats. Lines that are not frames, such as the leading
//! `TypeError: message`, are skipped.

use crate::source_map::{self, SourceMap};
use crate::result::MochifyResult;
use std::fmt;
use std::sync::Arc;

/// One parsed stack frame
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackFrame {
    /// Function or method name
    pub method_name: Option<String>,
    /// Script location
    pub file: Option<String>,
    /// Line (1-based)
    pub line: Option<u32>,
    /// Column
    pub column: Option<u32>,
}

impl StackFrame {
    /// Whether the frame points at a script rather than native code
    #[must_use]
    pub fn has_file(&self) -> bool {
        self.file
            .as_deref()
            .is_some_and(|file| !matches!(file, "<anonymous>" | "native"))
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = self.file.as_deref().map(|file| {
            let mut location = file.to_string();
            if let Some(line) = self.line {
                location.push_str(&format!(":{line}"));
                if let Some(column) = self.column.filter(|c| *c != 0) {
                    location.push_str(&format!(":{column}"));
                }
            }
            location
        });
        match (self.method_name.as_deref(), location) {
            (Some(name), Some(location)) => write!(f, "    at {name} ({location})"),
            (None, Some(location)) => write!(f, "    at {location}"),
            (Some(name), None) => write!(f, "    at {name}"),
            (None, None) => Ok(()),
        }
    }
}

/// Split `file:line:column`, taking at most two trailing numbers
fn split_location(location: &str) -> (Option<String>, Option<u32>, Option<u32>) {
    let mut rest = location.trim();
    let mut numbers = Vec::with_capacity(2);
    while numbers.len() < 2 {
        match rest.rsplit_once(':') {
            Some((head, tail)) if !tail.is_empty() => match tail.parse::<u32>() {
                Ok(number) => {
                    numbers.push(number);
                    rest = head;
                }
                Err(_) => break,
            },
            _ => break,
        }
    }
    let file = (!rest.is_empty()).then(|| rest.to_string());
    match numbers.as_slice() {
        [column, line] => (file, Some(*line), Some(*column)),
        [line] => (file, Some(*line), None),
        _ => (file, None, None),
    }
}

fn non_empty(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn parse_v8(body: &str) -> StackFrame {
    let body = body.strip_prefix("async ").unwrap_or(body);
    let (name, location) = match body.strip_suffix(')').and_then(|b| b.split_once(" (")) {
        Some((name, location)) => (non_empty(name), location),
        None => (None, body),
    };
    // eval at fn (file:1:2), <anonymous>:1:1
    let location = match location.strip_prefix("eval at ") {
        Some(eval) => eval
            .find('(')
            .and_then(|open| {
                let inner = &eval[open + 1..];
                inner.find(')').map(|close| &inner[..close])
            })
            .unwrap_or(location),
        None => location,
    };
    let (file, line, column) = split_location(location);
    StackFrame {
        method_name: name,
        file,
        line,
        column,
    }
}

fn parse_gecko(line: &str) -> Option<StackFrame> {
    let (name, location) = line.split_once('@')?;
    if !location.contains(':') {
        return None;
    }
    let (file, line, column) = split_location(location);
    Some(StackFrame {
        method_name: non_empty(name),
        file,
        line,
        column,
    })
}

/// Parse a stack string into frames, skipping lines that are not frames
#[must_use]
pub fn parse(stack: &str) -> Vec<StackFrame> {
    stack
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            if let Some(body) = trimmed.strip_prefix("at ") {
                Some(parse_v8(body))
            } else {
                parse_gecko(trimmed)
            }
        })
        .collect()
}

/// Rewrites stack traces from bundle coordinates to source coordinates
#[derive(Debug, Clone)]
pub struct StackMapper {
    map: Arc<SourceMap>,
}

impl StackMapper {
    /// Create a mapper over a decoded source map
    #[must_use]
    pub fn new(map: SourceMap) -> Self {
        Self { map: Arc::new(map) }
    }

    /// Build a mapper from a script's inline source map, if it has one
    pub fn from_script(script: &str) -> MochifyResult<Option<Self>> {
        Ok(source_map::extract_inline(script)?.map(Self::new))
    }

    /// Underlying source map
    #[must_use]
    pub fn source_map(&self) -> &SourceMap {
        &self.map
    }

    /// Project a single frame through the source map
    #[must_use]
    pub fn map_frame(&self, frame: &StackFrame) -> StackFrame {
        let mapped = frame
            .line
            .and_then(|line| self.map.original_position_for(line, frame.column.unwrap_or(0)));
        match mapped {
            Some(position) => StackFrame {
                method_name: position.name.or_else(|| frame.method_name.clone()),
                file: Some(position.source),
                line: Some(position.line),
                column: Some(position.column),
            },
            None => frame.clone(),
        }
    }

    /// Rewrite every frame of `stack`, one `    at` line per frame.
    ///
    /// When the first frame has a file, frames from the first one without a
    /// file onwards are dropped.
    #[must_use]
    pub fn map_stack(&self, stack: &str) -> String {
        let mut frames = parse(stack);
        if frames.first().is_some_and(StackFrame::has_file) {
            if let Some(cut) = frames.iter().position(|frame| !frame.has_file()) {
                frames.truncate(cut);
            }
        }
        frames
            .iter()
            .map(|frame| self.map_frame(frame).to_string())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn mapper() -> StackMapper {
        StackMapper::new(
            SourceMap::parse(
                r#"{"version":3,"sources":["source.js"],"names":["myTest"],"mappings":";;AAyCAA"}"#,
            )
            .unwrap(),
        )
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_v8_named_frame() {
            let frames = parse("TypeError: x\n    at Context.fn (http://localhost/bundle.js:3:15)");
            assert_eq!(frames.len(), 1);
            assert_eq!(frames[0].method_name.as_deref(), Some("Context.fn"));
            assert_eq!(frames[0].file.as_deref(), Some("http://localhost/bundle.js"));
            assert_eq!(frames[0].line, Some(3));
            assert_eq!(frames[0].column, Some(15));
        }

        #[test]
        fn test_v8_anonymous_frame() {
            let frames = parse("    at bundle.js:10:2");
            assert_eq!(frames[0].method_name, None);
            assert_eq!(frames[0].file.as_deref(), Some("bundle.js"));
            assert_eq!(frames[0].line, Some(10));
        }

        #[test]
        fn test_v8_async_frame() {
            let frames = parse("    at async run (bundle.js:4:1)");
            assert_eq!(frames[0].method_name.as_deref(), Some("run"));
        }

        #[test]
        fn test_v8_eval_frame() {
            let frames = parse("    at eval (eval at load (bundle.js:7:3), <anonymous>:1:1)");
            assert_eq!(frames[0].method_name.as_deref(), Some("eval"));
            assert_eq!(frames[0].file.as_deref(), Some("bundle.js"));
            assert_eq!(frames[0].line, Some(7));
            assert_eq!(frames[0].column, Some(3));
        }

        #[test]
        fn test_v8_native_frame() {
            let frames = parse("    at Array.forEach (<anonymous>)");
            assert_eq!(frames[0].file.as_deref(), Some("<anonymous>"));
            assert!(!frames[0].has_file());
        }

        #[test]
        fn test_gecko_frames() {
            let frames = parse("myTest@http://localhost:8080/bundle.js:3:1\n@bundle.js:9:4");
            assert_eq!(frames.len(), 2);
            assert_eq!(frames[0].method_name.as_deref(), Some("myTest"));
            assert_eq!(frames[0].file.as_deref(), Some("http://localhost:8080/bundle.js"));
            assert_eq!(frames[1].method_name, None);
            assert_eq!(frames[1].column, Some(4));
        }

        #[test]
        fn test_message_lines_are_skipped() {
            assert!(parse("Error: boom\nsomething else").is_empty());
        }
    }

    mod render_tests {
        use super::*;

        #[test]
        fn test_frame_rendering() {
            let frame = StackFrame {
                method_name: Some("f".into()),
                file: Some("a.js".into()),
                line: Some(1),
                column: Some(2),
            };
            assert_eq!(frame.to_string(), "    at f (a.js:1:2)");
        }

        #[test]
        fn test_zero_column_is_omitted() {
            let frame = StackFrame {
                method_name: None,
                file: Some("a.js".into()),
                line: Some(42),
                column: Some(0),
            };
            assert_eq!(frame.to_string(), "    at a.js:42");
        }

        #[test]
        fn test_empty_frame_renders_nothing() {
            assert_eq!(StackFrame::default().to_string(), "");
        }
    }

    mod mapper_tests {
        use super::*;

        #[test]
        fn test_mapped_frame_uses_original_name_and_source() {
            let stack = "TypeError: Oh noes!\n    at Context.<anonymous> (bundle.js:3:0)";
            assert_eq!(mapper().map_stack(stack), "    at myTest (source.js:42)");
        }

        #[test]
        fn test_unmapped_frame_is_kept() {
            let stack = "    at other (vendor.js:1:5)";
            assert_eq!(mapper().map_stack(stack), "    at other (vendor.js:1:5)");
        }

        #[test]
        fn test_truncates_at_first_frame_without_file() {
            let stack = "Error\n    at a (bundle.js:3:0)\n    at Array.forEach (<anonymous>)\n    at runner (mocha.js:5:1)";
            assert_eq!(mapper().map_stack(stack), "    at myTest (source.js:42)");
        }

        #[test]
        fn test_no_truncation_when_first_frame_is_native() {
            let stack = "    at Array.map (<anonymous>)\n    at b (bundle.js:3:0)";
            let mapped = mapper().map_stack(stack);
            assert_eq!(mapped.lines().count(), 2);
        }

        #[test]
        fn test_from_script_without_map() {
            assert!(StackMapper::from_script("var x = 1;").unwrap().is_none());
        }
    }
}
