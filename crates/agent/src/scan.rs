//! Span finders over raw model text.
//!
//! Two scanners are shared by the extractor and the sanitizer so both
//! agree on what counts as a directive:
//!
//! - `fenced_blocks` pairs up triple-backtick fences.
//! - `brace_spans` finds balanced `{ ... }` spans with a depth counter.
//!
//! The brace scan is deliberately naive. It does not know about JSON string
//! literals, so a `{` or `}` inside a quoted argument value shifts the span
//! boundaries. Such spans usually fail to parse and are treated as prose.

use std::ops::Range;

use deskmate_core::tool::ToolCall;
use serde_json::{Map, Value};

const FENCE: &str = "```";

/// One fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock<'a> {
    /// Byte range of the whole block, fences included
    pub range: Range<usize>,
    /// Label right after the opening fence (may be empty)
    pub tag: &'a str,
    /// Text between the label and the closing fence
    pub body: &'a str,
}

impl FencedBlock<'_> {
    /// Untagged, `json` and `tool_call` blocks may carry directives.
    pub fn may_hold_directive(&self) -> bool {
        matches!(self.tag, "" | "json" | "tool_call")
    }
}

/// Every complete fenced block, left to right. An unclosed fence ends the scan.
pub fn fenced_blocks(text: &str) -> Vec<FencedBlock<'_>> {
    let mut blocks = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find(FENCE) {
        let open = pos + offset;
        let after_fence = open + FENCE.len();
        let tag_len = text[after_fence..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(text.len() - after_fence);
        let body_start = after_fence + tag_len;

        let Some(close_offset) = text[body_start..].find(FENCE) else {
            break;
        };
        let close = body_start + close_offset;

        blocks.push(FencedBlock {
            range: open..close + FENCE.len(),
            tag: &text[after_fence..body_start],
            body: &text[body_start..close],
        });
        pos = close + FENCE.len();
    }

    blocks
}

/// Iterator over balanced brace spans.
///
/// After yielding a span, scanning resumes just past it, so nested braces
/// inside a consumed span are never revisited. An opening brace with no
/// matching close ends the iteration, unless the iterator was built with
/// [`brace_spans_skipping_unbalanced`].
pub struct BraceSpans<'a> {
    bytes: &'a [u8],
    pos: usize,
    done: bool,
    skip_unbalanced: bool,
}

pub fn brace_spans(text: &str) -> BraceSpans<'_> {
    BraceSpans {
        bytes: text.as_bytes(),
        pos: 0,
        done: false,
        skip_unbalanced: false,
    }
}

/// Like [`brace_spans`], but an unmatched `{` is stepped over and scanning
/// continues from the next byte.
pub fn brace_spans_skipping_unbalanced(text: &str) -> BraceSpans<'_> {
    BraceSpans {
        skip_unbalanced: true,
        ..brace_spans(text)
    }
}

impl Iterator for BraceSpans<'_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let Some(offset) = self.bytes[self.pos..].iter().position(|&b| b == b'{') else {
                self.done = true;
                return None;
            };
            let start = self.pos + offset;

            if let Some(end) = matching_close(&self.bytes[start..]) {
                self.pos = start + end;
                return Some(start..self.pos);
            }

            if self.skip_unbalanced {
                self.pos = start + 1;
            } else {
                self.done = true;
            }
        }
        None
    }
}

/// Length of the balanced span opening at `bytes[0]`, if it closes.
fn matching_close(bytes: &[u8]) -> Option<usize> {
    let mut depth: usize = 0;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => depth -= 1,
            _ => continue,
        }
        if depth == 0 {
            return Some(i + 1);
        }
    }
    None
}

/// Parse `candidate` as a directive: a JSON object with `tool` and `args`.
pub fn parse_directive(candidate: &str) -> Option<ToolCall> {
    let value: Value = serde_json::from_str(candidate).ok()?;
    let object = value.as_object()?;
    let (tool, args) = (object.get("tool")?, object.get("args")?);

    let tool = match tool {
        Value::String(name) => name.clone(),
        other => other.to_string(),
    };
    let args = match args {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    Some(ToolCall::new(tool, args))
}
