//! Tool-call extraction from free-form model output.
//!
//! Fenced blocks are tried first. Only when no fenced block yields a
//! directive does the raw brace scan run, so an answer that fences its calls
//! never has stray inline JSON picked up as well.

use deskmate_core::tool::ToolCall;
use tracing::trace;

use crate::scan::{brace_spans, fenced_blocks, parse_directive};

/// Every directive in `text`, in order of appearance.
pub fn extract_tool_calls(text: &str) -> Vec<ToolCall> {
    let fenced = fenced_calls(text);
    if !fenced.is_empty() {
        trace!(calls = fenced.len(), "Directives found in fenced blocks");
        return fenced;
    }

    let raw: Vec<ToolCall> = brace_spans(text)
        .filter_map(|span| parse_directive(&text[span]))
        .collect();
    if !raw.is_empty() {
        trace!(calls = raw.len(), "Directives found by brace scan");
    }
    raw
}

fn fenced_calls(text: &str) -> Vec<ToolCall> {
    fenced_blocks(text)
        .into_iter()
        .filter(|block| block.may_hold_directive())
        .filter_map(|block| {
            let body = block.body.trim();
            if body.starts_with('{') && body.ends_with('}') {
                parse_directive(body)
            } else {
                None
            }
        })
        .collect()
}
