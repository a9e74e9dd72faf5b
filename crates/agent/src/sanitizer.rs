//! Response sanitizer: strips reasoning and directive artifacts from the
//! final model text before it reaches the user.

use crate::scan::{brace_spans_skipping_unbalanced, fenced_blocks, parse_directive};

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

/// Clean `text` for display.
///
/// Removes `<think>` spans, directive-capable fenced blocks and raw
/// tool-call objects, then trims. A removal can splice together a new
/// removable span, so passes repeat until the text stops changing; this
/// makes `sanitize(sanitize(x)) == sanitize(x)` hold for every input.
pub fn sanitize(text: &str) -> String {
    let mut current = sanitize_once(text);
    loop {
        let next = sanitize_once(&current);
        // Every pass only removes bytes, so equal length means no change.
        if next.len() == current.len() {
            return current;
        }
        current = next;
    }
}

fn sanitize_once(text: &str) -> String {
    let text = strip_reasoning(text);
    let text = strip_directive_fences(&text);
    strip_raw_directives(&text).trim().to_string()
}

/// Drop every `<think>...</think>` span. An unclosed marker is left alone.
fn strip_reasoning(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find(THINK_OPEN) {
        let after_open = open + THINK_OPEN.len();
        let Some(close) = rest[after_open..].find(THINK_CLOSE) else {
            break;
        };
        out.push_str(&rest[..open]);
        rest = &rest[after_open + close + THINK_CLOSE.len()..];
    }

    out.push_str(rest);
    out
}

/// Drop fenced blocks that may carry directives. Other fences are content.
fn strip_directive_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;

    for block in fenced_blocks(text) {
        if block.may_hold_directive() {
            out.push_str(&text[pos..block.range.start]);
            pos = block.range.end;
        }
    }

    out.push_str(&text[pos..]);
    out
}

/// Drop raw brace spans that parse as tool calls; keep every other span verbatim.
/// A lone `{` is kept and scanning carries on past it.
fn strip_raw_directives(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;

    for span in brace_spans_skipping_unbalanced(text) {
        if parse_directive(&text[span.clone()]).is_some() {
            out.push_str(&text[pos..span.start]);
            pos = span.end;
        }
    }

    out.push_str(&text[pos..]);
    out
}
