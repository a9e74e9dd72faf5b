//! System prompt assembly.
//!
//! The prompt is rebuilt for every turn from the static catalog and the
//! current local time. It is never stored in conversation history.

use chrono::NaiveDateTime;
use deskmate_core::tool::{ParamSpec, ToolSpec};
use std::fmt::Write as _;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Render the system prompt for one turn.
pub fn build_system_prompt(assistant_name: &str, catalog: &[ToolSpec], now: NaiveDateTime) -> String {
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "You are {assistant_name}, a personal assistant with full access to the user's Google account."
    );
    prompt.push_str("You can use the following tools:\n\n");
    prompt.push_str(&render_catalog(catalog));
    prompt.push_str(
        "\n## Rules:\n\
         1. Understand the user's request and, whenever an action is needed, call the matching tool.\n\
         2. To call a tool, output ONLY a JSON object like this:\n\
         ```json\n\
         {\"tool\": \"tool_name\", \"args\": {\"parameter_name\": \"value\"}}\n\
         ```\n\
         3. VERY IMPORTANT: when you call a tool, do not add any other text. Output only the JSON block.\n\
         4. VERY IMPORTANT: when you call several tools, output each JSON block separately.\n\
         5. Once tool results are given to you (or when no tool is needed), summarize the outcome for the user politely.\n",
    );
    let _ = writeln!(prompt, "6. Current date/time: {}", now.format(DATE_FORMAT));

    prompt
}

/// One bullet per tool with its parameter line.
fn render_catalog(catalog: &[ToolSpec]) -> String {
    let mut out = String::new();
    for spec in catalog {
        let params: Vec<String> = spec.params.iter().map(render_param).collect();
        let _ = writeln!(out, "- **{}**: {}", spec.name, spec.description);
        let _ = writeln!(out, "  Parameters: {}", params.join(", "));
    }
    out
}

fn render_param(param: &ParamSpec) -> String {
    let mut rendered = format!("{}: {}", param.name, param.kind.label());
    if !param.required {
        rendered.push_str(" (optional)");
    }
    if !param.description.is_empty() {
        rendered.push_str(" - ");
        rendered.push_str(param.description);
    }
    rendered
}
