//! `deskmate tools`: print the tool catalog.

use deskmate_core::tool::ToolSpec;

fn render(spec: &ToolSpec) -> String {
    let mut out = format!("  {}\n      {}\n", spec.name, spec.description);
    for param in spec.params {
        let marker = if param.required { "*" } else { " " };
        out.push_str(&format!("      {marker} {} ({})", param.name, param.kind.label()));
        if !param.description.is_empty() {
            out.push_str(&format!(": {}", param.description));
        }
        out.push('\n');
    }
    out
}

pub fn run() {
    let catalog = deskmate_tools::catalog();
    println!("Deskmate tools ({}), * = required\n", catalog.len());
    for spec in catalog {
        println!("{}", render(spec));
    }
}
