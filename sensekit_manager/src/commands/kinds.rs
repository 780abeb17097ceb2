//! `sensekit kinds` - list resource kinds and their parameters

use colored::*;

use sensekit_core::init_string::ResourceKind;

pub fn render_kinds() -> String {
    let mut out = String::new();

    for kind in ResourceKind::ALL {
        out.push_str(&format!("  {:<5} {}\n", kind.tag().cyan().bold(), kind.usage()));
        for param in kind.params() {
            let required = if param.required { "" } else { " (optional)" };
            out.push_str(&format!(
                "          {:<12} {}{}\n",
                param.name,
                param.ty,
                required.dimmed()
            ));
        }
    }

    out
}

pub fn run_kinds() {
    println!("{}", "Resource kinds".cyan().bold());
    println!();
    print!("{}", render_kinds());
    println!();
    println!(
        "Clauses are separated by '{}', parameters by '{}'. Integers may be decimal or 0x hex.",
        ";".yellow(),
        ",".yellow()
    );
}
