//! CLI subcommands.

pub mod check;
pub mod migrate;
pub mod nearby;
pub mod plans;

use serde::Serialize;

/// Pretty-print a value as JSON on stdout.
fn print_json(value: &impl Serialize) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(value)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }
    Ok(())
}
