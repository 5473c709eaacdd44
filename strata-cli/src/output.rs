//! Styled terminal output utilities.

use std::path::Path;

use owo_colors::OwoColorize;
use serde::Serialize;

use crate::error::CliResult;

/// Print a header/title
pub fn header(text: &str) {
    println!();
    println!("{}", text.bold().cyan());
    println!("{}", "─".repeat(text.len()).dimmed());
    println!();
}

/// Print a section header
pub fn section(text: &str) {
    println!("{}", text.bold().white());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a success message
pub fn success(text: &str) {
    println!("{} {}", "✔".green().bold(), text.green());
}

/// Print an info message
pub fn info(text: &str) {
    println!("{} {}", "ℹ".blue().bold(), text);
}

/// Print a warning message
pub fn warn(text: &str) {
    println!("{} {}", "⚠".yellow().bold(), text.yellow());
}

/// Print an error message
pub fn error(text: &str) {
    eprintln!("{} {}", "✖".red().bold(), text.red());
}

/// Print a step indicator
pub fn step(current: usize, total: usize, text: &str) {
    println!("{} {}", format!("[{}/{}]", current, total).dimmed(), text);
}

/// Print a list item
pub fn list_item(text: &str) {
    println!("  {} {}", "•".dimmed(), text);
}

/// Print a newline
pub fn newline() {
    println!();
}

/// Print dimmed text
pub fn dim(text: &str) {
    println!("{}", text.dimmed());
}

/// Write a JSON document to `path`, or to stdout when no path is given.
///
/// Nothing else is printed to stdout alongside a document, so the output can
/// be piped into another command.
pub fn document<T: Serialize>(value: &T, path: Option<&Path>) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            std::fs::write(path, format!("{text}\n"))?;
            success(&format!("Wrote {}", path.display()));
        }
        None => println!("{text}"),
    }
    Ok(())
}
