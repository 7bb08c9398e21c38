//! Terminal output.
//!
//! Response bodies and `status` fields go to stdout; progress, results and
//! hints go to stderr so stdout can be piped.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use paykit_core::ApiResponse;

pub fn success(msg: &str) {
    eprintln!("{} {}", "ok".green().bold(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", "error".red().bold(), msg);
}

/// Follow-up the user should take, e.g. logging in again.
pub fn hint(msg: &str) {
    eprintln!("{} {}", "hint".yellow(), msg);
}

pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Whether a token is stored, without ever showing it.
pub fn presence(stored: bool) -> &'static str {
    if stored { "stored" } else { "missing" }
}

pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a response body: pretty JSON when it parses, raw text otherwise.
pub fn body(response: &ApiResponse) -> Result<()> {
    if response.body.is_empty() {
        return Ok(());
    }
    match response.json::<Value>() {
        Ok(value) => json_pretty(&value),
        Err(_) => {
            println!("{}", response.text());
            Ok(())
        }
    }
}
