pub mod auth;
pub mod completions;
pub mod config;
pub mod drivers;
pub mod notifications;
pub mod push;
pub mod tasks;
pub mod watch;

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};

/// Reads a secret from stdin when it was not given on the command line
pub(crate) fn read_secret(given: Option<&str>, prompt: &str) -> Result<String> {
    if let Some(value) = given {
        return Ok(value.to_string());
    }
    eprint!("{prompt}: ");
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    let value = line.trim_end_matches(['\r', '\n']).to_string();
    if value.is_empty() {
        bail!("{prompt} must not be empty");
    }
    Ok(value)
}
