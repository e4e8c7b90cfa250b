//! Human and JSON output for CLI commands
//!
//! Results go to stdout; warnings and errors go to stderr so `--json`
//! output stays machine-readable.

use serde_json::{json, Value};

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

pub trait OutputFormatter {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    /// Detail lines (board rows, field values); dropped in JSON and quiet modes
    fn info(&self, message: &str);
    fn print_json(&self, value: &Value);
}

/// Symbol-prefixed lines for terminals
///
/// With `quiet` set only errors and warnings are printed.
pub struct HumanFormatter {
    quiet: bool,
}

impl HumanFormatter {
    fn stdout(&self, prefix: &str, message: &str) {
        if !self.quiet {
            println!("{prefix}{message}");
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        self.stdout("\u{2713} ", message);
    }
    fn error(&self, message: &str) {
        eprintln!("\u{2717} {message}");
    }
    fn warn(&self, message: &str) {
        eprintln!("\u{26a0} {message}");
    }
    fn info(&self, message: &str) {
        self.stdout("  ", message);
    }
    fn print_json(&self, _value: &Value) {}
}

/// One JSON document per result
pub struct JsonFormatter;

fn status_json(ok: bool, key: &str, message: &str) -> Value {
    json!({ "ok": ok, key: message })
}

impl OutputFormatter for JsonFormatter {
    fn success(&self, message: &str) {
        println!("{}", status_json(true, "message", message));
    }
    fn error(&self, message: &str) {
        eprintln!("{}", status_json(false, "error", message));
    }
    fn warn(&self, message: &str) {
        eprintln!("{}", status_json(true, "warning", message));
    }
    fn info(&self, _message: &str) {}
    fn print_json(&self, value: &Value) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("{}", status_json(false, "error", &e.to_string())),
        }
    }
}

pub fn get_formatter(format: OutputFormat, quiet: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Human => Box::new(HumanFormatter { quiet }),
    }
}
