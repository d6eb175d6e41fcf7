//! Single-line JSON output.
//!
//! Every invocation prints exactly one JSON object on stdout:
//! `{"ok": bool, "action": ..., "result": ...}` or
//! `{"ok": false, "action": ..., "error": ...}`.

use serde_json::{json, Value};

/// What a command produced.
#[derive(Debug)]
pub enum Report {
    /// The command succeeded.
    Done(Value),
    /// The command ran but the answer was negative (e.g. not verified).
    Negative(Value),
}

pub fn report_line(action: &str, report: &Report) -> String {
    let (ok, result) = match report {
        Report::Done(result) => (true, result),
        Report::Negative(result) => (false, result),
    };
    json!({ "ok": ok, "action": action, "result": result }).to_string()
}

pub fn error_line(action: &str, err: &anyhow::Error) -> String {
    json!({ "ok": false, "action": action, "error": format!("{err:#}") }).to_string()
}
