//! Structured JSON logger
//!
//! Per OBSERVABILITY.md:
//! - One log line = one event, JSON-encoded
//! - Deterministic key ordering (event, severity, run_id, then fields sorted)
//! - Synchronous writes, no buffering

use std::fmt;
use std::io::{self, Write};

/// Log severity levels per OBSERVABILITY.md
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Normal pipeline progress
    Info = 0,
    /// Recoverable or operator-attention conditions
    Warn = 1,
    /// Stage failures
    Error = 2,
    /// Failures after persistent state was mutated
    Fatal = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured logger for recovery pipeline events.
///
/// Every line carries the recovery run id so interleaved operator terminals
/// can be correlated after the fact.
pub struct Logger;

impl Logger {
    /// Log an event with the given severity and fields.
    ///
    /// Fields are output in deterministic order (alphabetical by key).
    pub fn log(severity: Severity, event: &str, run_id: &str, fields: &[(&str, &str)]) {
        if severity >= Severity::Error {
            Self::log_to_writer(severity, event, run_id, fields, &mut io::stderr());
        } else {
            Self::log_to_writer(severity, event, run_id, fields, &mut io::stdout());
        }
    }

    fn log_to_writer<W: Write>(
        severity: Severity,
        event: &str,
        run_id: &str,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) {
        // Manual JSON keeps key ordering deterministic
        let mut output = String::with_capacity(256);

        output.push('{');

        output.push_str("\"event\":\"");
        Self::escape_json_string(&mut output, event);
        output.push('"');

        output.push_str(",\"severity\":\"");
        output.push_str(severity.as_str());
        output.push('"');

        output.push_str(",\"run_id\":\"");
        Self::escape_json_string(&mut output, run_id);
        output.push('"');

        let mut sorted_fields: Vec<_> = fields.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted_fields {
            output.push_str(",\"");
            Self::escape_json_string(&mut output, key);
            output.push_str("\":\"");
            Self::escape_json_string(&mut output, value);
            output.push('"');
        }

        output.push('}');
        output.push('\n');

        let _ = writer.write_all(output.as_bytes());
        let _ = writer.flush();
    }

    fn escape_json_string(output: &mut String, s: &str) {
        for c in s.chars() {
            match c {
                '"' => output.push_str("\\\""),
                '\\' => output.push_str("\\\\"),
                '\n' => output.push_str("\\n"),
                '\r' => output.push_str("\\r"),
                '\t' => output.push_str("\\t"),
                c if c.is_control() => {
                    output.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => output.push(c),
            }
        }
    }

    pub fn info(event: &str, run_id: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, run_id, fields);
    }

    pub fn warn(event: &str, run_id: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, run_id, fields);
    }

    pub fn error(event: &str, run_id: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, run_id, fields);
    }

    pub fn fatal(event: &str, run_id: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Fatal, event, run_id, fields);
    }
}

#[cfg(test)]
pub fn capture_log(
    severity: Severity,
    event: &str,
    run_id: &str,
    fields: &[(&str, &str)],
) -> String {
    let mut buffer = Vec::new();
    Logger::log_to_writer(severity, event, run_id, fields, &mut buffer);
    String::from_utf8(buffer).unwrap()
}
