//! AppleScript execution.
//!
//! Every interaction with Calendar, Reminders and Notification Center goes
//! through `osascript -e <script>` with a fixed timeout. Scripts report data
//! as pipe-delimited lines; lines starting with `ERROR` are diagnostics.

use std::process::Stdio;
use std::time::Duration;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike};
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use crate::error::{TimecalError, TimecalResult};

pub const SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Prefix of diagnostic lines in script output.
pub const ERROR_MARKER: &str = "ERROR";

const OSASCRIPT: &str = "osascript";

#[derive(Debug, Clone)]
pub struct Osascript {
    program: String,
    timeout: Duration,
}

impl Default for Osascript {
    fn default() -> Self {
        Osascript {
            program: OSASCRIPT.to_string(),
            timeout: SCRIPT_TIMEOUT,
        }
    }
}

impl Osascript {
    /// Run a script and return its trimmed stdout.
    pub async fn run(&self, script: &str) -> TimecalResult<String> {
        timeout(self.timeout, self.run_raw(script))
            .await
            .map_err(|_| TimecalError::ScriptTimeout(self.timeout.as_secs()))?
    }

    async fn run_raw(&self, script: &str) -> TimecalResult<String> {
        tracing::debug!(bytes = script.len(), "running osascript");

        let output = TokioCommand::new(&self.program)
            .arg("-e")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TimecalError::Script(format!("Failed to spawn {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TimecalError::Script(format!(
                "{} exited with status {}: {}",
                self.program,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Encode text as an AppleScript string expression.
///
/// Backslashes and double quotes are escaped; line breaks are spliced in
/// with `linefeed` so every literal stays on one line.
pub fn quote(text: &str) -> String {
    let parts: Vec<String> = text
        .split('\n')
        .map(|line| {
            let escaped = line
                .trim_end_matches('\r')
                .replace('\\', "\\\\")
                .replace('"', "\\\"");
            format!("\"{escaped}\"")
        })
        .collect();

    if parts.len() == 1 {
        parts.concat()
    } else {
        format!("({})", parts.join(" & linefeed & "))
    }
}

/// Encode a list of names as an AppleScript list literal.
pub fn quote_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|i| quote(i)).collect();
    format!("{{{}}}", quoted.join(", "))
}

/// Statements that set `var` to the given local date-time, minute precision.
///
/// The day is reset to 1 before the month is changed so that, for example,
/// running on the 31st cannot roll a 30-day month over.
pub fn date_statements(var: &str, dt: &DateTime<FixedOffset>) -> String {
    date_parts(var, dt.year(), dt.month(), dt.day(), dt.hour(), dt.minute(), 0)
}

/// Statements that set `var` to the start (00:00:00) or end (23:59:59) of a day.
pub fn day_bound_statements(var: &str, date: NaiveDate, end_of_day: bool) -> String {
    let (h, m, s) = if end_of_day { (23, 59, 59) } else { (0, 0, 0) };
    date_parts(var, date.year(), date.month(), date.day(), h, m, s)
}

fn date_parts(var: &str, year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> String {
    format!(
        "set {var} to (current date)
set day of {var} to 1
set year of {var} to {year}
set month of {var} to {month}
set day of {var} to {day}
set hours of {var} to {hour}
set minutes of {var} to {minute}
set seconds of {var} to {second}
"
    )
}

/// Stands in for `|` inside field values; [`ScriptLines::parse`] turns it
/// back into a pipe.
pub const PIPE_STANDIN: char = '¦';

/// Handler that puts free text on one line and swaps its pipes for
/// [`PIPE_STANDIN`], so titles and notes never break the
/// one-record-per-line, pipe-delimited output format.
pub const FLATTEN_HANDLER: &str = r#"
on flatten(theText)
    if theText is missing value then return ""
    set AppleScript's text item delimiters to " "
    set flat to (paragraphs of (theText as text)) as text
    set AppleScript's text item delimiters to "|"
    set pieces to text items of flat
    set AppleScript's text item delimiters to "¦"
    set flat to pieces as text
    set AppleScript's text item delimiters to ""
    return flat
end flatten
"#;

/// Script output split into data records and diagnostics.
#[derive(Debug, Default, PartialEq)]
pub struct ScriptLines {
    pub records: Vec<Vec<String>>,
    pub diagnostics: Vec<String>,
}

impl ScriptLines {
    /// Split output into records of exactly `fields` fields. The last field
    /// keeps any further pipes. Short lines become diagnostics.
    pub fn parse(output: &str, fields: usize) -> Self {
        let mut lines = ScriptLines::default();

        for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if line.starts_with(ERROR_MARKER) {
                lines.diagnostics.push(line.to_string());
                continue;
            }

            let record: Vec<String> = line
                .splitn(fields, '|')
                .map(|field| field.replace(PIPE_STANDIN, "|"))
                .collect();
            if record.len() < fields {
                lines.diagnostics.push(format!("Malformed line: {line}"));
            } else {
                lines.records.push(record);
            }
        }

        lines
    }

    /// Log every diagnostic line.
    pub fn log_diagnostics(&self, context: &str) {
        for diagnostic in &self.diagnostics {
            tracing::warn!(context, "{diagnostic}");
        }
    }
}

/// If the whole output is a single diagnostic, return its message.
pub fn error_message(output: &str) -> Option<&str> {
    let trimmed = output.trim();
    trimmed
        .strip_prefix(ERROR_MARKER)
        .map(|rest| rest.trim_start_matches(':').trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_escapes_delimiters() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote(r#"Say "hi""#), r#""Say \"hi\"""#);
        assert_eq!(quote(r"back\slash"), r#""back\\slash""#);
        // A trailing backslash must not swallow the closing quote
        assert_eq!(quote(r"end\"), r#""end\\""#);
    }

    #[test]
    fn test_quote_splices_line_breaks() {
        assert_eq!(
            quote("Imported - ID: ab12cd34\n#focus"),
            r##"("Imported - ID: ab12cd34" & linefeed & "#focus")"##
        );
    }

    #[test]
    fn test_quote_list() {
        let names = vec!["Work".to_string(), "Side \"Hustle\"".to_string()];
        assert_eq!(quote_list(&names), r#"{"Work", "Side \"Hustle\""}"#);
    }

    #[test]
    fn test_date_statements_drop_seconds() {
        let dt = DateTime::parse_from_rfc3339("2025-02-28T14:05:33+01:00").unwrap();
        let script = date_statements("startDate", &dt);
        assert!(script.contains("set year of startDate to 2025"));
        assert!(script.contains("set month of startDate to 2"));
        assert!(script.contains("set day of startDate to 28"));
        assert!(script.contains("set hours of startDate to 14"));
        assert!(script.contains("set minutes of startDate to 5"));
        assert!(script.contains("set seconds of startDate to 0"));
        assert!(script.find("set day of startDate to 1").unwrap() < script.find("set month").unwrap());
    }

    #[test]
    fn test_parse_lines_separates_diagnostics() {
        let output = "\
ABC-1|Deep Work

ERROR accessing calendar Trash: not found
ABC-2|Notes|with|pipes
garbage";

        let lines = ScriptLines::parse(output, 2);
        assert_eq!(lines.records.len(), 2);
        assert_eq!(lines.records[0], vec!["ABC-1", "Deep Work"]);
        assert_eq!(lines.records[1], vec!["ABC-2", "Notes|with|pipes"]);
        assert_eq!(lines.diagnostics.len(), 2);
        assert!(lines.diagnostics[0].starts_with(ERROR_MARKER));
        assert_eq!(lines.diagnostics[1], "Malformed line: garbage");
    }

    #[test]
    fn test_flattened_pipes_restored_per_field() {
        assert!(FLATTEN_HANDLER.contains(&format!("delimiters to \"{PIPE_STANDIN}\"")));

        let lines = ScriptLines::parse("E1|Review ¦ plan|Growth", 3);
        assert_eq!(lines.records[0], vec!["E1", "Review | plan", "Growth"]);
    }

    #[test]
    fn test_error_message() {
        assert_eq!(error_message("ERROR: Can't get calendar \"Nope\"."), Some("Can't get calendar \"Nope\"."));
        assert_eq!(error_message("NOT_EXISTS"), None);
    }
}
