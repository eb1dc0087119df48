//! Terminal output normalization
//!
//! Reduces captured process output to what a person watching a live
//! terminal would have seen: escape sequences removed and carriage-return
//! overwrites collapsed to the last write on each line. A `\r` directly
//! before a line break (or at the very end) only ends the line.

use regex::Regex;
use std::sync::LazyLock;

/// ESC followed by a single C1 final byte, or a CSI sequence
static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1B(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])").expect("valid regex")
});

/// Remove ANSI/VT escape sequences
pub fn strip_ansi_codes(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

/// Normalize raw terminal output
pub fn normalize_terminal_output(raw: &str) -> String {
    let stripped = strip_ansi_codes(raw);
    stripped
        .split('\n')
        .map(|line| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            line.rsplit('\r').next().unwrap_or("")
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
