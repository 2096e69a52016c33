//! G-code line model
//!
//! Lightweight, allocation-free classification of single G-code lines. This
//! is not a G-code parser: the pipeline only needs to recognize moves,
//! temperature commands, and tool selects, pull individual numeric
//! parameters out of a line, and strip comments. Everything else passes
//! through it opaquely.
//!
//! Malformed numeric text after a parameter letter is treated as "parameter
//! absent", never as a failure of the whole line.

use crate::data::MoveSnapshot;

/// Classification of a single G-code line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Blank line or comment from the first column
    CommentOnly,
    /// G0/G1 linear move
    Move,
    /// M104 (set) or M109 (set and wait) hotend temperature
    SetTemperature {
        /// True for M109 (block until the target is reached)
        wait: bool,
    },
    /// T<n> tool select
    ToolSelect(usize),
    /// Anything else; passed through untouched
    Other,
}

/// Return the text before the first `;`
///
/// The comment itself (and any markers embedded in it) is left on the
/// original line; callers that re-emit the line re-emit it verbatim.
pub fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Extract the numeric value following the first occurrence of `letter`
///
/// Scans for the first occurrence of the letter and parses the number
/// immediately following it. Returns `None` when the letter is absent or the
/// text after it is not a parseable number.
pub fn param_value(line: &str, letter: char) -> Option<f64> {
    let idx = line.find(letter)?;
    let rest = &line[idx + letter.len_utf8()..];

    let mut end = 0;
    for (i, c) in rest.char_indices() {
        let is_sign = (c == '-' || c == '+') && i == 0;
        if c.is_ascii_digit() || c == '.' || is_sign {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }

    rest[..end].parse::<f64>().ok()
}

/// Check whether the line is a linear move (G0/G1)
pub fn is_movement(line: &str) -> bool {
    let code = strip_comment(line).trim();
    code == "G0" || code == "G1" || code.starts_with("G0 ") || code.starts_with("G1 ")
}

/// Classify a line for the pipeline
pub fn classify(line: &str) -> LineKind {
    let code = strip_comment(line).trim();

    if code.is_empty() {
        return LineKind::CommentOnly;
    }
    if code.starts_with("M104") {
        return LineKind::SetTemperature { wait: false };
    }
    if code.starts_with("M109") {
        return LineKind::SetTemperature { wait: true };
    }
    if code.starts_with('T') {
        if let Some(tool) = param_value(code, 'T') {
            if tool >= 0.0 {
                return LineKind::ToolSelect(tool as usize);
            }
        }
        return LineKind::Other;
    }
    if is_movement(code) {
        return LineKind::Move;
    }
    LineKind::Other
}

/// Parse the positional fields of a move line into a snapshot
///
/// Only the fields the line states are `Some`; comments are ignored. The
/// result is meant to be merged over a prior snapshot.
pub fn parse_move(line: &str) -> MoveSnapshot {
    let code = strip_comment(line);
    MoveSnapshot {
        x: param_value(code, 'X'),
        y: param_value(code, 'Y'),
        z: param_value(code, 'Z'),
        e: param_value(code, 'E'),
        feed_rate: param_value(code, 'F'),
    }
}
