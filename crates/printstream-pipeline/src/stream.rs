//! Stream stage interface
//!
//! The pipeline is a chain of stages, each exclusively owning the stage
//! beneath it. A stage is pulled one line at a time and never blocks; it may
//! also be told where the device actually ended up, which it merges into its
//! own tracking and forwards down the chain.

use printstream_core::MoveSnapshot;
use std::collections::VecDeque;

/// One stage in the G-code pipeline
pub trait GcodeStream {
    /// Pull the next line; `None` means the stream is exhausted
    ///
    /// An empty string is a valid result: it marks a line the stage
    /// suppressed and costs the consumer nothing to skip.
    fn read_line(&mut self) -> Option<String>;

    /// Merge an externally reported position into the stage's tracking
    ///
    /// Reported fields override tracked ones; unreported fields keep the
    /// stage's own knowledge. Stages forward the merged snapshot inward.
    fn set_printer_position(&mut self, position: MoveSnapshot);
}

/// The innermost stage: a fixed program fed line by line
///
/// Used by the CLI front end and by tests; a live host would put its file
/// reader or network receiver behind the same trait.
#[derive(Debug, Default)]
pub struct ProgramSource {
    lines: VecDeque<String>,
    reported: MoveSnapshot,
}

impl ProgramSource {
    /// Create a source from individual lines
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            reported: MoveSnapshot::unknown(),
        }
    }

    /// Create a source by splitting a whole program on line breaks
    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines().map(|l| l.trim_end_matches('\r')))
    }

    /// The last position reported down the chain
    pub fn reported_position(&self) -> MoveSnapshot {
        self.reported
    }
}

impl GcodeStream for ProgramSource {
    fn read_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }

    fn set_printer_position(&mut self, position: MoveSnapshot) {
        self.reported = self.reported.merged_with(&position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_source_yields_in_order() {
        let mut source = ProgramSource::from_text("G28\nG1 X10\r\nG1 Y5\n");
        assert_eq!(source.read_line().as_deref(), Some("G28"));
        assert_eq!(source.read_line().as_deref(), Some("G1 X10"));
        assert_eq!(source.read_line().as_deref(), Some("G1 Y5"));
        assert_eq!(source.read_line(), None);
    }

    #[test]
    fn test_reported_position_merges() {
        let mut source = ProgramSource::new(["G28"]);
        source.set_printer_position(MoveSnapshot {
            x: Some(1.0),
            ..MoveSnapshot::unknown()
        });
        source.set_printer_position(MoveSnapshot {
            y: Some(2.0),
            ..MoveSnapshot::unknown()
        });
        let reported = source.reported_position();
        assert_eq!(reported.x, Some(1.0));
        assert_eq!(reported.y, Some(2.0));
    }
}
