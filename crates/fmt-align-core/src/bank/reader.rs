//! Streaming reader for JSON-lines event files

use super::MemoryEvent;
use crate::error::{AlignError, Result, ResultExt};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Extension of event files, without the leading dot
pub const EVENT_FILE_EXTENSION: &str = "jsonl";

/// Reads one [`MemoryEvent`] per line. Blank lines are skipped.
#[derive(Debug)]
pub struct EventFileReader<R> {
    lines: std::io::Lines<R>,
    line_number: usize,
}

impl EventFileReader<BufReader<File>> {
    /// Open an event file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(AlignError::from)
            .with_context(|| format!("opening event file {}", path.display()))?;
        tracing::info!("Reading events from {}", path.display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> EventFileReader<R> {
    /// Read events from any buffered source
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }
}

/// Whether a path carries the event file extension
pub fn has_event_extension(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .is_some_and(|ext| ext == EVENT_FILE_EXTENSION)
}

impl<R: BufRead> Iterator for EventFileReader<R> {
    type Item = Result<MemoryEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            let line_number = self.line_number;
            return Some(
                serde_json::from_str(&line)
                    .map_err(AlignError::from)
                    .with_context(|| format!("event on line {line_number}")),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{DataEvent, TRACK_BANK};
    use std::io::Cursor;

    #[test]
    fn test_reads_events_and_skips_blank_lines() {
        let data = "{}\n\n{\"REC::Track\": {\"sector\": {\"byte\": [1]}}}\n";
        let events: Vec<_> = EventFileReader::new(Cursor::new(data))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(events.len(), 2);
        assert!(events[0].bank(TRACK_BANK).is_none());
        assert!(events[1].bank(TRACK_BANK).is_some());
    }

    #[test]
    fn test_reports_line_of_bad_event() {
        let data = "{}\n\nnot json\n";
        let mut reader = EventFileReader::new(Cursor::new(data));

        assert!(reader.next().unwrap().is_ok());
        let err = reader.next().unwrap().unwrap_err();
        assert!(err.to_string().starts_with("event on line 3"));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_extension() {
        assert!(has_event_extension("run_5038.jsonl"));
        assert!(!has_event_extension("run_5038.hipo"));
        assert!(!has_event_extension("jsonl"));
    }
}
