//! History log records.
//!
//! Extended-format lines look like `: <unix_ts>:<duration>;<command>`. The
//! command is everything after the *first* `;`, so commands containing `;`
//! survive a round trip. Lines not in that layout are plain commands.
//!
//! A line ending in `\` continues onto the next physical line. The logical
//! record keeps the backslash-newline pairs so it is written back exactly as
//! it was read.

use std::io::{self, BufRead};

use serde::Serialize;

/// One extended-format history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    pub timestamp: u64,
    pub duration: u64,
    pub command: String,
}

impl HistoryRecord {
    pub fn new(timestamp: u64, duration: u64, command: impl Into<String>) -> Self {
        Self {
            timestamp,
            duration,
            command: command.into(),
        }
    }

    /// A record stamped with the current time.
    pub fn now(duration: u64, command: impl Into<String>) -> Self {
        let timestamp = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
        Self::new(timestamp, duration, command)
    }

    /// Parse an extended-format line; `None` if it is not one.
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix(": ")?;
        let (meta, command) = rest.split_once(';')?;
        let (timestamp, duration) = meta.split_once(':')?;
        Some(Self {
            timestamp: timestamp.trim().parse().ok()?,
            duration: duration.trim().parse().ok()?,
            command: command.to_string(),
        })
    }

    /// The record as a log line, with embedded newlines escaped.
    pub fn to_log_line(&self) -> String {
        format!(": {}:{};{}", self.timestamp, self.duration, escape_newlines(&self.command))
    }
}

impl std::fmt::Display for HistoryRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, ": {}:{};{}", self.timestamp, self.duration, self.command)
    }
}

/// A logical line of the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
    Extended(HistoryRecord),
    Plain(String),
}

impl LogLine {
    pub fn parse(line: &str) -> Self {
        match HistoryRecord::parse(line) {
            Some(record) => LogLine::Extended(record),
            None => LogLine::Plain(line.to_string()),
        }
    }

    pub fn command(&self) -> &str {
        match self {
            LogLine::Extended(record) => &record.command,
            LogLine::Plain(command) => command,
        }
    }
}

impl std::fmt::Display for LogLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLine::Extended(record) => write!(f, "{record}"),
            LogLine::Plain(command) => f.write_str(command),
        }
    }
}

/// A logical record together with its exact bytes in the file.
///
/// zsh may write bytes that are not valid UTF-8; parsing works on a lossy
/// decoding while rewriting uses the original bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    raw: Vec<u8>,
    line: LogLine,
}

impl LogEntry {
    pub fn from_bytes(raw: Vec<u8>) -> Self {
        let line = LogLine::parse(&String::from_utf8_lossy(&raw));
        Self { raw, line }
    }

    pub fn line(&self) -> &LogLine {
        &self.line
    }

    pub fn command(&self) -> &str {
        self.line.command()
    }

    /// Exact bytes of the command text.
    ///
    /// For an extended record this is everything after the first `;`.
    pub fn command_bytes(&self) -> &[u8] {
        match self.line {
            LogLine::Extended(_) => match self.raw.iter().position(|&b| b == b';') {
                Some(at) => &self.raw[at + 1..],
                None => &self.raw,
            },
            LogLine::Plain(_) => &self.raw,
        }
    }

    /// Exact bytes, without the trailing newline.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }
}

/// Iterator over the logical records of a log.
pub struct LogReader<R> {
    reader: R,
}

impl<R: BufRead> LogReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    fn read_physical(&mut self, buf: &mut Vec<u8>) -> io::Result<bool> {
        let start = buf.len();
        let read = self.reader.read_until(b'\n', buf)?;
        if read == 0 {
            return Ok(false);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.len() > start && buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        Ok(true)
    }
}

impl<R: BufRead> Iterator for LogReader<R> {
    type Item = io::Result<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut raw = Vec::new();
        match self.read_physical(&mut raw) {
            Ok(false) => return None,
            Ok(true) => {}
            Err(e) => return Some(Err(e)),
        }

        while raw.last() == Some(&b'\\') {
            raw.push(b'\n');
            match self.read_physical(&mut raw) {
                Ok(true) => {}
                // Dangling continuation at end of file
                Ok(false) => {
                    raw.pop();
                    break;
                }
                Err(e) => return Some(Err(e)),
            }
        }

        Some(Ok(LogEntry::from_bytes(raw)))
    }
}

/// Prefix every unescaped newline with a backslash.
fn escape_newlines(command: &str) -> String {
    let mut out = String::with_capacity(command.len());
    let mut prev = None;
    for c in command.chars() {
        if c == '\n' && prev != Some('\\') {
            out.push('\\');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read_all(text: &str) -> Vec<LogEntry> {
        LogReader::new(text.as_bytes())
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_parse_splits_on_first_semicolon() {
        let record = HistoryRecord::parse(": 1700000000:3;make; make install").unwrap();
        assert_eq!(record, HistoryRecord::new(1700000000, 3, "make; make install"));
        assert_eq!(record.to_string(), ": 1700000000:3;make; make install");
    }

    #[test]
    fn test_plain_lines() {
        assert_eq!(LogLine::parse("git status"), LogLine::Plain("git status".to_string()));
        assert_eq!(LogLine::parse(": nope;ls"), LogLine::Plain(": nope;ls".to_string()));
        assert_eq!(LogLine::parse(": 12:x;ls").command(), ": 12:x;ls");
    }

    #[test]
    fn test_empty_command() {
        let line = LogLine::parse(": 1700000000:0;");
        assert_eq!(line.command(), "");
    }

    #[test]
    fn test_reader_joins_continuations() {
        let entries = read_all(": 1:0;for f in *; do\\\n  echo $f\\\ndone\n: 2:0;ls\n");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].command(), "for f in *; do\\\n  echo $f\\\ndone");
        assert_eq!(
            entries[0].as_bytes(),
            b": 1:0;for f in *; do\\\n  echo $f\\\ndone"
        );
        assert_eq!(entries[1].command(), "ls");
    }

    #[test]
    fn test_reader_handles_missing_final_newline_and_crlf() {
        let entries = read_all(": 1:0;ls\r\n: 2:0;pwd");
        let commands: Vec<_> = entries.iter().map(|e| e.command()).collect();
        assert_eq!(commands, vec!["ls", "pwd"]);
    }

    #[test]
    fn test_reader_keeps_invalid_utf8_bytes() {
        let raw: &[u8] = b": 1:0;echo \x83\xa9\n";
        let entries: Vec<_> = LogReader::new(raw).collect::<io::Result<Vec<_>>>().unwrap();
        assert_eq!(entries[0].as_bytes(), b": 1:0;echo \x83\xa9");
    }

    #[test]
    fn test_command_bytes() {
        let entries = read_all(": 1:0;a;b\nplain;cmd\n");
        assert_eq!(entries[0].command_bytes(), b"a;b");
        assert_eq!(entries[1].command_bytes(), b"plain;cmd");

        let raw = LogEntry::from_bytes(b": 1:0;echo \x83".to_vec());
        assert_eq!(raw.command_bytes(), b"echo \x83");
    }

    #[test]
    fn test_to_log_line_escapes_newlines() {
        let record = HistoryRecord::new(5, 1, "echo a\necho b");
        assert_eq!(record.to_log_line(), ": 5:1;echo a\\\necho b");

        let already = HistoryRecord::new(5, 1, "echo a\\\necho b");
        assert_eq!(already.to_log_line(), ": 5:1;echo a\\\necho b");
    }
}
