//! Bounded per-server output capture.

use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::time::SystemTime;

/// Default number of lines kept per server.
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// Where a captured line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdout,
    Stderr,
    /// Lines written by the supervisor itself (start, exit, signals).
    Supervisor,
}

impl LogStream {
    fn label(&self) -> &'static str {
        match self {
            LogStream::Stdout => "stdout",
            LogStream::Stderr => "stderr",
            LogStream::Supervisor => "supervisor",
        }
    }
}

/// A single captured line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub stream: LogStream,
    pub text: String,
    pub timestamp: SystemTime,
}

impl LogLine {
    pub fn new(stream: LogStream, text: impl Into<String>) -> Self {
        Self {
            stream,
            text: text.into(),
            timestamp: SystemTime::now(),
        }
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stream.label(), self.text)
    }
}

/// Append-only ring buffer; the oldest line is evicted past capacity.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: VecDeque<LogLine>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity.min(DEFAULT_LOG_CAPACITY)),
            capacity,
        }
    }

    pub fn push(&mut self, line: LogLine) {
        while self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Changes the capacity, dropping the oldest lines if it shrinks.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.lines.len() > self.capacity {
            self.lines.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.lines.iter().cloned().collect()
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oldest_line_evicted() {
        let mut buffer = LogBuffer::new(2);
        buffer.push(LogLine::new(LogStream::Stdout, "one"));
        buffer.push(LogLine::new(LogStream::Stdout, "two"));
        buffer.push(LogLine::new(LogStream::Stderr, "three"));

        let texts: Vec<_> = buffer.lines().into_iter().map(|l| l.text).collect();
        assert_eq!(texts, vec!["two", "three"]);
    }

    #[test]
    fn test_shrinking_capacity_trims_front() {
        let mut buffer = LogBuffer::new(10);
        for i in 0..5 {
            buffer.push(LogLine::new(LogStream::Stdout, i.to_string()));
        }
        buffer.set_capacity(3);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.lines()[0].text, "2");
    }

    #[test]
    fn test_display_prefixes_stream() {
        let line = LogLine::new(LogStream::Stderr, "boom");
        assert_eq!(line.to_string(), "[stderr] boom");
    }
}
