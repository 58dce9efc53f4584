// ABOUTME: Live output streaming for long-running processes.
// ABOUTME: Lines go to a caller-supplied sink; only a bounded tail is retained.

use std::collections::VecDeque;

/// Which pipe a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// A single line of process output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub content: String,
}

/// Receives output lines while a process is still running.
pub trait OutputSink: Send + Sync {
    fn line(&self, line: &OutputLine);
}

impl<F> OutputSink for F
where
    F: Fn(&OutputLine) + Send + Sync,
{
    fn line(&self, line: &OutputLine) {
        self(line)
    }
}

/// Ring buffer of the most recent lines.
#[derive(Debug, Clone)]
pub struct TailBuffer {
    capacity: usize,
    lines: VecDeque<String>,
}

impl TailBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            lines: VecDeque::with_capacity(capacity.min(256)),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines.into()
    }
}

/// Result of a streamed execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamedOutput {
    pub exit_code: i32,
    /// Last lines of combined output, oldest first.
    pub tail: Vec<String>,
}

impl StreamedOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn tail_text(&self) -> String {
        self.tail.join("\n")
    }
}
