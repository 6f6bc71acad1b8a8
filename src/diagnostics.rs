// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Diagnostics channel for script evaluation
//!
//! Evaluation problems are never fatal; they are reported as text lines
//! through a [`LogSink`] handed to the interpreter.

use std::cell::RefCell;

/// Receiver of evaluation messages
pub trait LogSink {
    fn log(&self, message: &str);
}

/// Forward messages to `tracing`, picking the level from the message prefix
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, message: &str) {
        match Severity::of(message) {
            Severity::Error => tracing::error!(target: "scadforge::script", "{}", message),
            Severity::Warning => tracing::warn!(target: "scadforge::script", "{}", message),
            Severity::Debug => tracing::debug!(target: "scadforge::script", "{}", message),
            Severity::Info => tracing::info!(target: "scadforge::script", "{}", message),
        }
    }
}

/// Collects messages in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: RefCell<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    /// True if any message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.borrow().iter().any(|m| m.contains(needle))
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.borrow_mut())
    }
}

impl LogSink for MemorySink {
    fn log(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _message: &str) {}
}

/// Level inferred from a message prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Debug,
    Info,
}

impl Severity {
    pub fn of(message: &str) -> Self {
        if message.starts_with("ERROR:") {
            Severity::Error
        } else if message.starts_with("WARNING:") {
            Severity::Warning
        } else if message.starts_with("DEBUG:") {
            Severity::Debug
        } else {
            Severity::Info
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_prefix() {
        assert_eq!(Severity::of("ERROR: unknown module foo"), Severity::Error);
        assert_eq!(Severity::of("WARNING: invalid color"), Severity::Warning);
        assert_eq!(Severity::of("DEBUG: cache hit"), Severity::Debug);
        assert_eq!(Severity::of("ECHO: 1"), Severity::Info);
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        sink.log("ECHO: 1");
        sink.log("ERROR: boom");
        assert!(sink.contains("boom"));
        assert_eq!(sink.take().len(), 2);
        assert!(sink.messages().is_empty());
    }
}
