//! Caller-supplied diagnostics sink.
//!
//! Every query reports through two channels: a "main flow" channel for scan
//! progress and match counts, and a "tool stderr" channel for per-operation
//! failures. Queries never return errors to the caller; this sink is where
//! those failures become visible.

use std::sync::Mutex;

/// Two-channel diagnostics sink injected into every query.
pub trait Diagnostics: Send + Sync {
    /// Informational progress (scan started, match counts).
    fn progress(&self, message: &str);

    /// A failure that was absorbed by the query (unreadable file, bad pattern).
    fn tool_error(&self, message: &str);
}

/// Emits diagnostics as `tracing` events.
///
/// Progress goes to target `scout::main_flow` at INFO, failures to
/// `scout::tool_stderr` at WARN.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn progress(&self, message: &str) {
        tracing::info!(target: "scout::main_flow", "{}", message);
    }

    fn tool_error(&self, message: &str) {
        tracing::warn!(target: "scout::tool_stderr", "{}", message);
    }
}

/// Which channel a recorded message was sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    MainFlow,
    ToolStderr,
}

/// Records every message in memory.
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    entries: Mutex<Vec<(Channel, String)>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded messages in emission order
    pub fn entries(&self) -> Vec<(Channel, String)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages(Channel::ToolStderr)
    }

    pub fn progress_messages(&self) -> Vec<String> {
        self.messages(Channel::MainFlow)
    }

    fn messages(&self, channel: Channel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, m)| m)
            .collect()
    }

    fn record(&self, channel: Channel, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((channel, message.to_string()));
        }
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn progress(&self, message: &str) {
        self.record(Channel::MainFlow, message);
    }

    fn tool_error(&self, message: &str) {
        self.record(Channel::ToolStderr, message);
    }
}
