use crate::server::logs::{LogBuffer, LogLine, LogStream};
use crate::server::{ProcessId, ServerStatus};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Number of lifecycle events kept per entry.
const MAX_EVENTS: usize = 64;

/// A recorded status transition
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    /// Status entered
    pub status: ServerStatus,
    /// Process the transition belongs to, if any
    pub process: Option<ProcessId>,
    /// Event timestamp
    pub timestamp: Instant,
    /// Event details
    pub details: Option<String>,
}

/// Live, supervisor-written state behind a registry entry.
///
/// The registry hands out read-only projections of this (status, logs,
/// events); only the supervisor calls the mutating methods.
#[derive(Debug)]
pub struct ServerRuntime {
    status: ServerStatus,
    process: Option<ProcessId>,
    stop_requested: bool,
    logs: LogBuffer,
    events: VecDeque<LifecycleEvent>,
    tool_count: Option<usize>,
}

impl ServerRuntime {
    pub fn new() -> Self {
        Self {
            status: ServerStatus::Unknown,
            process: None,
            stop_requested: false,
            logs: LogBuffer::default(),
            events: VecDeque::new(),
            tool_count: None,
        }
    }

    pub fn status(&self) -> ServerStatus {
        self.status
    }

    pub fn process(&self) -> Option<ProcessId> {
        self.process
    }

    pub fn logs(&self) -> &LogBuffer {
        &self.logs
    }

    pub fn events(&self) -> impl Iterator<Item = &LifecycleEvent> {
        self.events.iter()
    }

    pub fn tool_count(&self) -> Option<usize> {
        self.tool_count
    }

    pub(crate) fn set_tool_count(&mut self, count: Option<usize>) {
        self.tool_count = count;
    }

    pub(crate) fn set_log_capacity(&mut self, capacity: usize) {
        self.logs.set_capacity(capacity);
    }

    pub(crate) fn append_log(&mut self, stream: LogStream, text: impl Into<String>) {
        self.logs.push(LogLine::new(stream, text));
    }

    /// Appends a line of process output if `id` is still the tracked process.
    ///
    /// Returns `false` once that process has exited; its reader should stop.
    pub(crate) fn append_output(
        &mut self,
        id: ProcessId,
        stream: LogStream,
        text: impl Into<String>,
    ) -> bool {
        if self.process != Some(id) {
            return false;
        }
        self.append_log(stream, text);
        true
    }

    /// A new process is up; clears any stale stop request.
    pub(crate) fn mark_started(&mut self, id: ProcessId, details: String) {
        self.stop_requested = false;
        self.process = Some(id);
        self.append_log(LogStream::Supervisor, details.clone());
        self.record(ServerStatus::Running, Some(details));
    }

    pub(crate) fn mark_spawn_failed(&mut self, details: String) {
        self.process = None;
        self.append_log(LogStream::Supervisor, details.clone());
        self.record(ServerStatus::Error, Some(details));
    }

    /// Flags the exit of process `id` as deliberate.
    ///
    /// Returns `false` without touching the flag when `id` is no longer the
    /// tracked process.
    pub(crate) fn request_stop(&mut self, id: ProcessId) -> bool {
        if self.process != Some(id) {
            return false;
        }
        self.stop_requested = true;
        true
    }

    /// Applies an exit event and returns the resulting status.
    ///
    /// The stop flag is consumed here and nowhere else.
    pub(crate) fn mark_exited(&mut self, id: ProcessId, details: String) -> ServerStatus {
        if self.process != Some(id) {
            // Exit of a process this runtime no longer tracks
            self.append_log(LogStream::Supervisor, details);
            return self.status;
        }

        let status = if std::mem::take(&mut self.stop_requested) {
            ServerStatus::Stopped
        } else {
            ServerStatus::Error
        };
        self.process = None;
        self.append_log(LogStream::Supervisor, details.clone());
        self.record(status, Some(details));
        status
    }

    fn record(&mut self, status: ServerStatus, details: Option<String>) {
        self.status = status;
        if self.events.len() >= MAX_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(LifecycleEvent {
            status,
            process: self.process,
            timestamp: Instant::now(),
            details,
        });
    }
}

/// Locks a runtime, recovering the guard if a previous holder panicked.
pub(crate) fn lock(runtime: &Mutex<ServerRuntime>) -> MutexGuard<'_, ServerRuntime> {
    runtime.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for ServerRuntime {
    fn default() -> Self {
        Self::new()
    }
}
