use crate::config::validator;
use crate::error::{Error, Result};
use crate::notifier::Notifier;
use crate::registry::{ServerEntry, ServerKey};
use crate::server::lifecycle::{self, ServerRuntime};
use crate::server::logs::{DEFAULT_LOG_CAPACITY, LogStream};
use crate::server::process::{self, ProcessId, Termination};
use async_process::Child;
use futures::future::join_all;
use futures_lite::io::{AsyncBufReadExt, BufReader};
use futures_lite::{AsyncRead, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Supervisor tunables
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    /// Grace period between the termination signal and a forced kill
    pub stop_timeout: Duration,
    /// How long to wait for the exit event after a forced kill
    pub kill_timeout: Duration,
    /// Lines of output kept per server
    pub log_capacity: usize,
    /// How long an exited process's output readers may keep flushing
    pub drain_timeout: Duration,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            stop_timeout: Duration::from_secs(5),
            kill_timeout: Duration::from_secs(2),
            log_capacity: DEFAULT_LOG_CAPACITY,
            drain_timeout: Duration::from_millis(100),
        }
    }
}

/// How a successful stop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Exited within the grace period.
    Graceful,
    /// Ignored termination and was killed; the exit is confirmed.
    Killed,
}

/// Result of [`ProcessSupervisor::stop_all`].
#[derive(Debug, Default)]
pub struct StopAllReport {
    /// Servers that exited within the grace period
    pub stopped: Vec<ServerKey>,
    /// Servers that had to be killed or could not be stopped
    pub failed: Vec<(ServerKey, Error)>,
}

impl StopAllReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// One aggregated message for all failures, if any.
    pub fn summary(&self) -> Option<String> {
        if self.failed.is_empty() {
            return None;
        }

        let detail = self
            .failed
            .iter()
            .map(|(key, e)| format!("{}: {}", key, e))
            .collect::<Vec<_>>()
            .join("; ");
        Some(format!(
            "{} of {} servers failed to stop cleanly: {}",
            self.failed.len(),
            self.failed.len() + self.stopped.len(),
            detail
        ))
    }
}

/// Supervisor-side view of one running process.
struct ProcessHandle {
    id: ProcessId,
    pid: u32,
    control: mpsc::UnboundedSender<Termination>,
    exited: watch::Receiver<bool>,
    runtime: Arc<Mutex<ServerRuntime>>,
}

/// Starts, stops and watches server processes.
///
/// Owns the only mapping from [`ServerKey`] to a live process. Entries see
/// the effect through their status and log projections. Clones share the
/// same process table.
///
/// Lifecycle operations (`start`, `stop`, `restart`, `stop_all`) are
/// instrumented with `tracing` spans.
#[derive(Clone)]
pub struct ProcessSupervisor {
    handles: Arc<Mutex<HashMap<ServerKey, ProcessHandle>>>,
    settings: SupervisorSettings,
    notifier: Notifier,
}

impl ProcessSupervisor {
    pub fn new(settings: SupervisorSettings, notifier: Notifier) -> Self {
        Self {
            handles: Arc::new(Mutex::new(HashMap::new())),
            settings,
            notifier,
        }
    }

    pub fn settings(&self) -> &SupervisorSettings {
        &self.settings
    }

    /// Spawn a process for `entry`.
    ///
    /// Fails without side effects when the entry is disabled or already has a
    /// process; a second `start` is never a restart. A spawn failure marks the
    /// entry `error`.
    #[tracing::instrument(skip(self, entry), fields(server = %entry.key()))]
    pub async fn start(&self, entry: &ServerEntry) -> Result<ProcessId> {
        let key = entry.key().clone();
        let config = entry.config();

        if config.is_disabled() {
            tracing::warn!("Refusing to start disabled server");
            return Err(Error::Disabled(key.to_string()));
        }

        let (mut child, id, control_rx, exited_tx) = {
            let mut handles = self.lock_handles()?;
            if handles.contains_key(&key) {
                tracing::warn!("Server already has a running process");
                return Err(Error::AlreadyRunning(key.to_string()));
            }

            let spawned = validator::validate_launchable(&key.name, config)
                .and_then(|()| process::spawn(config));
            let child = match spawned {
                Ok(child) => child,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to start server process");
                    lifecycle::lock(entry.runtime()).mark_spawn_failed(e.to_string());
                    drop(handles);
                    self.notifier.notify();
                    return Err(e);
                }
            };

            let id = ProcessId::new();
            let (control_tx, control_rx) = mpsc::unbounded_channel();
            let (exited_tx, exited_rx) = watch::channel(false);
            {
                let mut runtime = lifecycle::lock(entry.runtime());
                runtime.set_log_capacity(self.settings.log_capacity);
                runtime.mark_started(
                    id,
                    format!("Started '{}' (pid {})", config.command_line(), child.id()),
                );
            }
            handles.insert(
                key.clone(),
                ProcessHandle {
                    id,
                    pid: child.id(),
                    control: control_tx,
                    exited: exited_rx,
                    runtime: Arc::clone(entry.runtime()),
                },
            );
            (child, id, control_rx, exited_tx)
        };

        let pumps = [
            child
                .stdout
                .take()
                .map(|out| spawn_pump(out, LogStream::Stdout, id, &key, entry.runtime())),
            child
                .stderr
                .take()
                .map(|err| spawn_pump(err, LogStream::Stderr, id, &key, entry.runtime())),
        ]
        .into_iter()
        .flatten()
        .collect();

        tokio::spawn(watch_process(Watcher {
            child,
            id,
            key,
            runtime: Arc::clone(entry.runtime()),
            control: control_rx,
            exited: exited_tx,
            pumps,
            handles: Arc::clone(&self.handles),
            notifier: self.notifier.clone(),
            drain_timeout: self.settings.drain_timeout,
        }));

        tracing::info!(process_id = %id, "Server started");
        self.notifier.notify();
        Ok(id)
    }

    /// Terminate the process of `entry` and wait for its exit.
    ///
    /// Sends a graceful termination, waits up to `stop_timeout`, then kills.
    /// The entry only becomes `stopped` once the exit has been observed; if
    /// even the kill is not confirmed the status is left untouched.
    #[tracing::instrument(skip(self, entry), fields(server = %entry.key()))]
    pub async fn stop(&self, entry: &ServerEntry) -> Result<StopOutcome> {
        self.stop_key(entry.key()).await
    }

    /// Stop (when running) and start again.
    ///
    /// The new process is only spawned after the old one's exit is confirmed
    /// within the grace period; a process that had to be killed fails the
    /// restart instead.
    #[tracing::instrument(skip(self, entry), fields(server = %entry.key()))]
    pub async fn restart(&self, entry: &ServerEntry) -> Result<ProcessId> {
        if self.is_running(entry) {
            match self.stop_key(entry.key()).await {
                Ok(StopOutcome::Graceful) => {}
                Ok(StopOutcome::Killed) => {
                    tracing::error!("Not restarting: previous process ignored termination");
                    return Err(Error::Timeout(format!(
                        "Server '{}' did not stop within {:?}",
                        entry.key(),
                        self.settings.stop_timeout
                    )));
                }
                // Exited on its own in the meantime
                Err(Error::NotRunning(_)) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Not restarting: stop failed");
                    return Err(e);
                }
            }
        }

        self.start(entry).await
    }

    /// Stop every tracked process, best effort.
    ///
    /// Stops run concurrently. Anything that needed a forced kill or could
    /// not be stopped is reported in `failed`. Must run before teardown.
    #[tracing::instrument(skip(self))]
    pub async fn stop_all(&self) -> StopAllReport {
        let keys = self.running();
        tracing::info!(num_servers = keys.len(), "Stopping all servers");

        let results = join_all(keys.iter().map(|key| self.stop_key(key))).await;

        let mut report = StopAllReport::default();
        for (key, result) in keys.into_iter().zip(results) {
            match result {
                Ok(StopOutcome::Graceful) | Err(Error::NotRunning(_)) => report.stopped.push(key),
                Ok(StopOutcome::Killed) => {
                    let e = Error::Timeout(format!(
                        "Server '{}' was killed after ignoring termination",
                        key
                    ));
                    report.failed.push((key, e));
                }
                Err(e) => report.failed.push((key, e)),
            }
        }

        if report.is_clean() {
            tracing::info!("All servers stopped successfully");
        } else {
            tracing::warn!(
                num_failed = report.failed.len(),
                "Some servers failed to stop cleanly"
            );
        }
        self.notifier.notify();
        report
    }

    pub fn is_running(&self, entry: &ServerEntry) -> bool {
        self.read_handles().contains_key(entry.key())
    }

    /// Id of the tracked process for `entry`.
    pub fn process_id(&self, entry: &ServerEntry) -> Option<ProcessId> {
        self.read_handles().get(entry.key()).map(|handle| handle.id)
    }

    /// OS pid of the tracked process for `entry`.
    pub fn pid(&self, entry: &ServerEntry) -> Option<u32> {
        self.read_handles().get(entry.key()).map(|handle| handle.pid)
    }

    /// Keys of all tracked processes, sorted.
    pub fn running(&self) -> Vec<ServerKey> {
        let mut keys: Vec<_> = self.read_handles().keys().cloned().collect();
        keys.sort();
        keys
    }

    async fn stop_key(&self, key: &ServerKey) -> Result<StopOutcome> {
        let (control, mut exited) = {
            let handles = self.lock_handles()?;
            let requested = handles.get(key).and_then(|handle| {
                let mut runtime = lifecycle::lock(&handle.runtime);
                if !runtime.request_stop(handle.id) {
                    return None;
                }
                runtime.append_log(LogStream::Supervisor, "Stop requested");
                Some((handle.control.clone(), handle.exited.clone()))
            });
            match requested {
                Some(channels) => channels,
                None => {
                    tracing::warn!(server = %key, "Attempted to stop a server that is not running");
                    return Err(Error::NotRunning(key.to_string()));
                }
            }
        };

        // A closed channel means the watcher is already finishing the exit
        let _ = control.send(Termination::Graceful);
        if wait_for_exit(&mut exited, self.settings.stop_timeout).await {
            tracing::info!(server = %key, "Server stopped");
            self.notifier.notify();
            return Ok(StopOutcome::Graceful);
        }

        tracing::warn!(
            server = %key,
            grace_period = ?self.settings.stop_timeout,
            "Server ignored termination, killing"
        );
        let _ = control.send(Termination::Forceful);
        if wait_for_exit(&mut exited, self.settings.kill_timeout).await {
            self.notifier.notify();
            return Ok(StopOutcome::Killed);
        }

        tracing::error!(server = %key, "Server did not exit after forced kill");
        self.notifier.notify();
        Err(Error::Timeout(format!(
            "Server '{}' did not exit after being killed",
            key
        )))
    }

    fn lock_handles(&self) -> Result<MutexGuard<'_, HashMap<ServerKey, ProcessHandle>>> {
        self.handles
            .lock()
            .map_err(|_| Error::Other("Failed to lock process handles".to_string()))
    }

    fn read_handles(&self) -> MutexGuard<'_, HashMap<ServerKey, ProcessHandle>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Everything the per-process watcher task owns.
struct Watcher {
    child: Child,
    id: ProcessId,
    key: ServerKey,
    runtime: Arc<Mutex<ServerRuntime>>,
    control: mpsc::UnboundedReceiver<Termination>,
    exited: watch::Sender<bool>,
    pumps: Vec<JoinHandle<()>>,
    handles: Arc<Mutex<HashMap<ServerKey, ProcessHandle>>>,
    notifier: Notifier,
    drain_timeout: Duration,
}

/// Owns the child until it exits, then publishes the exit.
///
/// The stop-requested flag decides between `stopped` and `error`; the
/// handle is removed on every exit, before waiters are released.
async fn watch_process(watcher: Watcher) {
    let Watcher {
        mut child,
        id,
        key,
        runtime,
        mut control,
        exited,
        mut pumps,
        handles,
        notifier,
        drain_timeout,
    } = watcher;

    // Held open until exit; dropping it would close the server's input
    let _stdin = child.stdin.take();

    let exit = loop {
        tokio::select! {
            status = child.status() => break status,
            Some(request) = control.recv() => {
                tracing::debug!(server = %key, ?request, "Delivering termination request");
                if let Err(e) = process::terminate(&mut child, request) {
                    tracing::warn!(server = %key, error = %e, "Failed to deliver termination request");
                }
            }
        }
    };

    let details = match &exit {
        Ok(status) => format!("Process exited ({})", status),
        Err(e) => format!("Lost track of process: {}", e),
    };

    // Let the readers flush trailing output, then cut off any reader whose
    // pipe is still held open by a leftover grandchild
    let drained = tokio::time::timeout(drain_timeout, async {
        for pump in pumps.iter_mut() {
            let _ = pump.await;
        }
    })
    .await;
    if drained.is_err() {
        tracing::debug!(server = %key, "Output still open after exit, closing readers");
        for pump in &pumps {
            pump.abort();
        }
    }

    let status = lifecycle::lock(&runtime).mark_exited(id, details);
    {
        let mut handles = handles.lock().unwrap_or_else(PoisonError::into_inner);
        if handles.get(&key).is_some_and(|handle| handle.id == id) {
            handles.remove(&key);
        }
    }

    tracing::info!(server = %key, process_id = %id, %status, "Server process exited");
    exited.send_replace(true);
    notifier.notify();
}

fn spawn_pump<R>(
    stream: R,
    kind: LogStream,
    id: ProcessId,
    key: &ServerKey,
    runtime: &Arc<Mutex<ServerRuntime>>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let key = key.clone();
    let runtime = Arc::clone(runtime);
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Some(line) = lines.next().await {
            match line {
                Ok(line) => {
                    tracing::trace!(server = %key, stream = ?kind, %line);
                    if !lifecycle::lock(&runtime).append_output(id, kind, line) {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(server = %key, error = %e, "Stopped reading process output");
                    break;
                }
            }
        }
    })
}

async fn wait_for_exit(exited: &mut watch::Receiver<bool>, limit: Duration) -> bool {
    // A closed channel also means the watcher is done
    tokio::time::timeout(limit, exited.wait_for(|done| *done))
        .await
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> ServerKey {
        ServerKey::new(crate::config::Scope::Global, name)
    }

    #[test]
    fn test_clean_report_has_no_summary() {
        let report = StopAllReport {
            stopped: vec![key("a")],
            failed: vec![],
        };
        assert!(report.is_clean());
        assert!(report.summary().is_none());
    }

    #[test]
    fn test_summary_aggregates_failures() {
        let report = StopAllReport {
            stopped: vec![key("a")],
            failed: vec![
                (key("b"), Error::Timeout("slow".to_string())),
                (key("c"), Error::Process("gone".to_string())),
            ],
        };
        let summary = report.summary().unwrap();
        assert!(summary.starts_with("2 of 3 servers failed to stop cleanly"));
        assert!(summary.contains("global:b"));
        assert!(summary.contains("global:c"));
    }

    #[test]
    fn test_default_settings() {
        let settings = SupervisorSettings::default();
        assert_eq!(settings.stop_timeout, Duration::from_secs(5));
        assert_eq!(settings.log_capacity, DEFAULT_LOG_CAPACITY);
    }
}
