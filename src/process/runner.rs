// Child process runner with streaming output, timeout and cancellation

use crate::process::cancel::CancelToken;
use crate::process::config::RunnerConfig;
use crate::process::terminator::{ProcessTerminator, default_terminator};
use crate::process::types::{OutputSink, ProcessResult, SIGNAL_EXIT_CODE, StreamKind};
use crate::template::Invocation;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type LineBuffer = Arc<Mutex<Vec<String>>>;

/// Spawns one child per call and owns it until the call returns
pub struct ProcessRunner {
    config: RunnerConfig,
    terminator: Arc<dyn ProcessTerminator>,
}

impl ProcessRunner {
    pub fn new(config: RunnerConfig, terminator: Arc<dyn ProcessTerminator>) -> Self {
        debug!(
            poll_ms = config.poll_interval.as_millis() as u64,
            grace_ms = config.grace_period.as_millis() as u64,
            terminator = terminator.name(),
            "initializing process runner"
        );
        Self { config, terminator }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run `executable` with `argv` until it exits, times out or is cancelled.
    ///
    /// Never fails: a launch failure comes back as a result carrying
    /// `LAUNCH_FAILURE_EXIT_CODE` with the OS error in `stderr_text`.
    pub async fn run(
        &self,
        executable: &Path,
        argv: &[String],
        timeout: Duration,
        cancel: &CancelToken,
        on_output_line: Option<OutputSink>,
    ) -> ProcessResult {
        let invocation = Invocation::for_target(executable, argv);
        debug!(
            command = %invocation.display_line(),
            via_shell = invocation.via_shell,
            timeout_ms = timeout.as_millis() as u64,
            "spawning tool process"
        );

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(executable = %executable.display(), error = %e, "failed to launch tool process");
                return ProcessResult::launch_failed(format!(
                    "failed to launch {}: {}",
                    executable.display(),
                    e
                ));
            }
        };
        let pid = child.id();

        let stdout_lines: LineBuffer = Arc::default();
        let stderr_lines: LineBuffer = Arc::default();
        let readers: Vec<JoinHandle<()>> = [
            spawn_reader(
                child.stdout.take(),
                StreamKind::Stdout,
                stdout_lines.clone(),
                on_output_line.clone(),
            ),
            spawn_reader(
                child.stderr.take(),
                StreamKind::Stderr,
                stderr_lines.clone(),
                on_output_line,
            ),
        ]
        .into_iter()
        .flatten()
        .collect();

        let started = Instant::now();
        let mut was_cancelled = false;
        let mut timed_out = false;

        let exit_code = loop {
            if cancel.is_cancel_requested() {
                info!(pid, "cancellation requested, terminating tool process");
                was_cancelled = true;
                break self.terminate(&mut child, pid).await;
            }
            // A child that already exited is never reported as timed out
            match child.try_wait() {
                Ok(Some(status)) => break exit_code_of(status),
                Ok(None) => {}
                Err(e) => {
                    warn!(pid, error = %e, "failed to poll tool process, terminating");
                    break self.terminate(&mut child, pid).await;
                }
            }
            if started.elapsed() >= timeout {
                warn!(pid, timeout_ms = timeout.as_millis() as u64, "tool process timed out");
                timed_out = true;
                break self.terminate(&mut child, pid).await;
            }
            tokio::time::sleep(self.config.poll_interval).await;
        };

        self.join_readers(readers).await;

        // Cancellation intent wins over an exit that raced it
        if cancel.is_cancel_requested() {
            was_cancelled = true;
        }

        let result = ProcessResult {
            exit_code,
            stdout_text: drain(&stdout_lines),
            stderr_text: drain(&stderr_lines),
            was_cancelled,
            timed_out,
        };

        info!(
            pid,
            exit_code = result.exit_code,
            was_cancelled = result.was_cancelled,
            timed_out = result.timed_out,
            duration_ms = started.elapsed().as_millis() as u64,
            stdout_bytes = result.stdout_text.len(),
            stderr_bytes = result.stderr_text.len(),
            "tool process finished"
        );
        result
    }

    /// Graceful request, grace period, then forced kill of the whole tree
    async fn terminate(&self, child: &mut Child, pid: Option<u32>) -> i32 {
        if let Some(pid) = pid {
            if let Err(e) = self.terminator.request_exit(pid) {
                warn!(pid, error = %e, "graceful exit request failed");
            }
        }

        let status = match tokio::time::timeout(self.config.grace_period, child.wait()).await {
            Ok(Ok(status)) => Some(status),
            Ok(Err(e)) => {
                warn!(pid, error = %e, "failed waiting for tool process");
                None
            }
            Err(_) => {
                debug!(pid, "grace period elapsed, forcing kill");
                None
            }
        };

        // Sweep descendants even when the leader already left
        if let Some(pid) = pid {
            if let Err(e) = self.terminator.force_kill(pid) {
                warn!(pid, error = %e, "forced kill failed");
            }
        }

        match status {
            Some(status) => exit_code_of(status),
            None => match child.kill().await {
                Ok(()) => match child.wait().await {
                    Ok(status) => exit_code_of(status),
                    Err(_) => SIGNAL_EXIT_CODE,
                },
                Err(e) => {
                    warn!(pid, error = %e, "failed to kill tool process handle");
                    SIGNAL_EXIT_CODE
                }
            },
        }
    }

    /// Wait for both readers, giving up after the join timeout
    async fn join_readers(&self, readers: Vec<JoinHandle<()>>) {
        let deadline = tokio::time::Instant::now() + self.config.reader_join_timeout;
        for mut handle in readers {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "output reader task failed"),
                Err(_) => {
                    warn!("output reader still open after join timeout, returning partial output");
                    handle.abort();
                }
            }
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(RunnerConfig::default(), default_terminator())
    }
}

fn spawn_reader<R>(
    stream: Option<R>,
    kind: StreamKind,
    buffer: LineBuffer,
    sink: Option<OutputSink>,
) -> Option<JoinHandle<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let stream = stream?;
    Some(tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw).await {
                Ok(0) => break,
                Ok(_) => {
                    let decoded = String::from_utf8_lossy(&raw);
                    let line = decoded.trim_end_matches(['\r', '\n']);
                    if let Some(sink) = &sink {
                        sink(kind, line);
                    }
                    if let Ok(mut lines) = buffer.lock() {
                        lines.push(line.to_string());
                    }
                }
                Err(e) => {
                    warn!(stream = kind.as_str(), error = %e, "output stream read failed, keeping partial output");
                    break;
                }
            }
        }
    }))
}

fn drain(buffer: &LineBuffer) -> String {
    buffer
        .lock()
        .map(|lines| lines.join("\n"))
        .unwrap_or_default()
}

fn exit_code_of(status: ExitStatus) -> i32 {
    status.code().unwrap_or(SIGNAL_EXIT_CODE)
}
