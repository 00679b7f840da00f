//! Direct process invocation of the ctdb binary
//!
//! Arguments are always passed as an explicit argv. When elevation is enabled
//! the command becomes `<sudo> -n <ctdb> <args...>`; no shell is involved, so
//! argument boundaries survive unchanged.
//!
//! Each invocation runs in its own process group. On timeout the whole group
//! gets SIGTERM (which sudo relays to ctdb), then SIGKILL after a short grace
//! period, and the direct child is reaped before the error is returned.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::runtime::{Builder, Handle};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::runner::CommandRunner;
use crate::utils::ExecutionError;

/// Time the process group gets to exit after SIGTERM
const TERM_GRACE: Duration = Duration::from_millis(200);

/// Runs ctdb as a child process with a bounded execution time
#[derive(Debug, Clone)]
pub struct CtdbCommand {
    /// Path to the ctdb binary
    ctdb_bin: PathBuf,
    /// sudo binary, when elevation is enabled
    sudo: Option<PathBuf>,
    /// Upper bound for a single invocation
    timeout: Duration,
}

impl CtdbCommand {
    /// Create a runner for the given ctdb binary
    pub fn new(ctdb_bin: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ctdb_bin: ctdb_bin.into(),
            sudo: None,
            timeout,
        }
    }

    /// Run every invocation through `sudo -n`
    pub fn with_sudo(mut self, sudo_bin: impl Into<PathBuf>) -> Self {
        self.sudo = Some(sudo_bin.into());
        self
    }

    /// Build the program and argv for an invocation
    ///
    /// A single compound token such as `"status -Y"` is split on whitespace,
    /// so both calling conventions produce the same argv. Separately passed
    /// arguments are kept as they are.
    pub fn argv(&self, args: &[&str]) -> (PathBuf, Vec<String>) {
        let ctdb_args: Vec<String> = match args {
            [compound] => compound.split_whitespace().map(String::from).collect(),
            _ => args.iter().map(|arg| arg.to_string()).collect(),
        };

        match self.sudo {
            Some(ref sudo) => {
                let mut argv = vec![
                    "-n".to_string(),
                    self.ctdb_bin.to_string_lossy().into_owned(),
                ];
                argv.extend(ctdb_args);
                (sudo.clone(), argv)
            }
            None => (self.ctdb_bin.clone(), ctdb_args),
        }
    }

    fn command(program: &Path, argv: &[String]) -> Command {
        let mut std_cmd = std::process::Command::new(program);
        std_cmd
            .args(argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_cmd.process_group(0);
        }

        let mut cmd = Command::from(std_cmd);
        cmd.kill_on_drop(true);
        cmd
    }

    async fn execute(
        &self,
        program: &Path,
        argv: &[String],
        invocation: String,
    ) -> Result<String, ExecutionError> {
        let mut child = Self::command(program, argv)
            .spawn()
            .map_err(|source| ExecutionError::Spawn {
                invocation: invocation.clone(),
                source,
            })?;

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        // Pipes are read while waiting; a full pipe would stall the child
        let waited = timeout(self.timeout, async {
            let (status, _, _) = tokio::join!(
                child.wait(),
                read_pipe(stdout_pipe.as_mut(), &mut stdout),
                read_pipe(stderr_pipe.as_mut(), &mut stderr),
            );
            status
        })
        .await;

        match waited {
            Ok(Ok(status)) => finish(invocation, status, combine(stdout, stderr)),
            Ok(Err(source)) => {
                terminate(&mut child, &invocation).await;
                Err(ExecutionError::Spawn { invocation, source })
            }
            Err(_) => {
                let timeout_ms = self.timeout.as_millis() as u64;
                warn!(command = %invocation, timeout_ms, "ctdb timed out");
                terminate(&mut child, &invocation).await;
                Err(ExecutionError::Timeout {
                    invocation,
                    timeout_ms,
                    output: combine(stdout, stderr),
                })
            }
        }
    }
}

impl CommandRunner for CtdbCommand {
    /// Blocks until the invocation finishes or times out
    ///
    /// Inside a tokio runtime this must be called from a blocking context
    /// such as `spawn_blocking`; outside one a current-thread runtime is
    /// built for the call.
    fn run(&self, args: &[&str]) -> Result<String, ExecutionError> {
        let (program, argv) = self.argv(args);
        let invocation = render_invocation(&program, &argv);
        debug!(command = %invocation, "running ctdb");

        let execution = self.execute(&program, &argv, invocation.clone());
        match Handle::try_current() {
            Ok(handle) => handle.block_on(execution),
            Err(_) => {
                let runtime = Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|source| ExecutionError::Spawn { invocation, source })?;
                runtime.block_on(execution)
            }
        }
    }
}

fn finish(invocation: String, status: ExitStatus, output: String) -> Result<String, ExecutionError> {
    if status.success() {
        Ok(output)
    } else {
        Err(ExecutionError::Failed {
            invocation,
            status: status.to_string(),
            output,
        })
    }
}

/// Stop the child's process group and reap the child
async fn terminate(child: &mut Child, invocation: &str) {
    #[cfg(unix)]
    {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = child.id() {
            let group = Pid::from_raw(pid as i32);
            let signal_group = |signal: Signal| match killpg(group, signal) {
                Ok(()) | Err(Errno::ESRCH) => {}
                Err(e) => warn!(command = %invocation, ?signal, error = %e, "failed to signal process group"),
            };

            signal_group(Signal::SIGTERM);
            if timeout(TERM_GRACE, child.wait()).await.is_err() {
                debug!(command = %invocation, "still running after SIGTERM");
            }
            // Anything left in the group, including children that outlived the leader
            signal_group(Signal::SIGKILL);
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = child.start_kill() {
            warn!(command = %invocation, error = %e, "failed to kill ctdb");
        }
    }

    match child.wait().await {
        Ok(status) => debug!(command = %invocation, %status, "reaped ctdb"),
        Err(e) => warn!(command = %invocation, error = %e, "failed to reap ctdb"),
    }
}

async fn read_pipe<P: AsyncRead + Unpin>(pipe: Option<&mut P>, buf: &mut Vec<u8>) {
    if let Some(pipe) = pipe {
        if let Err(e) = pipe.read_to_end(buf).await {
            debug!(error = %e, "pipe read failed");
        }
    }
}

/// stdout followed by stderr, trimmed
fn combine(stdout: Vec<u8>, stderr: Vec<u8>) -> String {
    let mut combined = stdout;
    combined.extend_from_slice(&stderr);
    String::from_utf8_lossy(&combined).trim().to_string()
}

fn render_invocation(program: &Path, argv: &[String]) -> String {
    let mut rendered = program.to_string_lossy().into_owned();
    for arg in argv {
        rendered.push(' ');
        rendered.push_str(arg);
    }
    rendered
}
