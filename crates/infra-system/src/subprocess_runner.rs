// Subprocess runner implementation
// reason: std::process, callers are synchronous and the runner blocks until exit
use std::process::{Command, ExitStatus, Output, Stdio};

use tracing::{debug, info, warn};

use devhost_core::constants::UNKNOWN_EXIT_CODE;
use devhost_core::domain::Invocation;
use devhost_core::port::process_runner::{ProcessError, ProcessRunner};

/// Subprocess runner
/// Spawns one child per call with stdin inherited and stdout/stderr captured
#[derive(Debug, Default, Clone, Copy)]
pub struct SubprocessRunner;

impl SubprocessRunner {
    /// Create a new subprocess runner
    ///
    /// # Example
    /// ```ignore
    /// let runner = SubprocessRunner::new();
    /// let stdout = runner.run(&Invocation::new(["git", "rev-parse", "HEAD"]))?;
    /// ```
    pub fn new() -> Self {
        Self
    }

    /// Build the command; an explicit environment replaces the inherited one
    fn build_command(&self, program: &str, invocation: &Invocation) -> Command {
        let mut command = Command::new(program);
        command
            .args(invocation.args())
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = invocation.cwd() {
            command.current_dir(dir);
        }
        if let Some(env) = invocation.env() {
            command.env_clear().envs(env);
        }

        command
    }

    /// Spawn child process and wait for output
    fn spawn_and_wait(&self, program: &str, mut command: Command) -> Result<Output, ProcessError> {
        let child = command.spawn().map_err(|source| ProcessError::Spawn {
            program: program.to_string(),
            source,
        })?;

        debug!(program = %program, pid = child.id(), "Child spawned");

        Ok(child.wait_with_output()?)
    }

    /// Build the result from process output: stdout on success, stdout+stderr on failure
    fn build_result(&self, output: Output) -> Result<Vec<u8>, ProcessError> {
        if output.status.success() {
            return Ok(output.stdout);
        }

        let exit_code = exit_code(&output.status);
        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);

        Err(ProcessError::Failed {
            exit_code,
            output: combined,
        })
    }
}

/// Exit code, or the negated signal number for a child killed by a signal
fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        if let Some(signal) = status.signal() {
            return -signal;
        }
    }

    UNKNOWN_EXIT_CODE
}

impl ProcessRunner for SubprocessRunner {
    fn run(&self, invocation: &Invocation) -> Result<Vec<u8>, ProcessError> {
        let program = invocation.program().ok_or(ProcessError::EmptyCommand)?;

        info!(
            program = %program,
            args = ?invocation.args(),
            cwd = ?invocation.cwd(),
            env_replaced = invocation.env().is_some(),
            "Starting subprocess"
        );

        let command = self.build_command(program, invocation);
        let output = self.spawn_and_wait(program, command)?;
        let result = self.build_result(output);

        match &result {
            Ok(stdout) => debug!(program = %program, stdout_bytes = stdout.len(), "Subprocess succeeded"),
            Err(e) => warn!(
                program = %program,
                exit_code = ?e.exit_code(),
                "Subprocess failed"
            ),
        }

        result
    }
}
