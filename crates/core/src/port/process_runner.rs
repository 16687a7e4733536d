// Process Runner Port
// Abstraction for running a child process to completion and capturing its output

use thiserror::Error;

use crate::domain::Invocation;

/// Process errors
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Empty command line")]
    EmptyCommand,

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Non-zero exit; `output` is stdout followed by stderr
    #[error("Process exited with code {exit_code}")]
    Failed { exit_code: i32, output: Vec<u8> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessError {
    /// Exit code of a process that ran and failed
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessError::Failed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }

    /// Combined stdout+stderr of a process that ran and failed
    pub fn output(&self) -> Option<&[u8]> {
        match self {
            ProcessError::Failed { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Process Runner trait
///
/// Implementations:
/// - SubprocessRunner: `std::process` child with inherited stdin
pub trait ProcessRunner: Send + Sync {
    /// Run `invocation` and block until it exits
    ///
    /// # Returns
    /// The captured stdout bytes when the exit code is 0 (stderr is dropped)
    ///
    /// # Errors
    /// - ProcessError::EmptyCommand if argv is empty
    /// - ProcessError::Spawn if the program cannot be started
    /// - ProcessError::Failed with the combined output on non-zero exit
    fn run(&self, invocation: &Invocation) -> Result<Vec<u8>, ProcessError>;
}
