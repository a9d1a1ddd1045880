use crate::domain::model::ScriptOutput;
use crate::utils::error::{Result, ToolError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Runs a helper script or binary and captures stdout followed by stderr.
#[derive(Debug, Clone)]
pub struct ScriptExecutor {
    interpreter: Option<PathBuf>,
}

impl ScriptExecutor {
    /// Runs scripts through an interpreter, e.g. `python3 script.py args...`.
    pub fn with_interpreter(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: Some(interpreter.into()),
        }
    }

    /// Executes the target directly.
    pub fn direct() -> Self {
        Self { interpreter: None }
    }

    pub async fn execute<S: AsRef<str>>(&self, script: &Path, args: &[S]) -> Result<ScriptOutput> {
        let mut command = match &self.interpreter {
            Some(interpreter) => {
                let mut command = Command::new(interpreter);
                command.arg(script);
                command
            }
            None => Command::new(script),
        };
        command
            .args(args.iter().map(|a| a.as_ref()))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let program = script.display().to_string();
        tracing::debug!(program = %program, args = args.len(), "Executing script");

        let output = command.output().await?;
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(ToolError::ProcessError {
                program,
                code: output.status.code(),
                output: combined,
            });
        }

        Ok(ScriptOutput {
            status: output.status.code().unwrap_or_default(),
            output: combined,
        })
    }
}
