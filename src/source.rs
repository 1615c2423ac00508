// Command output source - runs OS utilities and captures what they print

use std::process::Command;

use crate::error::{AppError, AppResult};

/// Captured result of one external command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Anything that can run a utility and hand back its output.
///
/// Returns `SourceUnavailable` when the utility cannot be started at all.
/// A utility that starts and exits non-zero is still `Ok`; callers decide
/// what a failing exit status means for them.
pub trait CommandSource {
    fn capture(&self, program: &str, args: &[&str]) -> AppResult<CommandOutput>;
}

/// Runs commands on the local host
pub struct SystemCommands;

impl CommandSource for SystemCommands {
    fn capture(&self, program: &str, args: &[&str]) -> AppResult<CommandOutput> {
        tracing::debug!(program, args = %args.join(" "), "Running command");

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| AppError::source_unavailable(command_line(program, args), e.to_string()))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        })
    }
}

pub fn command_line(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

#[cfg(test)]
pub mod scripted {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;

    /// In-memory source answering from canned outputs keyed by command line.
    /// Commands without a canned answer behave like a missing utility.
    #[derive(Default)]
    pub struct ScriptedCommands {
        outputs: HashMap<String, CommandOutput>,
        prefixes: Vec<(String, CommandOutput)>,
        calls: RefCell<Vec<String>>,
    }

    impl ScriptedCommands {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(mut self, command: &str, stdout: &str, code: i32) -> Self {
            self.outputs.insert(
                command.to_string(),
                CommandOutput {
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                    code: Some(code),
                },
            );
            self
        }

        pub fn respond_stderr(mut self, command: &str, stderr: &str, code: i32) -> Self {
            self.outputs.insert(
                command.to_string(),
                CommandOutput {
                    stdout: String::new(),
                    stderr: stderr.to_string(),
                    code: Some(code),
                },
            );
            self
        }

        /// Answer every command line starting with `prefix`. Used for
        /// commands carrying a random temporary path.
        pub fn respond_prefix(mut self, prefix: &str, stderr: &str, code: i32) -> Self {
            self.prefixes.push((
                prefix.to_string(),
                CommandOutput {
                    stdout: String::new(),
                    stderr: stderr.to_string(),
                    code: Some(code),
                },
            ));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        pub fn was_called(&self, prefix: &str) -> bool {
            self.calls.borrow().iter().any(|c| c.starts_with(prefix))
        }
    }

    impl CommandSource for ScriptedCommands {
        fn capture(&self, program: &str, args: &[&str]) -> AppResult<CommandOutput> {
            let line = command_line(program, args);
            self.calls.borrow_mut().push(line.clone());

            if let Some(output) = self.outputs.get(&line) {
                return Ok(output.clone());
            }
            self.prefixes
                .iter()
                .find(|(prefix, _)| line.starts_with(prefix.as_str()))
                .map(|(_, output)| output.clone())
                .ok_or_else(|| AppError::source_unavailable(line, "No such file or directory"))
        }
    }
}
