//! Command runner trait for ctdb invocations
//!
//! This trait abstracts how ctdb subcommands are executed so the parsers and
//! the topology resolver never spawn processes themselves.
//!
//! The trait allows different implementations:
//! - `CtdbCommand`: direct process invocation, optionally through sudo
//! - Scripted runners in tests

use crate::utils::ExecutionError;

/// Runs a ctdb subcommand and returns its trimmed combined output
pub trait CommandRunner {
    /// Execute ctdb with the given arguments
    ///
    /// # Arguments
    /// * `args` - Subcommand and arguments; a compound token such as
    ///   `"status -Y"` is accepted as well as `["status", "-Y"]`
    ///
    /// # Example
    /// ```ignore
    /// let pnn = runner.run(&["pnn"])?;
    /// let table = runner.run(&["status", "-Y"])?;
    /// ```
    fn run(&self, args: &[&str]) -> Result<String, ExecutionError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, args: &[&str]) -> Result<String, ExecutionError> {
        (**self).run(args)
    }
}

/// Extension trait with the ctdb subcommands the exporter needs
///
/// These are convenience methods built on top of the base `CommandRunner` trait.
pub trait CtdbCommands: CommandRunner {
    /// Local node number
    fn pnn(&self) -> Result<String, ExecutionError> {
        self.run(&["pnn"])
    }

    /// Node number of the current recovery master
    fn recmaster(&self) -> Result<String, ExecutionError> {
        self.run(&["recmaster"])
    }

    /// Cluster membership table in `-Y` format
    fn status(&self) -> Result<String, ExecutionError> {
        self.run(&["status", "-Y"])
    }

    /// Local daemon statistics in `-Y` format
    fn statistics(&self) -> Result<String, ExecutionError> {
        self.run(&["statistics", "-Y"])
    }
}

impl<T: CommandRunner + ?Sized> CtdbCommands for T {}

/// Scripted runner shared by the unit tests
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use parking_lot::Mutex;

    use super::CommandRunner;
    use crate::utils::ExecutionError;

    /// Answers invocations from a fixed table and records every call
    #[derive(Default)]
    pub struct ScriptedRunner {
        responses: HashMap<String, String>,
        failures: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(mut self, command: &str, output: &str) -> Self {
            self.responses
                .insert(command.to_string(), output.trim().to_string());
            self
        }

        pub fn fail(mut self, command: &str, output: &str) -> Self {
            self.failures
                .insert(command.to_string(), output.to_string());
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, args: &[&str]) -> Result<String, ExecutionError> {
            let command = args.join(" ");
            self.calls.lock().push(command.clone());

            if let Some(output) = self.failures.get(&command) {
                return Err(ExecutionError::Failed {
                    invocation: format!("ctdb {}", command),
                    status: "exit status: 1".to_string(),
                    output: output.clone(),
                });
            }

            self.responses
                .get(&command)
                .cloned()
                .ok_or_else(|| ExecutionError::Failed {
                    invocation: format!("ctdb {}", command),
                    status: "exit status: 2".to_string(),
                    output: format!("unexpected command : {}", command),
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedRunner;
    use super::*;

    #[test]
    fn test_ctdb_commands_use_expected_arguments() {
        let runner = ScriptedRunner::new()
            .respond("pnn", "0")
            .respond("recmaster", "1")
            .respond("status -Y", "|Node|")
            .respond("statistics -Y", "num_clients|\n1|");

        assert_eq!(runner.pnn().unwrap(), "0");
        assert_eq!(runner.recmaster().unwrap(), "1");
        assert_eq!(runner.status().unwrap(), "|Node|");
        assert_eq!(runner.statistics().unwrap(), "num_clients|\n1|");
        assert_eq!(
            runner.calls(),
            vec!["pnn", "recmaster", "status -Y", "statistics -Y"]
        );
    }

    #[test]
    fn test_runner_by_reference() {
        let runner = ScriptedRunner::new().respond("pnn", "3");
        let by_ref: &ScriptedRunner = &runner;

        assert_eq!(by_ref.pnn().unwrap(), "3");
    }
}
