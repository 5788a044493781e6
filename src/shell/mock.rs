//! Scripted command runner for testing.
//!
//! `MockRunner` implements [`CommandRunner`] by matching each invocation's
//! rendered command line against registered prefixes. Rules registered
//! later win, so a test can override a broad rule with a narrow one.
//! Unmatched invocations behave like a program that is not installed.
//!
//! # Example
//!
//! ```
//! use mtr_setup::shell::{CommandRunner, Invocation, MockResponse, MockRunner};
//!
//! let runner = MockRunner::new();
//! runner.on("git --version", MockResponse::ok("git version 2.43.0\n"));
//!
//! let result = runner.run(&Invocation::new("git").arg("--version")).unwrap();
//! assert!(result.success);
//! assert!(runner.run(&Invocation::new("svn")).is_err());
//! assert_eq!(runner.calls().len(), 2);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use crate::error::{Result, SetupError};

use super::command::{CommandResult, CommandRunner, Invocation};

/// Canned outcome for a matched invocation.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// The process ran and exited with `code`.
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
    },
    /// The process could not be started.
    SpawnError,
}

impl MockResponse {
    /// Exit 0 with the given stdout.
    pub fn ok(stdout: &str) -> Self {
        Self::Exit {
            code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    /// Exit with `code` and the given stderr.
    pub fn fail(code: i32, stderr: &str) -> Self {
        Self::Exit {
            code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

type Handler = Box<dyn Fn(&Invocation) -> MockResponse>;

/// Scripted command runner.
#[derive(Default)]
pub struct MockRunner {
    rules: RefCell<Vec<(String, Handler)>>,
    calls: RefCell<Vec<Invocation>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to every invocation starting with `prefix`.
    pub fn on(&self, prefix: &str, response: MockResponse) {
        self.on_with(prefix, move |_| response.clone());
    }

    /// Respond with each entry of `responses` in turn; the last one repeats.
    pub fn on_sequence(&self, prefix: &str, responses: Vec<MockResponse>) {
        let queue = RefCell::new(VecDeque::from(responses));
        self.on_with(prefix, move |_| {
            let mut queue = queue.borrow_mut();
            if queue.len() > 1 {
                queue.pop_front().unwrap_or(MockResponse::SpawnError)
            } else {
                queue.front().cloned().unwrap_or(MockResponse::SpawnError)
            }
        });
    }

    /// Respond through a closure, which may also simulate side effects
    /// (creating files a real clone or installer would create).
    pub fn on_with<F>(&self, prefix: &str, handler: F)
    where
        F: Fn(&Invocation) -> MockResponse + 'static,
    {
        self.rules
            .borrow_mut()
            .push((prefix.to_string(), Box::new(handler)));
    }

    /// Every invocation seen so far, in order.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// Rendered command lines seen so far, in order.
    pub fn call_lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(Invocation::display).collect()
    }

    /// Whether any invocation started with `prefix`.
    pub fn was_called(&self, prefix: &str) -> bool {
        self.call_lines().iter().any(|line| line.starts_with(prefix))
    }

    /// Number of invocations starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.call_lines()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandResult> {
        self.calls.borrow_mut().push(invocation.clone());
        let line = invocation.display();

        let response = {
            let rules = self.rules.borrow();
            rules
                .iter()
                .rev()
                .find(|(prefix, _)| line.starts_with(prefix.as_str()))
                .map(|(_, handler)| handler(invocation))
        };

        match response {
            Some(MockResponse::Exit {
                code,
                stdout,
                stderr,
            }) => {
                if code == 0 {
                    Ok(CommandResult::success(stdout, stderr, Duration::ZERO))
                } else {
                    Ok(CommandResult::failure(
                        Some(code),
                        stdout,
                        stderr,
                        Duration::ZERO,
                    ))
                }
            }
            Some(MockResponse::SpawnError) | None => Err(SetupError::CommandFailed {
                command: line,
                code: None,
                output_tail: "No such file or directory (os error 2)".to_string(),
            }),
        }
    }
}
