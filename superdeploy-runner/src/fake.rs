//! Scripted [`ProcessRunner`] for tests.
//!
//! Exit codes are matched by substring of the command line; the first rule
//! that matches wins and unmatched commands exit `0`. Every invocation is
//! recorded in order.

use std::cell::RefCell;

use crate::error::RunnerError;
use crate::process::{Invocation, ProcessOutput, ProcessRunner};

#[derive(Debug, Default)]
pub struct FakeRunner {
    rules: Vec<(String, i32)>,
    calls: RefCell<Vec<Invocation>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make any command whose command line contains `pattern` exit with `code`.
    pub fn exit_with(mut self, pattern: impl Into<String>, code: i32) -> Self {
        self.rules.push((pattern.into(), code));
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// Recorded command lines, in call order.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(Invocation::command_line).collect()
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, RunnerError> {
        self.calls.borrow_mut().push(invocation.clone());
        let line = invocation.command_line();
        let code = self
            .rules
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, code)| *code)
            .unwrap_or(0);
        Ok(ProcessOutput {
            code,
            stdout: String::new(),
            stderr: if code == 0 {
                String::new()
            } else {
                format!("fake failure for `{line}`\n")
            },
        })
    }
}
