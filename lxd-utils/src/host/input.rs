// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use itertools::Itertools;
use std::fmt;
use std::process::Command;

/// Arguments whose following value is a request payload.
const PAYLOAD_FLAGS: &[&str] = &["--data", "-d"];

/// A command, as observed by an executor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Input {
    pub program: String,
    pub args: Vec<String>,
}

impl Input {
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: AsRef<str>,
        I: IntoIterator<Item = A>,
        A: AsRef<str>,
    {
        Self {
            program: program.as_ref().to_string(),
            args: args.into_iter().map(|a| a.as_ref().to_string()).collect(),
        }
    }

    /// Short-hand for a whitespace-separated command line.
    ///
    /// Arguments containing whitespace cannot be expressed this way; use
    /// [Self::new] for those.
    pub fn shell<S: AsRef<str>>(input: S) -> Self {
        let mut words = input.as_ref().split_whitespace();
        let program = words.next().unwrap_or_default();
        Self::new(program, words)
    }

    /// Returns a copy of this input with request payloads elided, suitable
    /// for logging. Payloads may carry secrets such as a cluster password.
    pub fn redacted(&self) -> Self {
        let mut args = Vec::with_capacity(self.args.len());
        let mut elide_next = false;
        for arg in &self.args {
            if elide_next {
                args.push(format!("<{} bytes>", arg.len()));
                elide_next = false;
            } else {
                elide_next = PAYLOAD_FLAGS.contains(&arg.as_str());
                args.push(arg.clone());
            }
        }
        Self { program: self.program.clone(), args }
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        if !self.args.is_empty() {
            write!(f, " {}", self.args.iter().join(" "))?;
        }
        Ok(())
    }
}

impl From<&Command> for Input {
    fn from(command: &Command) -> Self {
        Self {
            program: command.get_program().to_string_lossy().to_string(),
            args: command
                .get_args()
                .map(|s| s.to_string_lossy().to_string())
                .collect(),
        }
    }
}
