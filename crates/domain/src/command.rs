//! Command model shared by the single-call and pipeline paths.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A Valkey command name with its positional arguments.
///
/// Serializes as `{"command": "...", "args": [...]}`, the shape the proxy's
/// `exec` and `pipeline` endpoints expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "command")]
    name: String,
    args: Vec<Value>,
}

impl Command {
    /// Create a command. The name is upper-cased; arguments are not checked.
    pub fn new<N, I, A>(name: N, args: I) -> Self
    where
        N: AsRef<str>,
        I: IntoIterator<Item = A>,
        A: Into<Value>,
    {
        Self { name: name.as_ref().to_uppercase(), args: args.into_iter().map(Into::into).collect() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }
}
