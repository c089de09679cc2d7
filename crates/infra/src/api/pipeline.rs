//! Batched command submission
//!
//! A [`Pipeline`] queues commands locally and sends them in one
//! `POST /valkey/pipeline` request on [`Pipeline::execute`]. The queue is
//! emptied by every `execute`, whether the request succeeds or fails, so a
//! failed batch is never replayed by a second `execute`; callers that want
//! to retry must queue the commands again.
//!
//! Dropping a pipeline that still holds commands flushes it. Errors from that
//! implicit flush can only be logged; call `execute` to observe them.

use kachy_domain::constants::PATH_PIPELINE;
use kachy_domain::{Command, Result};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use super::client::KachyClient;
use super::fields;

/// Ordered command buffer bound to one client.
#[derive(Debug)]
pub struct Pipeline<'a> {
    client: &'a KachyClient,
    commands: Vec<Command>,
}

impl<'a> Pipeline<'a> {
    pub(crate) fn new(client: &'a KachyClient) -> Self {
        Self { client, commands: Vec::new() }
    }

    /// Queue `SET key value ex`. The expiry slot is always sent, `null`
    /// when the key should not expire.
    pub fn set(&mut self, key: &str, value: impl Into<Value>, ex: Option<u64>) -> &mut Self {
        self.push(Command::new("SET", [Value::from(key), value.into(), Value::from(ex)]))
    }

    pub fn get(&mut self, key: &str) -> &mut Self {
        self.push(Command::new("GET", [key]))
    }

    pub fn delete(&mut self, key: &str) -> &mut Self {
        self.push(Command::new("DEL", [key]))
    }

    pub fn exists(&mut self, key: &str) -> &mut Self {
        self.push(Command::new("EXISTS", [key]))
    }

    pub fn expire(&mut self, key: &str, seconds: u64) -> &mut Self {
        self.push(Command::new("EXPIRE", [Value::from(key), Value::from(seconds)]))
    }

    pub fn ttl(&mut self, key: &str) -> &mut Self {
        self.push(Command::new("TTL", [key]))
    }

    /// Queue an arbitrary command; the name is upper-cased.
    pub fn raw_command<N, I, A>(&mut self, name: N, args: I) -> &mut Self
    where
        N: AsRef<str>,
        I: IntoIterator<Item = A>,
        A: Into<Value>,
    {
        self.push(Command::new(name, args))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands queued so far, in submission order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Send every queued command in one request.
    ///
    /// Result `i` belongs to command `i`. An empty queue returns an empty
    /// vector without contacting the service. A response without a
    /// `results` array yields an empty vector.
    ///
    /// # Errors
    ///
    /// Any transport error. The queue is already empty when it is returned.
    #[instrument(skip(self), fields(commands = self.commands.len()))]
    pub fn execute(&mut self) -> Result<Vec<Value>> {
        if self.commands.is_empty() {
            return Ok(Vec::new());
        }

        let commands = std::mem::take(&mut self.commands);
        let body = json!({ "commands": commands });
        let response = self.client.transport().request(Method::POST, PATH_PIPELINE, Some(&body))?;
        let results = fields::array(response.as_ref(), "results");

        debug!(submitted = commands.len(), received = results.len(), "pipeline executed");
        Ok(results)
    }

    fn push(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }
}

impl Drop for Pipeline<'_> {
    fn drop(&mut self) {
        if self.commands.is_empty() {
            return;
        }
        if let Err(err) = self.execute() {
            warn!(error = %err, "pipeline flush on drop failed");
        }
    }
}
