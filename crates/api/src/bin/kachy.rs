//! Run one Valkey command through the Kachy proxy and print the result.
//!
//! Usage: `kachy-cli <COMMAND> [ARGS...]`
//!
//! Configuration comes from `KACHY_*` variables (a `.env` file in the
//! working directory is honored) or from a `kachy.toml` / `kachy.json` file.
//! Set `RUST_LOG=debug` to see transport logs on stderr.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) => tracing::debug!(error = %e, "No .env file loaded"),
    }

    let mut args = std::env::args().skip(1);
    let Some(command) = args.next() else {
        bail!("usage: kachy-cli <COMMAND> [ARGS...]");
    };
    let args: Vec<Value> = args.map(Value::from).collect();

    let config = kachy::config::load().context("failed to load Kachy configuration")?;
    kachy::init_with_config(config).context("failed to create Kachy client")?;

    let outcome = kachy::raw_command(&command, args);
    kachy::close();

    let result = outcome.with_context(|| format!("{} failed", command.to_uppercase()))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
