//! Public surface for Jules.
//!
//! This crate re-exports the building blocks and hosts the small pieces the
//! `jules` operator binary needs: logging setup, config resolution and a
//! stdout delivery channel.

/// Re-export for convenience.
pub use jules_rs_config as config;
pub use jules_rs_core as core;
/// Re-export for convenience.
pub use jules_rs_memory as memory;
/// Re-export for convenience.
pub use jules_rs_protocol as protocol;
pub use jules_rs_tools as tools;

use async_trait::async_trait;
use jules_rs_config::{ConfigError, JulesConfig, LayeredConfigOptions};
use jules_rs_core::{ChannelError, OutboundChannel, Reminder};
use log::debug;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Initialize `env_logger` with millisecond timestamps, honouring `RUST_LOG`.
pub fn init_logging() {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();
}

/// Default layer options for `cwd` with `runtime_paths` applied last.
pub fn config_options(cwd: &Path, runtime_paths: &[PathBuf]) -> LayeredConfigOptions {
    runtime_paths
        .iter()
        .fold(LayeredConfigOptions::new(cwd), |options, path| {
            options.with_runtime_path(path)
        })
}

/// Load the layered config, then rebase relative file paths onto the
/// options' working directory.
pub fn load_config(options: LayeredConfigOptions) -> Result<JulesConfig, ConfigError> {
    let cwd = options.cwd.clone();
    let layered = JulesConfig::load_layered_with_options(options)?;
    debug!("config layers applied (layers={})", layered.layers.len());
    let mut config = layered.config;
    config.resolve_paths(&cwd);
    Ok(config)
}

/// One line per reminder for the operator listing.
pub fn format_reminder(reminder: &Reminder) -> String {
    let status = if reminder.sent { "sent" } else { "pending" };
    format!(
        "{:>4}  {}  {:<7}  {}  {}",
        reminder.row_id,
        reminder.when(),
        status,
        reminder.call_id,
        reminder.topic
    )
}

/// Delivers messages by printing them; stands in for a chat transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutChannel;

#[async_trait]
impl OutboundChannel for StdoutChannel {
    async fn send(&self, text: &str) -> Result<(), ChannelError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{text}")?;
        out.flush()?;
        Ok(())
    }
}
