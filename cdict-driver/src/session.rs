// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::args::LogArgs;
use anyhow::{Context, Result};
use std::str::FromStr;
use tracing_subscriber::{EnvFilter, Registry, filter::Directive, fmt, layer::SubscriberExt};

/// Environment variable used to control the log tracing.
pub const LOG_ENV_VAR: &str = "CDICT_LOG";

/// Initialize the logger using the CDICT_LOG environment variable and the --log-level argument.
///
/// Logs go to stderr so they never interleave with the summary printed on stdout.
pub fn init_logger(args: &LogArgs) -> Result<()> {
    let filter = EnvFilter::from_env(LOG_ENV_VAR);
    let filter = if let Some(log_level) = &args.log_level {
        let directive = Directive::from_str(log_level)
            .with_context(|| format!("invalid log directive `{log_level}`"))?;
        filter.add_directive(directive)
    } else {
        filter
    };

    if args.json_logs { json_logs(filter) } else { fmt_logs(filter) }
}

/// Configure global logger to use a json logger.
fn json_logs(filter: EnvFilter) -> Result<()> {
    let subscriber =
        Registry::default().with(filter).with(fmt::layer().json().with_writer(std::io::stderr));
    tracing::subscriber::set_global_default(subscriber).context("failed to install the logger")
}

/// Configure global logger to use human readable lines.
fn fmt_logs(filter: EnvFilter) -> Result<()> {
    let subscriber = Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr));
    tracing::subscriber::set_global_default(subscriber).context("failed to install the logger")
}
