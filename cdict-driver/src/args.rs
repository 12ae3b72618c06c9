// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Command line interface of `cdict`.

use cdict_model::{BindOrder, ReadConfig, ReadMode};
use clap::{ValueEnum, error::Error, error::ErrorKind};
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::filter::Directive;

/// Trait used to perform extra validation after parsing.
pub trait ValidateArgs {
    /// Perform post-parsing validation but do not abort.
    fn validate(&self) -> Result<(), Error>;
}

/// Validate a set of arguments and ensure they are in a valid state.
/// This method will abort execution with a user friendly error message if the state is invalid.
pub fn check_is_valid<T>(command: &T)
where
    T: clap::Parser + ValidateArgs,
{
    if let Err(error) = command.validate() {
        error.format(&mut T::command()).exit()
    }
}

/// Arguments that control what is printed.
#[derive(Debug, clap::Args)]
pub struct CommonArgs {
    /// Only print the final error, if any; overrides --verbose
    #[arg(long, short)]
    pub quiet: bool,
    /// Print every reported error and per-domain statistics
    #[arg(long, short)]
    pub verbose: bool,
}

/// Arguments that control logging.
#[derive(Debug, clap::Args)]
pub struct LogArgs {
    /// Add a tracing directive on top of the `CDICT_LOG` environment variable, e.g. `debug`
    #[arg(long, value_name = "DIRECTIVE")]
    pub log_level: Option<String>,
    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

/// The order in which the records of a dictionary are bound.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum BindOrderArg {
    Declaration,
    Reversed,
    Parallel,
}

impl From<BindOrderArg> for BindOrder {
    fn from(order: BindOrderArg) -> Self {
        match order {
            BindOrderArg::Declaration => BindOrder::Declaration,
            BindOrderArg::Reversed => BindOrder::Reversed,
            BindOrderArg::Parallel => BindOrder::Parallel,
        }
    }
}

/// Read the indexed dictionaries written by a C static analyzer, resolve every
/// cross reference, and summarize the result.
#[derive(Debug, clap::Parser)]
#[command(name = "cdict", version)]
pub struct CdictArgs {
    /// Directory holding the analysis documents (`*_cdict.json`, `*_prd.json`, ...)
    #[arg(long, short)]
    pub input: PathBuf,

    /// Number of threads used to load documents and bind records
    #[arg(long, short)]
    pub jobs: Option<usize>,

    /// Read everything on the main thread
    #[arg(long, conflicts_with = "jobs")]
    pub sequential: bool,

    /// Order in which records are bound. Defaults to `parallel`, or `declaration` with
    /// `--sequential`
    #[arg(long, value_enum)]
    pub bind_order: Option<BindOrderArg>,

    /// Write a JSON report of the statistics and of every reported error to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    #[command(flatten)]
    pub log: LogArgs,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl CdictArgs {
    pub fn read_config(&self) -> ReadConfig {
        let mut config = if self.sequential {
            ReadConfig::sequential()
        } else {
            ReadConfig::parallel(self.jobs)
        };
        if let Some(order) = self.bind_order {
            config.bind_order = order.into();
        }
        config
    }
}

impl ValidateArgs for LogArgs {
    fn validate(&self) -> Result<(), Error> {
        if let Some(directive) = &self.log_level {
            if let Err(error) = Directive::from_str(directive) {
                return Err(Error::raw(
                    ErrorKind::InvalidValue,
                    format!("Invalid argument: `--log-level {directive}`: {error}\n"),
                ));
            }
        }
        Ok(())
    }
}

impl ValidateArgs for CdictArgs {
    fn validate(&self) -> Result<(), Error> {
        self.log.validate()?;
        if !self.input.is_dir() {
            return Err(Error::raw(
                ErrorKind::InvalidValue,
                format!(
                    "Invalid argument: Input invalid. `{}` is not a directory.\n",
                    self.input.display()
                ),
            ));
        }
        if self.jobs == Some(0) {
            return Err(Error::raw(
                ErrorKind::InvalidValue,
                "Invalid argument: `--jobs` must be at least 1.\n",
            ));
        }
        if self.sequential && self.bind_order == Some(BindOrderArg::Parallel) {
            return Err(Error::raw(
                ErrorKind::ArgumentConflict,
                "Invalid argument: `--bind-order parallel` cannot be used with `--sequential`.\n",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> CdictArgs {
        CdictArgs::try_parse_from(std::iter::once("cdict").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn check_read_config() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().to_str().unwrap();

        let args = parse(&["--input", input]);
        assert!(args.validate().is_ok());
        assert_eq!(args.read_config(), ReadConfig::parallel(None));

        let args = parse(&["--input", input, "--sequential", "--bind-order", "reversed"]);
        assert!(args.validate().is_ok());
        assert_eq!(args.read_config().mode, ReadMode::Sequential);
        assert_eq!(args.read_config().bind_order, BindOrder::Reversed);

        let args = parse(&["--input", input, "-j", "3"]);
        assert_eq!(args.read_config().mode, ReadMode::Parallel { jobs: Some(3) });
    }

    #[test]
    fn check_invalid_args() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().to_str().unwrap();
        let missing = dir.path().join("missing");

        assert!(parse(&["--input", missing.to_str().unwrap()]).validate().is_err());
        assert!(parse(&["--input", input, "--jobs", "0"]).validate().is_err());
        assert!(parse(&["--input", input, "--log-level", "=="]).validate().is_err());
        assert!(parse(&["--input", input, "--log-level", "cdict_model=debug"]).validate().is_ok());
        assert!(
            parse(&["--input", input, "--sequential", "--bind-order", "parallel"])
                .validate()
                .is_err()
        );
        let conflict = CdictArgs::try_parse_from(["cdict", "--input", input, "--sequential", "-j", "2"]);
        assert!(conflict.is_err());
    }

    #[test]
    fn check_bind_order_names() {
        assert_eq!(BindOrderArg::Declaration.to_string(), "declaration");
        assert_eq!(BindOrder::from(BindOrderArg::Parallel), BindOrder::Parallel);
    }
}
