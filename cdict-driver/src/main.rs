// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::process::ExitCode;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::debug;

use args::{CdictArgs, check_is_valid};
use cdict_model::{AnalysisSource, Application, ErrorsBundle};

mod args;
mod progress;
mod report;
mod session;
mod source;
mod util;

/// The entry point of `cdict`. Any error found during the read is reported through the
/// exit code, after the summary is printed.
fn main() -> ExitCode {
    let result = cdict_main();

    if let Err(error) = result {
        debug!(?error, "main_failure");
        util::error(&format!("{error:#}"));
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn cdict_main() -> Result<()> {
    let args = CdictArgs::parse();
    check_is_valid(&args);
    session::init_logger(&args.log)?;

    let source = source::FsSource::new(&args.input)?;
    let config = args.read_config();
    debug!(?config, root = %source.root().display(), "cdict_main");

    let errors = ErrorsBundle::new();
    let progress = progress::LogProgress::default();
    let application = Application::read(&source, &config, &errors, &progress);

    let summary = report::Summary::new(
        source.label(),
        source.document_counts(),
        &application,
        errors.errors(),
    );
    if !args.common.quiet {
        summary.print(args.common.verbose);
    }
    if let Some(path) = &args.report {
        summary.write_json(path)?;
        if !args.common.quiet {
            util::info_operation("Wrote", &format!("report to `{}`", path.display()));
        }
    }

    if !summary.errors.is_empty() {
        bail!("{} while reading `{}`", util::plural(summary.errors.len(), "error"), summary.source);
    }
    Ok(())
}
