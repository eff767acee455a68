mod common;
mod config;
mod run;

use anyhow::Result;

use crate::cli::{CliArgs, CommandKind};

pub use run::RunSummary;

pub fn dispatch(args: &CliArgs) -> Result<RunSummary> {
    match args.command {
        CommandKind::Run => run::run(args),
        CommandKind::Config => config::run(args).map(|()| RunSummary::default()),
    }
}
