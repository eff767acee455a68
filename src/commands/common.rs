use anyhow::Result;

use crate::cli::CliArgs;
use crate::config::{self, RunConfig};
use crate::error::{AppError, ErrorKind, classify_error};

pub fn load_config(args: &CliArgs) -> Result<RunConfig> {
    config::load_from_system(&args.overrides()).map_err(|err| {
        if classify_error(&err) == ErrorKind::Internal {
            AppError::new(ErrorKind::Config, format!("{:#}", err)).into()
        } else {
            err
        }
    })
}
