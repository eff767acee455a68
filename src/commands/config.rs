use std::io::{self, Write};

use anyhow::Result;

use crate::cli::CliArgs;
use crate::commands::common;
use crate::output::json;

pub fn run(args: &CliArgs) -> Result<()> {
    let resolved = common::load_config(args)?;
    let body = json::emit_json(&resolved.masked(), true)?;
    writeln!(io::stdout(), "{}", body)?;
    Ok(())
}
