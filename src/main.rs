use std::backtrace::Backtrace;
use std::io::{self, IsTerminal, Write};
use std::panic;
use std::process::ExitCode;

use owo_colors::OwoColorize;
use schemasync::cli;
use schemasync::commands;
use schemasync::error;

const EXIT_ERROR: u8 = 1;
const EXIT_FAILED_STATEMENTS: u8 = 2;
const EXIT_PANIC: u8 = 101;

fn main() -> ExitCode {
    let args = cli::parse();
    init_logging(args.verbose, args.quiet);
    install_panic_hook();

    match panic::catch_unwind(|| commands::dispatch(&args)) {
        Ok(Ok(summary)) if summary.failed_total > 0 => ExitCode::from(EXIT_FAILED_STATEMENTS),
        Ok(Ok(_)) => ExitCode::SUCCESS,
        Ok(Err(err)) => {
            let kind = error::classify_error(&err);
            tracing::debug!(kind = kind.as_str(), "command failed");
            print_error(&format!("{:#}", err));
            ExitCode::from(EXIT_ERROR)
        }
        Err(_) => {
            print_error("unexpected internal failure (see log for the stack trace)");
            ExitCode::from(EXIT_PANIC)
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let filter = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn,sqlx=error",
        (false, 1) => "info,sqlx=warn",
        (false, 2) => "debug",
        _ => "trace",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Logs every panic with its stack before `catch_unwind` turns it into an
/// exit status.
fn install_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        let backtrace = Backtrace::force_capture();
        tracing::error!(panic = %panic_info, "panic:\n{}", backtrace);
    }));
}

fn print_error(message: &str) {
    if should_color_stderr() {
        let line = format!("Error: {}", message);
        let _ = writeln!(io::stderr(), "{}", line.red());
    } else {
        let _ = writeln!(io::stderr(), "Error: {}", message);
    }
}

fn should_color_stderr() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    io::stderr().is_terminal()
}
