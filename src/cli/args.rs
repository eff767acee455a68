use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};

use crate::config::CliOverrides;
use crate::matcher::split_list;

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    pub source: Option<String>,
    pub dest: Option<String>,
    pub schemas: Vec<String>,
    pub tables: Vec<String>,
    pub tables_ignore: Vec<String>,
    pub tables_compare_data: Vec<String>,
    pub single_schema_change: bool,
    pub sync: bool,
    pub drop: bool,
    pub report_path: Option<PathBuf>,
    pub verbose: u8,
    pub quiet: bool,
    pub command: CommandKind,
}

impl CliArgs {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            config_path: self.config_path.clone(),
            env_file: self.env_file.clone(),
            source: self.source.clone(),
            dest: self.dest.clone(),
            schemas: self.schemas.clone(),
            tables: self.tables.clone(),
            tables_ignore: self.tables_ignore.clone(),
            tables_compare_data: self.tables_compare_data.clone(),
            single_schema_change: self.single_schema_change.then_some(true),
            sync: self.sync,
            drop: self.drop,
            report_path: self.report_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Diff (and with `--sync`, apply) every target schema.
    Run,
    /// Print the resolved configuration.
    Config,
}

pub fn build_cli() -> Command {
    let cmd = Command::new("schemasync")
        .about("Reconcile MySQL table structure from a source to a destination database")
        .version(env!("CARGO_PKG_VERSION"))
        .disable_help_subcommand(true)
        .subcommand_value_name("COMMAND")
        .after_help(
            "Without --sync the statements are only printed.\n\
             Example: schemasync --source user:pass@10.10.0.1:3306/shop --dest user:pass@127.0.0.1:3306/shop --sync",
        );

    add_global_args(cmd).subcommand(
        Command::new("config").about("Display resolved config (passwords masked)"),
    )
}

pub fn parse_args() -> CliArgs {
    let matches = build_cli().get_matches();
    parse_matches(&matches)
}

pub fn try_parse_from<I, T>(args: I) -> Result<CliArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = build_cli().try_get_matches_from(args)?;
    Ok(parse_matches(&matches))
}

fn add_global_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("conf")
            .long("conf")
            .alias("config")
            .value_name("PATH")
            .value_hint(ValueHint::FilePath)
            .global(true)
            .help("JSON or YAML config file (default: ./conf.json)"),
    )
    .arg(
        Arg::new("env-file")
            .long("env-file")
            .value_name("PATH")
            .value_hint(ValueHint::FilePath)
            .global(true)
            .help("Load environment variables from file (default: .env)"),
    )
    .arg(
        Arg::new("source")
            .long("source")
            .value_name("DSN")
            .global(true)
            .help("Sync from, e.g. user:pass@10.10.0.1:3306/shop"),
    )
    .arg(
        Arg::new("dest")
            .long("dest")
            .value_name("DSN")
            .global(true)
            .help("Sync to, e.g. user:pass@127.0.0.1:3306/shop"),
    )
    .arg(
        Arg::new("schemas")
            .long("schemas")
            .value_name("LIST")
            .global(true)
            .help("Comma-separated target schemas (default: database in the source DSN)"),
    )
    .arg(
        Arg::new("tables")
            .long("tables")
            .value_name("LIST")
            .global(true)
            .help("Tables to sync, e.g. product_base,order_*"),
    )
    .arg(
        Arg::new("tables-ignore")
            .long("tables-ignore")
            .alias("tables_ignore")
            .value_name("LIST")
            .global(true)
            .help("Tables to skip, e.g. product_base,order_*,*_bak*"),
    )
    .arg(
        Arg::new("tables-compare-data")
            .long("tables-compare-data")
            .alias("tables_compare_data")
            .value_name("LIST")
            .global(true)
            .help("Tables whose data checksums are compared"),
    )
    .arg(
        Arg::new("single-schema-change")
            .long("single-schema-change")
            .alias("single_schema_change")
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Emit one ALTER TABLE statement per change"),
    )
    .arg(
        Arg::new("sync")
            .long("sync")
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Apply the changes to the destination (default: only print them)"),
    )
    .arg(
        Arg::new("drop")
            .long("drop")
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Drop columns, indexes and foreign keys that only exist on the destination"),
    )
    .arg(
        Arg::new("report")
            .long("report")
            .value_name("PATH")
            .value_hint(ValueHint::FilePath)
            .global(true)
            .help("Write a run report (.json, .md, or plain table)"),
    )
    .arg(
        Arg::new("verbose")
            .short('v')
            .long("verbose")
            .action(ArgAction::Count)
            .global(true)
            .help("Increase log verbosity (-v info, -vv debug, -vvv trace)"),
    )
    .arg(
        Arg::new("quiet")
            .short('q')
            .long("quiet")
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Only log errors"),
    )
}

fn parse_matches(matches: &ArgMatches) -> CliArgs {
    let list = |name: &str| {
        matches
            .get_one::<String>(name)
            .map(|raw| split_list(raw))
            .unwrap_or_default()
    };

    let command = match matches.subcommand() {
        Some(("config", _)) => CommandKind::Config,
        _ => CommandKind::Run,
    };

    CliArgs {
        config_path: matches.get_one::<String>("conf").map(PathBuf::from),
        env_file: matches.get_one::<String>("env-file").map(PathBuf::from),
        source: matches.get_one::<String>("source").cloned(),
        dest: matches.get_one::<String>("dest").cloned(),
        schemas: list("schemas"),
        tables: list("tables"),
        tables_ignore: list("tables-ignore"),
        tables_compare_data: list("tables-compare-data"),
        single_schema_change: matches.get_flag("single-schema-change"),
        sync: matches.get_flag("sync"),
        drop: matches.get_flag("drop"),
        report_path: matches.get_one::<String>("report").map(PathBuf::from),
        verbose: matches.get_count("verbose"),
        quiet: matches.get_flag("quiet"),
        command,
    }
}
