use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Serialize;

use super::dsn::{ConnectionSettings, DEFAULT_TIMEOUT_MS, parse_dsn};
use super::env::{Env, parse_bool};
use super::rules::{AlterIgnoreRules, TableFilter};
use super::schema::ConfigFile;
use crate::error::AppError;

/// Values taken from command-line flags. `None` or an empty list leaves the
/// lower layers in place.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    pub source: Option<String>,
    pub dest: Option<String>,
    pub schemas: Vec<String>,
    pub tables: Vec<String>,
    pub tables_ignore: Vec<String>,
    pub tables_compare_data: Vec<String>,
    pub single_schema_change: Option<bool>,
    pub sync: bool,
    pub drop: bool,
    pub report_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub cli: CliOverrides,
    pub cwd: PathBuf,
    pub home_dir: Option<PathBuf>,
    pub xdg_config_dir: Option<PathBuf>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    pub config_path: Option<PathBuf>,
    pub source: String,
    pub dest: String,
    pub schemas: Vec<String>,
    pub filter: TableFilter,
    pub alter_ignore: AlterIgnoreRules,
    pub single_schema_change: bool,
    pub sync: bool,
    pub drop: bool,
    pub report_path: Option<PathBuf>,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Dest,
}

impl RunConfig {
    /// Rejects configurations that cannot run, before any database contact.
    pub fn check(&self) -> Result<()> {
        if self.source.trim().is_empty() {
            return Err(AppError::config("source DSN is empty").into());
        }
        if self.dest.trim().is_empty() {
            return Err(AppError::config("dest DSN is empty").into());
        }
        parse_dsn(&self.source).map_err(|err| AppError::config(format!("source: {}", err)))?;
        parse_dsn(&self.dest).map_err(|err| AppError::config(format!("dest: {}", err)))?;
        if self.target_schemas()?.is_empty() {
            return Err(AppError::config("no target schemas configured").into());
        }
        Ok(())
    }

    /// Configured schemas, or the database named in the source DSN.
    pub fn target_schemas(&self) -> Result<Vec<String>> {
        if !self.schemas.is_empty() {
            return Ok(self.schemas.clone());
        }
        let source = parse_dsn(&self.source)?;
        Ok(source.database.into_iter().collect())
    }

    /// Connection settings for one side, pointed at `schema`.
    pub fn connection(&self, side: Side, schema: &str) -> Result<ConnectionSettings> {
        let dsn = match side {
            Side::Source => &self.source,
            Side::Dest => &self.dest,
        };
        let mut settings = parse_dsn(dsn)?.with_database(schema);
        settings.timeout_ms = self.timeout_ms;
        Ok(settings)
    }

    /// Copy safe to print: DSN passwords replaced by `***`.
    pub fn masked(&self) -> RunConfig {
        RunConfig {
            source: mask_dsn(&self.source),
            dest: mask_dsn(&self.dest),
            ..self.clone()
        }
    }
}

fn mask_dsn(dsn: &str) -> String {
    parse_dsn(dsn)
        .map(|settings| settings.redacted())
        .unwrap_or_else(|_| dsn.to_string())
}

pub fn load_config(options: &LoadOptions, env: &Env) -> Result<RunConfig> {
    let config_path = resolve_config_path(options, env)?;
    let file = match &config_path {
        Some(path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    let mut config = RunConfig {
        config_path,
        timeout_ms: DEFAULT_TIMEOUT_MS,
        ..RunConfig::default()
    };
    apply_file(&mut config, file);
    apply_env_overrides(&mut config, env);
    apply_cli_overrides(&mut config, &options.cli);
    Ok(config)
}

/// Drops whole lines starting with `#` or `//` so commented JSON parses.
pub fn strip_comment_lines(content: &str) -> String {
    content
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !(trimmed.starts_with('#') || trimmed.starts_with("//"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn resolve_config_path(options: &LoadOptions, env: &Env) -> Result<Option<PathBuf>> {
    if let Some(path) = &options.cli.config_path {
        return explicit_path(path.clone());
    }

    if let Some(path) = env.get("SCHEMA_SYNC_CONFIG") {
        return explicit_path(PathBuf::from(path));
    }

    if let Some(path) = find_local_config(&options.cwd, options.home_dir.as_deref()) {
        return Ok(Some(path));
    }

    Ok(find_global_config(options.xdg_config_dir.as_deref()))
}

fn explicit_path(path: PathBuf) -> Result<Option<PathBuf>> {
    if !path.is_file() {
        return Err(AppError::config(format!("Config file not found: {}", path.display())).into());
    }
    Ok(Some(path))
}

fn find_local_config(start: &Path, home: Option<&Path>) -> Option<PathBuf> {
    let candidates = [
        "conf.json",
        ".schemasync/config.json",
        ".schemasync/config.yaml",
        ".schemasync/config.yml",
    ];

    for dir in start.ancestors() {
        for candidate in &candidates {
            let path = dir.join(candidate);
            if path.is_file() {
                return Some(path);
            }
        }

        if home.is_some_and(|home_dir| dir == home_dir) {
            break;
        }
    }

    None
}

fn find_global_config(xdg_config: Option<&Path>) -> Option<PathBuf> {
    let base = xdg_config?;
    let candidates = [
        "schemasync/config.json",
        "schemasync/config.yaml",
        "schemasync/config.yml",
    ];

    candidates
        .iter()
        .map(|candidate| base.join(candidate))
        .find(|path| path.is_file())
}

fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let parsed = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")
        }
        Some("json") => serde_json::from_str(&strip_comment_lines(&content))
            .context("Failed to parse JSON config"),
        _ => Err(anyhow!("Unsupported config file extension")),
    };
    parsed.map_err(|err| AppError::config(format!("{}: {:#}", path.display(), err)).into())
}

fn apply_file(config: &mut RunConfig, file: ConfigFile) {
    if let Some(source) = file.source {
        config.source = source;
    }
    if let Some(dest) = file.dest {
        config.dest = dest;
    }
    config.schemas = file.schemas;
    config.filter = TableFilter {
        tables: file.tables,
        tables_ignore: file.tables_ignore,
        tables_compare_data: file.tables_compare_data,
    };
    config.alter_ignore = file.alter_ignore;
    if let Some(single) = file.single_schema_change {
        config.single_schema_change = single;
    }
    if let Some(timeout) = file.timeout {
        config.timeout_ms = timeout;
    }
}

fn apply_env_overrides(config: &mut RunConfig, env: &Env) {
    if let Some(source) = env.get("SCHEMA_SYNC_SOURCE") {
        config.source = source;
    }
    if let Some(dest) = env.get("SCHEMA_SYNC_DEST") {
        config.dest = dest;
    }
    if let Some(schemas) = env.get_list("SCHEMA_SYNC_SCHEMAS") {
        config.schemas = schemas;
    }
    if let Some(single) = env
        .get("SCHEMA_SYNC_SINGLE_SCHEMA_CHANGE")
        .and_then(|v| parse_bool(&v))
    {
        config.single_schema_change = single;
    }
}

fn apply_cli_overrides(config: &mut RunConfig, cli: &CliOverrides) {
    if let Some(source) = &cli.source {
        config.source = source.clone();
    }
    if let Some(dest) = &cli.dest {
        config.dest = dest.clone();
    }
    replace_if_set(&mut config.schemas, &cli.schemas);
    replace_if_set(&mut config.filter.tables, &cli.tables);
    replace_if_set(&mut config.filter.tables_ignore, &cli.tables_ignore);
    replace_if_set(
        &mut config.filter.tables_compare_data,
        &cli.tables_compare_data,
    );
    if let Some(single) = cli.single_schema_change {
        config.single_schema_change = single;
    }
    config.sync = cli.sync;
    config.drop = cli.drop;
    config.report_path = cli.report_path.clone();
}

fn replace_if_set(target: &mut Vec<String>, values: &[String]) {
    if !values.is_empty() {
        *target = values.to_vec();
    }
}
