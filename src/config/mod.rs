mod dsn;
mod env;
mod loader;
mod rules;
mod schema;

pub use dsn::{ConnectionSettings, DEFAULT_PORT, parse_dsn};
pub use env::{Env, parse_bool};
pub use loader::{CliOverrides, LoadOptions, RunConfig, Side, load_config, strip_comment_lines};
pub use rules::{AlterIgnoreRules, AlterIgnoreTable, TableFilter};
pub use schema::ConfigFile;

pub fn load_from_system(cli: &CliOverrides) -> anyhow::Result<RunConfig> {
    let cwd = std::env::current_dir()?;
    let home_dir = dirs::home_dir();
    let xdg_config_dir = dirs::config_dir();
    let env = Env::from_system(cli.env_file.as_deref());
    let options = LoadOptions {
        cli: cli.clone(),
        cwd,
        home_dir,
        xdg_config_dir,
    };
    load_config(&options, &env)
}
