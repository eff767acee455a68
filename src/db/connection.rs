use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};

use crate::config::ConnectionSettings;

pub fn build_options(settings: &ConnectionSettings) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user);
    if let Some(password) = &settings.password {
        options = options.password(password);
    }
    if let Some(database) = &settings.database {
        options = options.database(database);
    }
    options
}

/// One connection per side: statements and the fallback transaction must
/// share a session.
pub fn pool_options(settings: &ConnectionSettings) -> MySqlPoolOptions {
    let mut pool = MySqlPoolOptions::new().max_connections(1);
    if settings.timeout_ms > 0 {
        pool = pool.acquire_timeout(Duration::from_millis(settings.timeout_ms));
    }
    pool
}
