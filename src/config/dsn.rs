use anyhow::{Result, anyhow};
use serde::Serialize;

pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub database: Option<String>,
    pub timeout_ms: u64,
}

impl ConnectionSettings {
    pub fn with_database(&self, database: &str) -> Self {
        Self {
            database: Some(database.to_string()),
            ..self.clone()
        }
    }

    /// `user:***@host:port/db`, safe to log.
    pub fn redacted(&self) -> String {
        let auth = match &self.password {
            Some(_) => format!("{}:***", self.user),
            None => self.user.clone(),
        };
        let db = self.database.as_deref().unwrap_or("");
        format!("{}@{}:{}/{}", auth, self.host, self.port, db)
    }
}

/// Parses `user:password@host:port[/database]`, optionally prefixed with
/// `mysql://`. The password is percent-decoded.
pub fn parse_dsn(raw: &str) -> Result<ConnectionSettings> {
    let mut remaining = raw.trim();
    if let Some(idx) = remaining.find("://") {
        remaining = &remaining[idx + 3..];
    }

    let (auth, host_part) = remaining
        .rsplit_once('@')
        .ok_or_else(|| anyhow!("Invalid DSN (expected user:password@host:port): {}", raw))?;

    let (user, password) = match auth.split_once(':') {
        Some((user, pass)) => (user, Some(percent_decode(pass))),
        None => (auth, None),
    };
    if user.is_empty() {
        return Err(anyhow!("DSN is missing a user: {}", raw));
    }

    let (host_port, database) = match host_part.split_once('/') {
        Some((host_port, path)) => {
            let db = path.split('?').next().unwrap_or("");
            (host_port, (!db.is_empty()).then(|| db.to_string()))
        }
        None => (host_part, None),
    };

    let (host, port) = match host_port.split_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| anyhow!("Invalid port in DSN: {}", port))?;
            (host, port)
        }
        None => (host_port, DEFAULT_PORT),
    };
    if host.is_empty() {
        return Err(anyhow!("DSN is missing a host: {}", raw));
    }

    Ok(ConnectionSettings {
        host: host.to_string(),
        port,
        user: user.to_string(),
        password: password.filter(|p| !p.is_empty()),
        database,
        timeout_ms: DEFAULT_TIMEOUT_MS,
    })
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'%' {
            if let Some(byte) = input
                .get(idx + 1..idx + 3)
                .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            {
                out.push(byte);
                idx += 3;
                continue;
            }
        }
        out.push(bytes[idx]);
        idx += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_dsn() {
        let conn = parse_dsn("test:secret@10.10.0.1:3307").expect("parse");
        assert_eq!(conn.user, "test");
        assert_eq!(conn.password.as_deref(), Some("secret"));
        assert_eq!(conn.host, "10.10.0.1");
        assert_eq!(conn.port, 3307);
        assert_eq!(conn.database, None);
    }

    #[test]
    fn parses_url_style_with_database() {
        let conn = parse_dsn("mysql://root:pw@db.local/shop?charset=utf8").expect("parse");
        assert_eq!(conn.port, DEFAULT_PORT);
        assert_eq!(conn.database.as_deref(), Some("shop"));
    }

    #[test]
    fn decodes_password() {
        let conn = parse_dsn("app:p%40ss%3Aword@host:3306").expect("parse");
        assert_eq!(conn.password.as_deref(), Some("p@ss:word"));
        let raw = parse_dsn("app:100%@host:3306").expect("parse");
        assert_eq!(raw.password.as_deref(), Some("100%"));
        let signed = parse_dsn("app:a%+1b@host:3306").expect("parse");
        assert_eq!(signed.password.as_deref(), Some("a%+1b"));
    }

    #[test]
    fn rejects_missing_parts() {
        assert!(parse_dsn("localhost:3306").is_err());
        assert!(parse_dsn(":pw@host:3306").is_err());
        assert!(parse_dsn("u:pw@host:port").is_err());
    }

    #[test]
    fn redacts_password() {
        let conn = parse_dsn("u:pw@h:3306/db").expect("parse");
        assert_eq!(conn.redacted(), "u:***@h:3306/db");
    }
}
