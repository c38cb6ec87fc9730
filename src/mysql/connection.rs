use crate::util::{collapse_whitespace, Result, SchemaError};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{MySql, Pool};
use std::fmt;
use tracing::info;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_CHARSET: &str = "utf8mb4";
const MAX_CONNECTIONS: u32 = 2;
const SUPPORTED_SCHEMES: [&str; 2] = ["mysql", "mariadb"];

/// Where and how to reach one database, parsed from
/// `scheme://[user[:password]@]host[:port]/database`.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: String,
    pub charset: String,
}

impl ConnectionConfig {
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = match uri.split_once("://") {
            Some((scheme, rest)) => {
                if !SUPPORTED_SCHEMES.contains(&scheme.to_lowercase().as_str()) {
                    return Err(SchemaError::Config(format!(
                        "Unsupported scheme '{scheme}' (expected one of: {})",
                        SUPPORTED_SCHEMES.join(", ")
                    )));
                }
                rest
            }
            None => uri,
        };

        let (auth_part, url_part) = match rest.rsplit_once('@') {
            Some((auth, url)) => (Some(auth), url),
            None => (None, rest),
        };

        let (user, password) = match auth_part {
            Some(auth) => match auth.split_once(':') {
                Some((user, password)) => (non_empty(user), Some(password.to_string())),
                None => (non_empty(auth), None),
            },
            None => (None, None),
        };

        let Some((host_part, database)) = url_part.split_once('/') else {
            return Err(SchemaError::Config(format!(
                "No database specified in '{}'",
                mask_uri(uri)
            )));
        };
        if database.is_empty() || database.contains('/') {
            return Err(SchemaError::Config(format!(
                "No database specified in '{}'",
                mask_uri(uri)
            )));
        }

        let (host, port) = match host_part.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    SchemaError::Config(format!("Invalid port '{port}' in '{}'", mask_uri(uri)))
                })?;
                (host, port)
            }
            None => (host_part, DEFAULT_PORT),
        };

        Ok(ConnectionConfig {
            host: non_empty(host).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            user,
            password,
            database: database.to_string(),
            charset: DEFAULT_CHARSET.to_string(),
        })
    }

    fn connect_options(&self) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .charset(&self.charset);
        if let Some(user) = &self.user {
            options = options.username(user);
        }
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        options
    }
}

/// Renders the descriptor with the password masked.
impl fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "host={}, port={}, user={}, password={}, database={}",
            self.host,
            self.port,
            self.user.as_deref().unwrap_or("None"),
            if self.password.is_some() { "***" } else { "None" },
            self.database
        )
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .field("charset", &self.charset)
            .finish()
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Replaces the password of a connection URI with `***` for display.
pub fn mask_uri(uri: &str) -> String {
    let (prefix, rest) = match uri.split_once("://") {
        Some((scheme, rest)) => (format!("{scheme}://"), rest),
        None => (String::new(), uri),
    };
    match rest.rsplit_once('@') {
        Some((auth, host)) => match auth.split_once(':') {
            Some((user, _)) => format!("{prefix}{user}:***@{host}"),
            None => uri.to_string(),
        },
        None => uri.to_string(),
    }
}

pub struct MySqlConnection {
    pool: Pool<MySql>,
    config: ConnectionConfig,
}

impl MySqlConnection {
    pub async fn new(config: &ConnectionConfig) -> Result<Self> {
        info!(target = %config, "connecting");
        let pool = MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(config.connect_options())
            .await
            .map_err(|e| {
                SchemaError::DatabaseError(format!("Failed to connect to {config}: {e}"))
            })?;

        let connection = MySqlConnection {
            pool,
            config: config.clone(),
        };
        connection.check().await?;
        Ok(connection)
    }

    /// Round-trips a trivial query so that bad credentials fail early.
    pub async fn check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                SchemaError::DatabaseError(format!(
                    "Connectivity check against {} failed: {e}",
                    self.config
                ))
            })?;
        Ok(())
    }

    pub fn pool(&self) -> &Pool<MySql> {
        &self.pool
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub(crate) fn query_error(&self, sql: &str, e: sqlx::Error) -> SchemaError {
        SchemaError::DatabaseError(format!(
            "Query `{}` failed on {}: {e}",
            collapse_whitespace(sql),
            self.config.database
        ))
    }
}
