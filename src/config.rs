use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing the environment variable {0}")]
    MissingVar(String),
    #[error("invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Everything tunable, loaded from the environment at startup. The caps
/// mirror the client defaults: 50 messages per chat view, 20 statuses on
/// the feed, 1.5 MiB per media attachment, 500 rows per deletion sweep.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub chat_history_limit: i64,
    pub status_feed_limit: i64,
    pub media_max_bytes: usize,
    pub delete_batch_size: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenv::dotenv().ok();
        }

        let bind_address = var_or("BIND_ADDRESS", "0.0.0.0:8080")?;
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_owned()))?;

        Ok(Self {
            bind_address,
            database_url,
            chat_history_limit: var_or("CHAT_HISTORY_LIMIT", "50")?,
            status_feed_limit: var_or("STATUS_FEED_LIMIT", "20")?,
            media_max_bytes: var_or("MEDIA_MAX_BYTES", "1572864")?,
            delete_batch_size: var_or("DELETE_BATCH_SIZE", "500")?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".parse().unwrap(),
            database_url: "sqlite::memory:".to_owned(),
            chat_history_limit: 50,
            status_feed_limit: 20,
            media_max_bytes: 1_572_864,
            delete_batch_size: 500,
        }
    }
}

fn var_or<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_owned());
    raw.parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue(key.to_owned(), e.to_string()))
}
