use anyhow::{Context, Result};

const DEFAULT_DATABASE: &str = "bookstore";
const DEFAULT_SERVER_SELECTION_TIMEOUT_SECS: u64 = 5;

/// Runtime configuration, loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub mongodb_uri: String,
    pub database: String,
    pub server_selection_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mongodb_uri =
            std::env::var("MONGODB_URI").context("MONGODB_URI must be set")?;

        let database = std::env::var("MONGODB_DATABASE")
            .unwrap_or_else(|_| DEFAULT_DATABASE.to_string());

        let server_selection_timeout_secs =
            std::env::var("MONGODB_SERVER_SELECTION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(DEFAULT_SERVER_SELECTION_TIMEOUT_SECS);

        Ok(Self {
            mongodb_uri,
            database,
            server_selection_timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_reads_overrides_and_defaults() {
        unsafe {
            std::env::set_var("MONGODB_URI", "mongodb://localhost:27017");
            std::env::remove_var("MONGODB_DATABASE");
            std::env::set_var("MONGODB_SERVER_SELECTION_TIMEOUT_SECS", "9");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.mongodb_uri, "mongodb://localhost:27017");
        assert_eq!(config.database, DEFAULT_DATABASE);
        assert_eq!(config.server_selection_timeout_secs, 9);

        unsafe {
            std::env::set_var("MONGODB_SERVER_SELECTION_TIMEOUT_SECS", "not-a-number");
        }
        let config = Config::from_env().unwrap();
        assert_eq!(
            config.server_selection_timeout_secs,
            DEFAULT_SERVER_SELECTION_TIMEOUT_SECS
        );

        unsafe {
            std::env::remove_var("MONGODB_URI");
        }
        assert!(Config::from_env().is_err());
    }
}
