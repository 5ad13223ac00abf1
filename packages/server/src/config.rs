use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::domains::consensus::policy::{VotingPolicy, DEFAULT_MAJORITY};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub voting_majority: f64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. `from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            database_url: lookup("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|| "10".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
            voting_majority: match lookup("VOTING_MAJORITY") {
                Some(raw) => raw
                    .parse()
                    .context("VOTING_MAJORITY must be a decimal fraction")?,
                None => DEFAULT_MAJORITY,
            },
        };

        // Reject a bad threshold at startup rather than on the first vote
        config.voting_policy()?;
        Ok(config)
    }

    pub fn voting_policy(&self) -> Result<VotingPolicy> {
        VotingPolicy::new(self.voting_majority).context("invalid VOTING_MAJORITY")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/packtrack")]).unwrap();
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.voting_majority, DEFAULT_MAJORITY);
    }

    #[test]
    fn test_database_url_required() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_majority_override() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/packtrack"),
            ("VOTING_MAJORITY", "0.75"),
        ])
        .unwrap();
        assert_eq!(config.voting_policy().unwrap().majority(), 0.75);
    }

    #[test]
    fn test_majority_out_of_range() {
        assert!(load(&[
            ("DATABASE_URL", "postgres://localhost/packtrack"),
            ("VOTING_MAJORITY", "0.4"),
        ])
        .is_err());
        assert!(load(&[
            ("DATABASE_URL", "postgres://localhost/packtrack"),
            ("VOTING_MAJORITY", "most"),
        ])
        .is_err());
    }
}
