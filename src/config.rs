use std::env;
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_TOKEN_TTL_MINUTES: u32 = 24 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} not set")]
    Missing(&'static str),
    #[error("environment variable {key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Process-wide settings, read once at startup and handed to the service.
#[derive(Clone, Debug)]
pub struct EnvConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_minutes: u32,
    pub bcrypt_cost: u32,
    pub user_store_path: Option<PathBuf>,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let port = parse_or("PORT", &lookup, DEFAULT_PORT)?;
        let token_ttl_minutes = parse_or("TOKEN_TTL_MINUTES", &lookup, DEFAULT_TOKEN_TTL_MINUTES)?;
        if token_ttl_minutes == 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_MINUTES",
                value: token_ttl_minutes.to_string(),
            });
        }

        let bcrypt_cost = parse_or("BCRYPT_COST", &lookup, bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        Ok(EnvConfig {
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            jwt_secret,
            token_ttl_minutes,
            bcrypt_cost,
            user_store_path: lookup("USER_STORE_PATH")
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(key: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = EnvConfig::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.token_ttl_minutes, DEFAULT_TOKEN_TTL_MINUTES);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert!(config.user_store_path.is_none());
    }

    #[test]
    fn secret_is_required() {
        let err = EnvConfig::from_lookup(lookup_from(&[("PORT", "9000")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));

        let err = EnvConfig::from_lookup(lookup_from(&[("JWT_SECRET", "")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = EnvConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("TOKEN_TTL_MINUTES", "5"),
            ("BCRYPT_COST", "4"),
            ("USER_STORE_PATH", "/var/lib/users.json"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.token_ttl_minutes, 5);
        assert_eq!(config.bcrypt_cost, 4);
        assert_eq!(config.user_store_path, Some(PathBuf::from("/var/lib/users.json")));
    }

    #[rstest::rstest]
    #[case("PORT", "eighty")]
    #[case("TOKEN_TTL_MINUTES", "0")]
    #[case("BCRYPT_COST", "3")]
    #[case("BCRYPT_COST", "32")]
    fn invalid_values_are_rejected(#[case] key: &'static str, #[case] value: &str) {
        let err = EnvConfig::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret"), (key, value)]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: k, .. } if k == key));
    }
}
