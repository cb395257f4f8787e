use jsonwebtoken::Algorithm;
use std::{env, fmt, str::FromStr};

/// Runtime settings, read from the environment (and `.env` through `dotenv`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server_port: u16,
    pub server_host: String,
    /// Secret used to sign access tokens.
    pub secret_key: String,
    pub algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "{} must be set", name),
            ConfigError::Invalid(name, value) => write!(f, "{} has an invalid value: {}", name, value),
        }
    }
}

impl std::error::Error for ConfigError {}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid(name, value)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let algorithm = match env::var("ALGORITHM") {
            Ok(value) => {
                Algorithm::from_str(&value).map_err(|_| ConfigError::Invalid("ALGORITHM", value))?
            }
            Err(_) => Algorithm::HS256,
        };

        Ok(Self {
            database_url: Self::database_url_from_env()?,
            database_max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 5)?,
            server_port: parsed_or("SERVER_PORT", 8080)?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            secret_key: required("SECRET_KEY")?,
            algorithm,
            access_token_expire_minutes: parsed_or("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
        })
    }

    /// `DATABASE_URL` wins; otherwise the URL is assembled from its parts.
    fn database_url_from_env() -> Result<String, ConfigError> {
        if let Ok(url) = env::var("DATABASE_URL") {
            return Ok(url);
        }
        let user = required("DATABASE_USER")?;
        let password = required("DATABASE_PASSWORD")?;
        let host = required("DATABASE_HOST")?;
        let port: u16 = parsed_or("DATABASE_PORT", 5432)?;
        let name = env::var("DATABASE_NAME").unwrap_or_else(|_| "fluentia".to_string());
        Ok(format!(
            "postgres://{}:{}@{}:{}/{}",
            user, password, host, port, name
        ))
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazy_static::lazy_static;
    use std::sync::Mutex;

    lazy_static! {
        static ref ENV_LOCK: Mutex<()> = Mutex::new(());
    }

    const VARS: [&str; 12] = [
        "DATABASE_URL",
        "DATABASE_USER",
        "DATABASE_PASSWORD",
        "DATABASE_HOST",
        "DATABASE_PORT",
        "DATABASE_NAME",
        "SECRET_KEY",
        "ALGORITHM",
        "ACCESS_TOKEN_EXPIRE_MINUTES",
        "SERVER_PORT",
        "SERVER_HOST",
        "DATABASE_MAX_CONNECTIONS",
    ];

    fn with_clean_env<F: FnOnce()>(test_logic: F) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let saved: Vec<_> = VARS.iter().map(|name| (*name, env::var(name).ok())).collect();
        for name in VARS {
            env::remove_var(name);
        }

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(test_logic));

        for (name, value) in saved {
            match value {
                Some(value) => env::set_var(name, value),
                None => env::remove_var(name),
            }
        }
        if let Err(panic_payload) = result {
            std::panic::resume_unwind(panic_payload);
        }
    }

    #[test]
    fn test_config_from_env() {
        with_clean_env(|| {
            env::set_var("DATABASE_URL", "postgres://test");
            env::set_var("SECRET_KEY", "secret");

            let config = Config::from_env().unwrap();

            assert_eq!(config.database_url, "postgres://test");
            assert_eq!(config.server_port, 8080);
            assert_eq!(config.server_host, "127.0.0.1");
            assert_eq!(config.algorithm, Algorithm::HS256);
            assert_eq!(config.access_token_expire_minutes, 30);

            env::set_var("SERVER_PORT", "3000");
            env::set_var("SERVER_HOST", "0.0.0.0");
            env::set_var("ALGORITHM", "HS512");

            let config = Config::from_env().unwrap();

            assert_eq!(config.server_port, 3000);
            assert_eq!(config.server_url(), "http://0.0.0.0:3000");
            assert_eq!(config.algorithm, Algorithm::HS512);
        });
    }

    #[test]
    fn test_database_url_from_parts() {
        with_clean_env(|| {
            env::set_var("SECRET_KEY", "secret");
            env::set_var("DATABASE_USER", "app");
            env::set_var("DATABASE_PASSWORD", "pass");
            env::set_var("DATABASE_HOST", "db");
            env::set_var("DATABASE_PORT", "5433");
            env::set_var("DATABASE_NAME", "fluentia_test");

            let config = Config::from_env().unwrap();

            assert_eq!(config.database_url, "postgres://app:pass@db:5433/fluentia_test");
        });
    }

    #[test]
    fn test_missing_and_invalid_values() {
        with_clean_env(|| {
            env::set_var("DATABASE_URL", "postgres://test");
            assert_eq!(
                Config::from_env().unwrap_err(),
                ConfigError::Missing("SECRET_KEY")
            );

            env::set_var("SECRET_KEY", "secret");
            env::set_var("SERVER_PORT", "not-a-port");
            assert_eq!(
                Config::from_env().unwrap_err(),
                ConfigError::Invalid("SERVER_PORT", "not-a-port".into())
            );
        });
    }
}
