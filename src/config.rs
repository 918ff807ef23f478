use std::env;
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_ACCESS_EXPIRES_IN: &str = "15m";
const DEFAULT_REFRESH_EXPIRES_IN: &str = "7d";
/// Upper bound for either token lifetime: ten years.
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub cors_origin: Option<String>,
    pub tokens: TokensConfig,
    pub hashing: HashingConfig,
}

/// Signing secrets, token lifetimes and the password pepper.
#[derive(Clone)]
pub struct TokensConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_expires_in: Duration,
    pub refresh_expires_in: Duration,
    pub argon2_pepper: String,
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            database_url: required(&lookup, "DATABASE_URL")?,
            server_port: parse_or(&lookup, "SERVER_PORT", 8080)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            cors_origin: lookup("CORS_ORIGIN").filter(|origin| !origin.is_empty()),
            tokens: TokensConfig::from_lookup(&lookup)?,
            hashing: HashingConfig::from_lookup(&lookup)?,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

impl TokensConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_expires_in = lookup("JWT_ACCESS_EXPIRES_IN")
            .unwrap_or_else(|| DEFAULT_ACCESS_EXPIRES_IN.to_string());
        let refresh_expires_in = lookup("JWT_REFRESH_EXPIRES_IN")
            .unwrap_or_else(|| DEFAULT_REFRESH_EXPIRES_IN.to_string());

        Ok(Self {
            access_secret: required(lookup, "JWT_ACCESS_SECRET")?,
            refresh_secret: required(lookup, "JWT_REFRESH_SECRET")?,
            access_expires_in: token_lifetime("JWT_ACCESS_EXPIRES_IN", &access_expires_in)?,
            refresh_expires_in: token_lifetime("JWT_REFRESH_EXPIRES_IN", &refresh_expires_in)?,
            argon2_pepper: required(lookup, "ARGON2_PEPPER")?,
        })
    }
}

impl HashingConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            memory_kib: parse_or(lookup, "ARGON2_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(lookup, "ARGON2_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or(lookup, "ARGON2_PARALLELISM", defaults.parallelism)?,
        })
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(AppError::ConfigError(format!(
            "Environment variable {} is not defined",
            key
        ))),
    }
}

fn token_lifetime(key: &str, raw: &str) -> Result<Duration, AppError> {
    let lifetime =
        parse_duration(raw).map_err(|e| AppError::ConfigError(format!("{}: {}", key, e)))?;
    if lifetime > MAX_TOKEN_LIFETIME {
        return Err(AppError::ConfigError(format!(
            "{}: lifetime '{}' exceeds the maximum of {} days",
            key,
            raw.trim(),
            MAX_TOKEN_LIFETIME.as_secs() / 86_400
        )));
    }
    Ok(lifetime)
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::ConfigError(format!("{} must be a number", key))),
        None => Ok(default),
    }
}

/// Parses a lifetime such as `15m`, `7d` or `3600`.
///
/// Supported units are `s`, `m`, `h`, `d` and `w`; a bare number means seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (amount, unit) = input.split_at(split);

    let amount: u64 = amount
        .parse()
        .map_err(|_| format!("invalid duration '{}'", input))?;
    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 60 * 60 * 24,
        "w" => 60 * 60 * 24 * 7,
        other => return Err(format!("unknown duration unit '{}'", other)),
    };

    if amount == 0 {
        return Err(format!("duration '{}' must be positive", input));
    }

    amount
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", input))
}
