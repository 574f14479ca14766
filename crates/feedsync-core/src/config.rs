use std::str::FromStr;

use rust_decimal::Decimal;

use crate::app_config::{AppConfig, Environment};
use crate::settings::{
    MatchSettings, DEFAULT_FUZZY_THRESHOLD, DEFAULT_MAX_CANDIDATES,
    DEFAULT_PRICE_CHANGE_THRESHOLD_PCT, DEFAULT_SKU_BOOST, DEFAULT_TARGET_CANDIDATES,
};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function,
/// so parsing can be tested against a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse = |var: &str, default: String| -> ParsedVar {
        ParsedVar {
            var: var.to_string(),
            raw: or_default(var, &default),
        }
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("FEEDSYNC_ENV", "development"));
    let log_level = or_default("FEEDSYNC_LOG_LEVEL", "info");
    let suppliers_path = PathBuf::from(or_default(
        "FEEDSYNC_SUPPLIERS_PATH",
        "./config/suppliers.yaml",
    ));

    let db_max_connections = parse("FEEDSYNC_DB_MAX_CONNECTIONS", "10".into()).value::<u32>()?;
    let db_min_connections = parse("FEEDSYNC_DB_MIN_CONNECTIONS", "1".into()).value::<u32>()?;
    let db_acquire_timeout_secs =
        parse("FEEDSYNC_DB_ACQUIRE_TIMEOUT_SECS", "10".into()).value::<u64>()?;
    let max_concurrent_suppliers =
        parse("FEEDSYNC_MAX_CONCURRENT_SUPPLIERS", "1".into()).value::<usize>()?;

    let fuzzy_threshold = parse(
        "FEEDSYNC_FUZZY_THRESHOLD",
        DEFAULT_FUZZY_THRESHOLD.to_string(),
    )
    .value::<f64>()?;
    let sku_boost = parse("FEEDSYNC_SKU_BOOST", DEFAULT_SKU_BOOST.to_string()).value::<f64>()?;
    let price_change_threshold_pct = parse(
        "FEEDSYNC_PRICE_CHANGE_THRESHOLD_PCT",
        DEFAULT_PRICE_CHANGE_THRESHOLD_PCT.to_string(),
    )
    .value::<Decimal>()?;
    let target_candidates = parse(
        "FEEDSYNC_SEARCH_TARGET_CANDIDATES",
        DEFAULT_TARGET_CANDIDATES.to_string(),
    )
    .value::<usize>()?;
    let max_candidates = parse(
        "FEEDSYNC_SEARCH_MAX_CANDIDATES",
        DEFAULT_MAX_CANDIDATES.to_string(),
    )
    .value::<usize>()?;

    if !(0.0..=1.0).contains(&fuzzy_threshold) {
        return Err(ConfigError::InvalidEnvVar {
            var: "FEEDSYNC_FUZZY_THRESHOLD".to_string(),
            reason: format!("{fuzzy_threshold} is outside 0.0..=1.0"),
        });
    }
    if price_change_threshold_pct < Decimal::ZERO {
        return Err(ConfigError::InvalidEnvVar {
            var: "FEEDSYNC_PRICE_CHANGE_THRESHOLD_PCT".to_string(),
            reason: "must not be negative".to_string(),
        });
    }
    if target_candidates > max_candidates {
        return Err(ConfigError::InvalidEnvVar {
            var: "FEEDSYNC_SEARCH_TARGET_CANDIDATES".to_string(),
            reason: format!("{target_candidates} exceeds FEEDSYNC_SEARCH_MAX_CANDIDATES ({max_candidates})"),
        });
    }

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        suppliers_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        max_concurrent_suppliers,
        matching: MatchSettings {
            fuzzy_threshold,
            sku_boost,
            price_change_threshold_pct,
            target_candidates,
            max_candidates,
        },
    })
}

/// A raw env value paired with its variable name for error reporting.
struct ParsedVar {
    var: String,
    raw: String,
}

impl ParsedVar {
    fn value<T>(self) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: self.var,
                reason: e.to_string(),
            })
    }
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
