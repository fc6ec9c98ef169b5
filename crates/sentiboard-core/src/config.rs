use crate::app_config::{AppConfig, CorsOrigins, Environment};
use crate::terms::parse_search_terms;
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str = "sentiboard/0.1 (sentiment-dashboard)";
const DEFAULT_MAX_STORED: usize = 100;
const LOW_MEMORY_MAX_STORED: usize = 50;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
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
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable is optional. Blank values count as unset.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default =
        |var: &str, default: &str| -> String { optional(var).unwrap_or_else(|| default.to_string()) };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("SENTIBOARD_ENV", "development"));

    let mut bind_addr = or_default("SENTIBOARD_BIND_ADDR", "0.0.0.0:5000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("SENTIBOARD_BIND_ADDR", e.to_string()))?;
    if let Some(port) = optional("PORT") {
        let port = port
            .parse::<u16>()
            .map_err(|e| invalid("PORT", e.to_string()))?;
        bind_addr.set_port(port);
    }

    let log_level = or_default("SENTIBOARD_LOG_LEVEL", "info");
    let low_memory = parse_bool(&or_default("SENTIBOARD_LOW_MEMORY", "false"))
        .ok_or_else(|| invalid("SENTIBOARD_LOW_MEMORY", "expected true or false".to_string()))?;

    let search_terms = parse_search_terms(&or_default(
        "SENTIBOARD_SEARCH_TERMS",
        "python,data science,AI",
    ));
    if search_terms.is_empty() {
        return Err(invalid(
            "SENTIBOARD_SEARCH_TERMS",
            "at least one non-empty term is required".to_string(),
        ));
    }

    let max_items = parse_usize("SENTIBOARD_MAX_ITEMS", "100")?;
    if max_items == 0 {
        return Err(invalid("SENTIBOARD_MAX_ITEMS", "must be at least 1".to_string()));
    }

    let cors_origins = parse_cors_origins(&or_default("SENTIBOARD_CORS_ORIGINS", "*"));

    let default_max_stored = if low_memory {
        LOW_MEMORY_MAX_STORED
    } else {
        DEFAULT_MAX_STORED
    };
    let max_stored = parse_usize("SENTIBOARD_MAX_STORED", &default_max_stored.to_string())?;

    let demo_interval_secs = parse_u64("SENTIBOARD_DEMO_INTERVAL_SECS", "10")?;
    let live_interval_secs = parse_u64("SENTIBOARD_LIVE_INTERVAL_SECS", "60")?;
    let error_cooldown_secs = parse_u64("SENTIBOARD_ERROR_COOLDOWN_SECS", "10")?;
    let request_timeout_secs = parse_u64("SENTIBOARD_REQUEST_TIMEOUT_SECS", "30")?;
    let inter_request_delay_ms = parse_u64("SENTIBOARD_INTER_REQUEST_DELAY_MS", "2000")?;
    let user_agent = or_default("SENTIBOARD_USER_AGENT", DEFAULT_USER_AGENT);

    let mut config = AppConfig {
        env,
        bind_addr,
        log_level,
        search_terms,
        max_items,
        low_memory,
        cors_origins,
        max_stored,
        demo_interval_secs,
        live_interval_secs,
        error_cooldown_secs,
        request_timeout_secs,
        inter_request_delay_ms,
        user_agent,
        sentiment_model_url: optional("SENTIBOARD_SENTIMENT_MODEL_URL"),
        twitter_bearer_token: optional("TWITTER_BEARER_TOKEN"),
        reddit_client_id: optional("REDDIT_CLIENT_ID"),
        reddit_client_secret: optional("REDDIT_CLIENT_SECRET"),
        reddit_user_agent: or_default("REDDIT_USER_AGENT", DEFAULT_USER_AGENT),
    };
    config.max_items = config.max_items.min(config.max_items_ceiling());

    Ok(config)
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

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_cors_origins(raw: &str) -> CorsOrigins {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        CorsOrigins::Any
    } else {
        CorsOrigins::List(origins)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
