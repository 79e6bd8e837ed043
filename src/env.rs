//! Key/default pairs and typed lookup helpers for every recognized
//! environment variable, read once at startup (§4.11).

use log::LevelFilter;
use std::str::FromStr;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HTTP_PORT: (&str, u16) = ("HTTP_PORT", 13381);
pub const HTTP_ADDRESS: (&str, &str) = ("HTTP_ADDRESS", "0.0.0.0");
pub const HTTP_THREAD_COUNT: (&str, u16) = ("HTTP_THREAD_COUNT", 16);
pub const HTTP_USING_CLOUDFLARE: (&str, bool) = ("HTTP_USING_CLOUDFLARE", false);

pub const MYSQL_HOST: (&str, &str) = ("MYSQL_HOST", "localhost");
pub const MYSQL_PORT: (&str, u16) = ("MYSQL_PORT", 3306);
pub const MYSQL_USERNAME: (&str, &str) = ("MYSQL_USERNAME", "root");
pub const MYSQL_PASSWORD: (&str, &str) = ("MYSQL_PASSWORD", "");
pub const MYSQL_DATABASE: (&str, &str) = ("MYSQL_DATABASE", "bancho");
pub const MYSQL_POOL_SIZE: (&str, u32) = ("MYSQL_POOL_SIZE", 10);

pub const REDIS_HOST: (&str, &str) = ("REDIS_HOST", "localhost");
pub const REDIS_PORT: (&str, u16) = ("REDIS_PORT", 6379);
pub const REDIS_PASSWORD: (&str, &str) = ("REDIS_PASSWORD", "");
pub const REDIS_DATABASE: (&str, u8) = ("REDIS_DATABASE", 0);

pub const PS_NAME: (&str, &str) = ("PS_NAME", "Bancho");
pub const PS_DOMAIN: (&str, &str) = ("PS_DOMAIN", "localhost");
pub const PS_BOT_USERNAME: (&str, &str) = ("PS_BOT_USERNAME", "BanchoBot");
pub const PS_BOT_USER_ID: (&str, i32) = ("PS_BOT_USER_ID", 1);
pub const PS_MINIMUM_CLIENT_YEAR: (&str, u16) = ("PS_MINIMUM_CLIENT_YEAR", 2016);
pub const PS_ENABLE_PY_COMMAND: (&str, bool) = ("PS_ENABLE_PY_COMMAND", false);
pub const PS_PY_COMMAND_WHITELIST: (&str, &str) = ("PS_PY_COMMAND_WHITELIST", "");
pub const PS_MAINTENANCE: (&str, bool) = ("PS_MAINTENANCE", false);
pub const PS_SILENCE_THRESHOLD: (&str, u32) = ("PS_SILENCE_THRESHOLD", 10);
pub const PS_SILENCE_WINDOW_SECONDS: (&str, u64) = ("PS_SILENCE_WINDOW_SECONDS", 10);
pub const PS_SILENCE_PENALTY_SECONDS: (&str, u32) = ("PS_SILENCE_PENALTY_SECONDS", 600);
pub const PS_DONOR_EXPIRY_WARNING_DAYS: (&str, u32) = ("PS_DONOR_EXPIRY_WARNING_DAYS", 7);
pub const PS_RESTART_COUNTDOWN_SECONDS: (&str, u64) = ("PS_RESTART_COUNTDOWN_SECONDS", 30);

pub const IP2LOCATION_API_KEY: (&str, &str) = ("IP2LOCATION_API_KEY", "");
pub const PERFORMANCE_SERVICE_URL: (&str, &str) =
    ("PERFORMANCE_SERVICE_URL", "http://localhost:5001");

pub fn logging_level() -> LevelFilter {
    const ENV_KEY: &str = "LOG_LEVEL";
    const DEFAULT: LevelFilter = LevelFilter::Info;
    std::env::var(ENV_KEY).map_or(DEFAULT, |value| {
        LevelFilter::from_str(&value).unwrap_or(DEFAULT)
    })
}

#[inline]
pub fn str_env(pair: (&str, &str)) -> String {
    std::env::var(pair.0).unwrap_or_else(|_| pair.1.to_string())
}

#[inline]
pub fn u16_env(pair: (&str, u16)) -> u16 {
    std::env::var(pair.0).map_or(pair.1, |value| value.parse::<u16>().unwrap_or(pair.1))
}

#[inline]
pub fn u32_env(pair: (&str, u32)) -> u32 {
    std::env::var(pair.0).map_or(pair.1, |value| value.parse::<u32>().unwrap_or(pair.1))
}

#[inline]
pub fn u64_env(pair: (&str, u64)) -> u64 {
    std::env::var(pair.0).map_or(pair.1, |value| value.parse::<u64>().unwrap_or(pair.1))
}

#[inline]
pub fn i32_env(pair: (&str, i32)) -> i32 {
    std::env::var(pair.0).map_or(pair.1, |value| value.parse::<i32>().unwrap_or(pair.1))
}

#[inline]
pub fn u8_env(pair: (&str, u8)) -> u8 {
    std::env::var(pair.0).map_or(pair.1, |value| value.parse::<u8>().unwrap_or(pair.1))
}

#[inline]
pub fn bool_env(pair: (&str, bool)) -> bool {
    std::env::var(pair.0).map_or(pair.1, |value| {
        value.to_lowercase().parse::<bool>().unwrap_or(pair.1)
    })
}

#[inline]
pub fn from_env<F: FromStr>(pair: (&str, F)) -> F {
    std::env::var(pair.0)
        .ok()
        .and_then(|value| F::from_str(&value).ok())
        .unwrap_or(pair.1)
}
