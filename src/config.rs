//! Typed configuration snapshot resolved once from the environment at
//! startup (§4.11). Downstream code takes `Arc<Config>` rather than
//! re-reading environment variables, so tests can construct a `Config`
//! directly instead of mutating process environment.

use std::net::IpAddr;

use crate::env;

pub struct Config {
    pub http: HttpConfig,
    pub mysql: MysqlConfig,
    pub redis: RedisConfig,
    pub branding: BrandingConfig,
    pub silence: SilenceConfig,
    pub debug_eval: DebugEvalConfig,
    pub restart: RestartConfig,
    pub geo_api_key: String,
    pub performance_service_url: String,
}

pub struct HttpConfig {
    pub address: IpAddr,
    pub port: u16,
    pub thread_count: u16,
    pub using_cloudflare: bool,
}

pub struct MysqlConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub pool_size: u32,
}

impl MysqlConfig {
    pub fn connection_string(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    pub database: u8,
}

impl RedisConfig {
    pub fn connection_string(&self) -> String {
        if self.password.is_empty() {
            format!("redis://{}:{}/{}", self.host, self.port, self.database)
        } else {
            format!(
                "redis://:{}@{}:{}/{}",
                self.password, self.host, self.port, self.database
            )
        }
    }
}

pub struct BrandingConfig {
    pub name: String,
    pub domain: String,
    pub bot_username: String,
    pub bot_user_id: i32,
    pub minimum_client_year: u16,
    pub maintenance: bool,
    pub donor_expiry_warning_days: u32,
}

pub struct SilenceConfig {
    pub threshold: u32,
    pub window_seconds: u64,
    pub penalty_seconds: u32,
}

pub struct RestartConfig {
    pub countdown_seconds: u64,
}

/// The debug `!py` bot command is kept as a recognized, inert config
/// surface: `enabled` is read but the handler never evaluates anything,
/// matching the design note that this gate stays a documented no-op.
pub struct DebugEvalConfig {
    pub enabled: bool,
    pub whitelist: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            http: HttpConfig {
                address: env::str_env(env::HTTP_ADDRESS)
                    .parse()
                    .unwrap_or_else(|_| "0.0.0.0".parse().unwrap()),
                port: env::u16_env(env::HTTP_PORT),
                thread_count: env::u16_env(env::HTTP_THREAD_COUNT),
                using_cloudflare: env::bool_env(env::HTTP_USING_CLOUDFLARE),
            },
            mysql: MysqlConfig {
                host: env::str_env(env::MYSQL_HOST),
                port: env::u16_env(env::MYSQL_PORT),
                username: env::str_env(env::MYSQL_USERNAME),
                password: env::str_env(env::MYSQL_PASSWORD),
                database: env::str_env(env::MYSQL_DATABASE),
                pool_size: env::u32_env(env::MYSQL_POOL_SIZE),
            },
            redis: RedisConfig {
                host: env::str_env(env::REDIS_HOST),
                port: env::u16_env(env::REDIS_PORT),
                password: env::str_env(env::REDIS_PASSWORD),
                database: env::u8_env(env::REDIS_DATABASE),
            },
            branding: BrandingConfig {
                name: env::str_env(env::PS_NAME),
                domain: env::str_env(env::PS_DOMAIN),
                bot_username: env::str_env(env::PS_BOT_USERNAME),
                bot_user_id: env::i32_env(env::PS_BOT_USER_ID),
                minimum_client_year: env::u16_env(env::PS_MINIMUM_CLIENT_YEAR),
                maintenance: env::bool_env(env::PS_MAINTENANCE),
                donor_expiry_warning_days: env::u32_env(env::PS_DONOR_EXPIRY_WARNING_DAYS),
            },
            silence: SilenceConfig {
                threshold: env::u32_env(env::PS_SILENCE_THRESHOLD),
                window_seconds: env::u64_env(env::PS_SILENCE_WINDOW_SECONDS),
                penalty_seconds: env::u32_env(env::PS_SILENCE_PENALTY_SECONDS),
            },
            debug_eval: DebugEvalConfig {
                enabled: env::bool_env(env::PS_ENABLE_PY_COMMAND),
                whitelist: env::str_env(env::PS_PY_COMMAND_WHITELIST)
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect(),
            },
            restart: RestartConfig {
                countdown_seconds: env::u64_env(env::PS_RESTART_COUNTDOWN_SECONDS),
            },
            geo_api_key: env::str_env(env::IP2LOCATION_API_KEY),
            performance_service_url: env::str_env(env::PERFORMANCE_SERVICE_URL),
        }
    }

    /// A config snapshot with every default value, for tests that need an
    /// `AppState` but don't care about any particular setting.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            http: HttpConfig {
                address: "0.0.0.0".parse().unwrap(),
                port: env::HTTP_PORT.1,
                thread_count: env::HTTP_THREAD_COUNT.1,
                using_cloudflare: false,
            },
            mysql: MysqlConfig {
                host: env::MYSQL_HOST.1.to_owned(),
                port: env::MYSQL_PORT.1,
                username: env::MYSQL_USERNAME.1.to_owned(),
                password: env::MYSQL_PASSWORD.1.to_owned(),
                database: env::MYSQL_DATABASE.1.to_owned(),
                pool_size: env::MYSQL_POOL_SIZE.1,
            },
            redis: RedisConfig {
                host: env::REDIS_HOST.1.to_owned(),
                port: env::REDIS_PORT.1,
                password: env::REDIS_PASSWORD.1.to_owned(),
                database: env::REDIS_DATABASE.1,
            },
            branding: BrandingConfig {
                name: env::PS_NAME.1.to_owned(),
                domain: env::PS_DOMAIN.1.to_owned(),
                bot_username: env::PS_BOT_USERNAME.1.to_owned(),
                bot_user_id: env::PS_BOT_USER_ID.1,
                minimum_client_year: env::PS_MINIMUM_CLIENT_YEAR.1,
                maintenance: false,
                donor_expiry_warning_days: env::PS_DONOR_EXPIRY_WARNING_DAYS.1,
            },
            silence: SilenceConfig {
                threshold: env::PS_SILENCE_THRESHOLD.1,
                window_seconds: env::PS_SILENCE_WINDOW_SECONDS.1,
                penalty_seconds: env::PS_SILENCE_PENALTY_SECONDS.1,
            },
            debug_eval: DebugEvalConfig {
                enabled: false,
                whitelist: Vec::new(),
            },
            restart: RestartConfig {
                countdown_seconds: env::PS_RESTART_COUNTDOWN_SECONDS.1,
            },
            geo_api_key: String::new(),
            performance_service_url: env::PERFORMANCE_SERVICE_URL.1.to_owned(),
        }
    }
}
