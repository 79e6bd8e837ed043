//! Log4rs setup (§9 ambient stack): console plus a size-rolling file
//! appender, matching the logging provider this server's dependency
//! stack carries regardless of which protocol features are in scope.

use crate::env;
use log::LevelFilter;
use log4rs::{
    append::{
        console::ConsoleAppender,
        rolling_file::{
            policy::compound::{
                roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger, CompoundPolicy,
            },
            RollingFileAppender,
        },
    },
    config::{Appender, Logger, Root},
    encode::pattern::PatternEncoder,
    init_config, Config,
};

const LOGGING_PATTERN: &str = "[{d} {h({l})} {M}] {m}{n}";
const LOGGING_MAX_SIZE: u64 = 1024 * 1024 * 5;
const LOGGING_MAX_FILES: u32 = 8;
const LOGGING_MODULES: [&str; 2] = ["bancho_server", "sea_orm"];

/// Configures console + rolling-file logging for the process. Falls back
/// to a bare `env_logger`-style root if the file appender cannot be
/// created (e.g. the log directory does not exist and cannot be made).
pub fn setup() {
    let logging_level = env::logging_level();
    let logging_path = "logs";

    let pattern = Box::new(PatternEncoder::new(LOGGING_PATTERN));
    let size_trigger = SizeTrigger::new(LOGGING_MAX_SIZE);

    let file_pattern = format!("{logging_path}/log-{{}}.log.gz");
    let latest_path = format!("{logging_path}/log.log");

    let fixed_window_roller = FixedWindowRoller::builder()
        .build(&file_pattern, LOGGING_MAX_FILES)
        .expect("fixed window log roller pattern is well-formed");

    let compound_policy =
        CompoundPolicy::new(Box::new(size_trigger), Box::new(fixed_window_roller));

    let stdout_appender = ConsoleAppender::builder().encoder(pattern.clone()).build();

    let file_appender = RollingFileAppender::builder()
        .encoder(pattern)
        .build(&latest_path, Box::new(compound_policy));

    let mut builder = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout_appender)));

    let appenders: &[&str] = match file_appender {
        Ok(file_appender) => {
            builder = builder.appender(Appender::builder().build("file", Box::new(file_appender)));
            &["stdout", "file"]
        }
        Err(_) => &["stdout"],
    };

    for module in LOGGING_MODULES {
        builder = builder.logger(
            Logger::builder()
                .appenders(appenders.iter().copied())
                .additive(false)
                .build(module, logging_level),
        )
    }

    let config = builder
        .build(Root::builder().appenders(appenders.iter().copied()).build(LevelFilter::Warn))
        .expect("logging config is internally consistent");

    init_config(config).expect("logger can only be initialized once per process");
}
