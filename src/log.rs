/*!

Configures the `log` crate so that core modules can report seeds, build
counts, and derived cutoffs without printing anything themselves. Downstream
models import the macros from here; presentation layers are free to route the
records wherever they like.

Logging is off by default. Call [`enable_logging`] (or [`set_log_level`]) to
turn on the console appender.

*/

use std::sync::{Mutex, MutexGuard};

use log::LevelFilter;
use log4rs::{
    Handle,
    append::console::ConsoleAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};

// Re-export so callers write `use wardsim_core::log::info;`.
pub use log::{debug, error, info, trace, warn};

const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;
const LOG_PATTERN: &str = "{d(%H:%M:%S)} {h({l})} [{t}] {m}{n}";

/// The process-wide logger state. `log4rs` may only be initialized once, so
/// the handle is kept and reconfigured on subsequent level changes.
struct LogConfiguration {
    log_level: LevelFilter,
    root_handle: Option<Handle>,
}

impl LogConfiguration {
    fn set_log_level(&mut self, level: LevelFilter) {
        self.log_level = level;
        let config = Self::build_config(level);

        match &self.root_handle {
            Some(handle) => handle.set_config(config),
            None => {
                let handle =
                    log4rs::init_config(config).expect("failed to initialize log4rs logger");
                self.root_handle = Some(handle);
            }
        }
    }

    fn build_config(level: LevelFilter) -> Config {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();

        Config::builder()
            .appender(Appender::builder().build("stdout", Box::new(stdout)))
            .build(Root::builder().appender("stdout").build(level))
            .expect("valid log4rs configuration")
    }
}

static LOG_CONFIGURATION: Mutex<LogConfiguration> = Mutex::new(LogConfiguration {
    log_level: DEFAULT_LOG_LEVEL,
    root_handle: None,
});

fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION
        .lock()
        .expect("log configuration mutex poisoned")
}

/// Sets the verbosity of the console logger, initializing it on first use.
pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().set_log_level(level);
}

/// Returns the verbosity the console logger is currently set to.
pub fn get_log_level() -> LevelFilter {
    get_log_configuration().log_level
}

/// Turns on logging at `Trace`, the firehose setting.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Turns off all log output.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}
