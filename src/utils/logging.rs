// src/utils/logging.rs
use log::LevelFilter;

/// Route `log` output to stderr through `env_logger`, honouring `RUST_LOG`
/// (default level: info). Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    init_logging_with_default(LevelFilter::Info);
}

pub fn init_logging_with_default(default_level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}
