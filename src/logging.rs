use log::LevelFilter;

/// Start the process-wide logger. `RUST_LOG` overrides the `info` default;
/// calling this twice is harmless.
pub fn init_logging() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}
