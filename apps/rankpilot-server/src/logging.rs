use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Initialize tracing. CLI verbosity overrides the configured level:
/// -v info, -vv debug, -vvv trace.
pub fn init_logging(config: &LoggingConfig, verbose: u8) {
    let directive = match verbose {
        0 => config.level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
