use std::io;

use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogFormat, LoggingConfig};

/// Installs the global subscriber. A second call is a no-op so tests and
/// embedded callers can initialise freely.
pub fn init_logging(config: &LoggingConfig) {
    let _ = build_subscriber(config, io::stdout).try_init();
}

/// Same as [`init_logging`] but writes to stderr, leaving stdout to the
/// command's own output line.
pub fn init_logging_to_stderr(config: &LoggingConfig) {
    let _ = build_subscriber(config, io::stderr).try_init();
}

fn build_subscriber<W>(config: &LoggingConfig, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let log_level = config.level.trim().parse::<Level>().unwrap_or(Level::INFO);
    let builder =
        tracing_subscriber::fmt().with_target(false).with_max_level(log_level).with_writer(writer);

    match config.format {
        LogFormat::Compact => Box::new(builder.compact().finish()),
        LogFormat::Pretty => Box::new(builder.pretty().finish()),
        LogFormat::Json => Box::new(builder.json().finish()),
    }
}
