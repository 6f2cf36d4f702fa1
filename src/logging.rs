//! Operator-facing log setup
//!
//! Logs go to stderr: stdout carries the wire protocol.

use tracing::metadata::LevelFilter;
use tracing_subscriber::{Layer, filter::FilterFn, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise the global subscriber
///
/// The level comes from the `LOG_LEVEL` environment variable, defaulting to
/// trace in debug builds and info otherwise.
pub fn init() {
    let level = std::env::var("LOG_LEVEL").map_or(
        if cfg!(debug_assertions) {
            LevelFilter::TRACE
        } else {
            LevelFilter::INFO
        },
        |level| match level.to_ascii_lowercase().as_str() {
            "warn" => LevelFilter::WARN,
            "info" => LevelFilter::INFO,
            "trace" => LevelFilter::TRACE,
            _ => LevelFilter::ERROR,
        },
    );

    tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_ansi(true)
                .with_writer(std::io::stderr)
                .with_filter(level)
                .with_filter(FilterFn::new(|metadata| {
                    cfg!(debug_assertions) || metadata.target().starts_with("smtp_module")
                })),
        )
        .init();
}
