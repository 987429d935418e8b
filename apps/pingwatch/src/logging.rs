use std::env;
use std::io;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Diagnostics go to stderr so stdout carries only the report text.
///
/// `RUST_LOG` filters (default `warn`); `RUST_LOG_FORMAT=json` switches to
/// JSON lines.
pub fn init() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    let json = matches!(env::var("RUST_LOG_FORMAT").as_deref(), Ok("json"));

    let layer = if json {
        fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_filter(env_filter)
            .boxed()
    } else {
        fmt::layer()
            .compact()
            .without_time()
            .with_writer(io::stderr)
            .with_filter(env_filter)
            .boxed()
    };

    tracing_subscriber::registry().with(layer).init();
}
