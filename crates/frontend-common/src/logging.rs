//! Tracing subscriber setup

use tracing::Level;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber, writing to the browser console
#[cfg(target_arch = "wasm32")]
pub fn init_logging(level: Level) -> Result<(), TryInitError> {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_web::MakeWebConsoleWriter;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_writer(MakeWebConsoleWriter::new());

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(fmt_layer)
        .try_init()
}

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over `level`.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging(level: Level) -> Result<(), TryInitError> {
    use tracing_subscriber::EnvFilter;

    let level_str = level.as_str().to_lowercase();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("quill_http={level_str},quill_frontend_common={level_str}").into()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
