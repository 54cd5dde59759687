pub mod config;
pub mod intake;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod storage;

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
