pub mod config;
pub mod models;
pub mod pipeline; // Hybrid text → classification → entity extraction
pub mod intake; // Object store, metadata store and annotation platform plumbing

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the build-profile default from
/// [`config::default_log_filter`] applies. Call once from the binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
