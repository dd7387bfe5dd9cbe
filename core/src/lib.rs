pub mod config;
pub mod error;
pub mod metrics;
pub mod model;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the fmt subscriber once per process; later calls are no-ops.
pub fn init_tracing() {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
}
