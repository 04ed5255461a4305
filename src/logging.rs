// academy-export/src/logging.rs

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ServiceConfig;

/// Install the global subscriber. Returns `false` when the host application
/// already installed one, which is left untouched.
pub fn init(config: &ServiceConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if installed.is_ok() {
        tracing::info!(
            service = %config.name,
            version = env!("CARGO_PKG_VERSION"),
            "Logging initialized"
        );
    }
    installed.is_ok()
}
