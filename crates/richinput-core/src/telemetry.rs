//! Console tracing for native hosts and test harnesses.
//!
//! # Usage
//!
//! ```ignore
//! richinput_core::telemetry::init_tracing();
//! tracing::info!("controls ready");
//! ```

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install a console subscriber. `RUST_LOG` overrides the default level
/// (DEBUG in debug builds, INFO otherwise).
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_tracing() {
    let level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("richinput_core={level},warn")));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}
