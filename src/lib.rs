//! Weightless character controller library
//!
//! Grounded walking, ballistic flight, zero-gravity drift and handle
//! grab/push-off for a single rigid-body player.

pub mod config;
pub mod game;
pub mod save;

/// Initialize logging. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rapier3d=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
