//! Middle East Kaleidoscope service entrypoint.
//! Boots the Axum HTTP server around the news desk.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs, filtered by KALEIDOSCOPE_LOG (then RUST_LOG).
/// Uses `try_init` so a subscriber installed by the runtime is left alone.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("KALEIDOSCOPE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("mideast_kaleidoscope=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let router = mideast_kaleidoscope::app().await?;
    Ok(router.into())
}
