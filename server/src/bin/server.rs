//! Pharmacy point-of-sale HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Start PostgreSQL
//! docker compose up -d
//!
//! # Run server (reads .env when present)
//! cargo run --bin server
//! ```

use pharmacy_server::{init_tracing, run, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    init_tracing();
    tracing::info!("Starting pharmacy server...");

    let config = Config::from_env();
    tracing::info!(
        database = %config.database.redacted_url(),
        http = %config.server.http_addr(),
        metrics = %config.server.metrics_addr(),
        "Configuration loaded"
    );

    run(config).await?;
    Ok(())
}
