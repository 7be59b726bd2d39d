//! Block puzzle session server (default binary).
//!
//! Reads `BLOCK_PUZZLE_*` from the environment and serves the line-delimited
//! JSON protocol until killed.

use std::sync::Arc;

use anyhow::{Context, Result};

use block_puzzle::adapter::{check_tcp_listen_available, run_server, ServerConfig, SessionService};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env();

    check_tcp_listen_available(&config.host, config.port)
        .with_context(|| format!("cannot listen on {}", config.bind_addr()))?;

    if let Some(seed) = config.seed {
        println!("[Server] Using master seed {}", seed);
    }
    let service = Arc::new(SessionService::new(config.service_options()));

    run_server(config, service, None).await
}
