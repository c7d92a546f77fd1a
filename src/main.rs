use std::sync::Arc;

use rails_mcp_bridge::adapters::Registry;
use rails_mcp_bridge::config::ServerConfig;
use rails_mcp_bridge::schema::check_descriptor;
use rails_mcp_bridge::server::McpServer;
use rails_mcp_bridge::transport::{Executor, SshRunner};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();

    // stdout carries the protocol; logs go to stderr only.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = match ServerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("rails-mcp-bridge: {e}");
            std::process::exit(1);
        }
    };

    let executor = Executor::new(Arc::new(SshRunner::new(config.ssh.clone())));
    let registry = Registry::from_config(&config, executor);

    for descriptor in registry.descriptors() {
        if let Err(e) = check_descriptor(&descriptor) {
            error!("rails-mcp-bridge: invalid tool descriptor: {e}");
            std::process::exit(1);
        }
    }

    info!(
        host = %config.ssh.host,
        port = config.ssh.port,
        user = %config.ssh.user,
        adapters = ?registry.adapter_names(),
        trust_host = config.ssh.trust_host,
        "starting"
    );

    let server = McpServer::new(registry);
    if let Err(e) = server.run().await {
        error!("rails-mcp-bridge: fatal error: {e}");
        std::process::exit(1);
    }
}
