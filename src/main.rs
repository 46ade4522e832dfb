use clap::Parser;
use tracing_subscriber::EnvFilter;
use uno_rooms::config::ServerConfig;
use uno_rooms::uno_game::api::start_api_server;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // RUST_LOG wins over --log-filter when both are given
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = start_api_server(&config).await {
        tracing::error!("server stopped: {}", e);
        std::process::exit(1);
    }
}
