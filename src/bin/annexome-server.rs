/// Annexome Server
///
/// Standalone server that serves the heritage and tourism datasets, with
/// filters and chart views, as JSON for the dashboard frontend.

use annexome::server::{run_server, ServerConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Get host and port from environment or use defaults
    let config = ServerConfig::from_env()?;

    // Start the server
    run_server(&config).await
}
