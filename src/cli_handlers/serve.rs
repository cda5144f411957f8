use crate::config::{ConfigOverrides, ServerConfig};
use crate::dashboard::server::IntakeServer;
use crate::error::{IntakeError, Result};

pub async fn handle_serve_command(config: ServerConfig, overrides: ConfigOverrides) -> Result<()> {
    let config = config.apply(overrides);
    IntakeServer::new(config)
        .run()
        .await
        .map_err(|e| IntakeError::ServerError(format!("{:#}", e)))
}
