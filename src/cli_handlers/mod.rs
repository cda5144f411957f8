// CLI command handlers module
//
// Server: serve
// Reports: stats, trends, search
// Data: export, import, backup

pub mod backup;
pub mod data;
pub mod reports;
pub mod serve;

pub use backup::handle_backup_command;
pub use data::{handle_export_command, handle_import_command, ExportOptions};
pub use reports::{handle_search_command, handle_stats_command, handle_trends_command};
pub use serve::handle_serve_command;

use std::path::PathBuf;

use crate::config::{ConfigOverrides, ServerConfig};
use crate::error::Result;

/// Environment config with the global `--data-dir` flag applied.
pub fn resolve_config(data_dir: Option<PathBuf>) -> Result<ServerConfig> {
    Ok(ServerConfig::from_env()?.apply(ConfigOverrides {
        data_dir,
        ..Default::default()
    }))
}
