use crate::backup::BackupManager;
use crate::cli::BackupCommands;
use crate::error::Result;

pub async fn handle_backup_command(manager: &BackupManager, cmd: BackupCommands) -> Result<()> {
    match cmd {
        BackupCommands::Create => {
            let info = manager.create().await?;
            if info.files.is_empty() {
                println!("✓ Backup {} created (no data files yet)", info.name);
            } else {
                println!("✓ Backup {} created: {}", info.name, info.files.join(", "));
            }
            println!("  {}", info.path);
        },
        BackupCommands::List { format } => {
            let backups = manager.list().await?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&backups)?);
            } else if backups.is_empty() {
                println!("No backups in {}", manager.backup_dir().display());
            } else {
                for backup in &backups {
                    println!(
                        "{}  {:>9}  {}",
                        backup.name,
                        format_size(backup.size),
                        backup.files.join(", ")
                    );
                }
            }
        },
        BackupCommands::Restore { name } => {
            let restored = manager.restore(&name).await?;
            println!("✓ Restored {} file(s) from backup {}", restored, name);
        },
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}
