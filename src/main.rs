use clap::Parser;
use intake_desk::backup::BackupManager;
use intake_desk::cli::{Cli, Commands};
use intake_desk::cli_handlers::{
    handle_backup_command, handle_export_command, handle_import_command, handle_search_command,
    handle_serve_command, handle_stats_command, handle_trends_command, resolve_config,
    ExportOptions,
};
use intake_desk::config::ConfigOverrides;
use intake_desk::error::Result;
use intake_desk::logging::{self, ApplicationMode, LoggingConfig};
use intake_desk::records::RecordKind;
use intake_desk::store::Datastore;

/// Days of rotated server logs to keep
const LOG_RETENTION_DAYS: u32 = 7;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let (mode, log_file) = match &cli.command {
        Commands::Serve { log_file, .. } => (ApplicationMode::Server, log_file.clone()),
        _ => (ApplicationMode::Cli, None),
    };

    // Explicit flags win over the per-mode defaults
    let mut log_config = if cli.quiet || cli.verbose > 0 || cli.json {
        LoggingConfig::from_args(cli.quiet, cli.verbose > 0, cli.json)
    } else {
        LoggingConfig::for_mode(mode)
    };
    log_config.file_output = log_file.clone();

    if let Err(e) = logging::init_logging(log_config) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Some(dir) = log_file.as_deref().map(logging::log_dir_of) {
        if let Err(e) = logging::cleanup_old_logs(dir, LOG_RETENTION_DAYS) {
            tracing::warn!("Log cleanup failed: {}", e);
        }
    }

    if let Err(e) = run(cli).await {
        let error_response = e.to_error_response();
        match serde_json::to_string_pretty(&error_response) {
            Ok(json) => eprintln!("{}", json),
            Err(_) => eprintln!("{}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli.data_dir)?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            static_dir,
            backup_dir,
            upload_dir,
            no_auto_backup,
            log_file: _,
        } => {
            handle_serve_command(
                config,
                ConfigOverrides {
                    host,
                    port,
                    static_dir,
                    backup_dir,
                    upload_dir,
                    auto_backup: no_auto_backup.then_some(false),
                    ..Default::default()
                },
            )
            .await?
        },

        Commands::Stats { format } => {
            let store = Datastore::open(&config.data_dir).await?;
            handle_stats_command(&store, &format).await?
        },

        Commands::Trends { days, format } => {
            let store = Datastore::open(&config.data_dir).await?;
            handle_trends_command(&store, days, &format).await?
        },

        Commands::Search {
            query,
            kind,
            status,
            course,
            format,
        } => {
            let kind: RecordKind = kind.parse()?;
            let store = Datastore::open(&config.data_dir).await?;
            handle_search_command(
                &store,
                &query,
                kind,
                status.as_deref(),
                course.as_deref(),
                &format,
            )
            .await?
        },

        Commands::Export {
            kind,
            format,
            output,
            status,
            course,
            from,
            to,
        } => {
            let kind: RecordKind = kind.parse()?;
            let store = Datastore::open(&config.data_dir).await?;
            let options = ExportOptions {
                format: format.parse()?,
                output,
                status,
                course,
                from,
                to,
            };
            handle_export_command(&store, kind, options).await?
        },

        Commands::Import {
            file,
            kind,
            replace,
        } => {
            let kind: RecordKind = kind.parse()?;
            let store = Datastore::open(&config.data_dir).await?;
            handle_import_command(&store, kind, &file, replace).await?
        },

        Commands::Backup(args) => {
            let backup_dir = args.backup_dir.unwrap_or(config.backup_dir);
            let manager = BackupManager::new(&config.data_dir, backup_dir)
                .with_max_backups(config.max_backups);
            handle_backup_command(&manager, args.command).await?
        },
    }

    Ok(())
}
