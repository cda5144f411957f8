use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

const LONG_ABOUT: &str = r#"
Intake Desk - registration and contact intake backend

Runs the HTTP service that accepts course registrations and contact
requests from the public site, stores them as JSON files, and serves the
admin dashboard at /admin/.

Common commands:
  intake serve              ← Start the HTTP server
  intake stats              ← Registration and contact counts
  intake search "Li"        ← Find records by name, phone, course...
  intake export --format csv --output regs.csv
  intake backup create      ← Snapshot the data directory

Environment:
  INTAKE_HOST, INTAKE_PORT, INTAKE_DATA_DIR, INTAKE_STATIC_DIR,
  INTAKE_BACKUP_DIR, INTAKE_MAX_BACKUPS
  RUST_LOG overrides the log filter.
"#;

#[derive(Parser, Clone)]
#[command(name = "intake")]
#[command(about = "Registration and contact intake backend with an admin dashboard")]
#[command(long_about = LONG_ABOUT)]
#[command(version)]
pub struct Cli {
    /// Directory holding registrations.json and contacts.json
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose output (-v)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output (-q)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Start the HTTP server
    ///
    /// Examples:
    ///   intake serve
    ///   intake serve --host 0.0.0.0 --port 8080 --static-dir public
    Serve {
        /// Address to bind (default: 127.0.0.1)
        #[arg(long)]
        host: Option<IpAddr>,

        /// Port to bind (default: 8000)
        #[arg(long)]
        port: Option<u16>,

        /// Public site served for paths no API route claims
        #[arg(long)]
        static_dir: Option<PathBuf>,

        /// Where backups are written (default: backups)
        #[arg(long)]
        backup_dir: Option<PathBuf>,

        /// Where uploaded registration photos are saved (default: uploads)
        #[arg(long)]
        upload_dir: Option<PathBuf>,

        /// Skip the automatic daily backup at 02:00
        #[arg(long)]
        no_auto_backup: bool,

        /// Write logs to this file (rotated daily) instead of stderr
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Show registration and contact statistics
    Stats {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show daily registration counts, oldest first
    Trends {
        /// Number of days including today (1-366)
        #[arg(long, default_value_t = 7)]
        days: u32,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Search stored records
    ///
    /// Matches name, phone, email, course, remarks and message,
    /// case-insensitively.
    ///
    /// Examples:
    ///   intake search "li"
    ///   intake search "" --status pending --course IELTS
    ///   intake search 138 --kind contacts
    Search {
        /// Substring to look for (empty matches everything)
        query: String,

        /// registrations or contacts
        #[arg(long, default_value = "registrations")]
        kind: String,

        /// Filter by status (pending, completed, cancelled)
        #[arg(long)]
        status: Option<String>,

        /// Filter by exact course
        #[arg(long)]
        course: Option<String>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Export records as CSV or JSON
    Export {
        /// registrations or contacts
        #[arg(long, default_value = "registrations")]
        kind: String,

        /// csv or json
        #[arg(long, default_value = "json")]
        format: String,

        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Filter by status
        #[arg(long)]
        status: Option<String>,

        /// Filter by exact course
        #[arg(long)]
        course: Option<String>,

        /// Earliest submission date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Latest submission date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Import records from a JSON array file
    Import {
        /// File holding a JSON array of records
        file: PathBuf,

        /// registrations or contacts
        #[arg(long, default_value = "registrations")]
        kind: String,

        /// Replace existing records instead of appending
        #[arg(long)]
        replace: bool,
    },

    /// Backup management commands
    Backup(BackupArgs),
}

#[derive(Args, Clone)]
pub struct BackupArgs {
    /// Where backups live (default: backups)
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: BackupCommands,
}

#[derive(Subcommand, Clone)]
pub enum BackupCommands {
    /// Snapshot the data files
    Create,

    /// List backups, newest first
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Copy a backup's data files back into the data directory
    Restore {
        /// Backup name as shown by `intake backup list`
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_data_dir_after_subcommand() {
        let cli = Cli::try_parse_from(["intake", "stats", "--data-dir", "/tmp/x"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(cli.command, Commands::Stats { .. }));
    }

    #[test]
    fn test_backup_restore_parses_name() {
        let cli = Cli::try_parse_from(["intake", "backup", "restore", "2026-10-19T08-00-00-000Z"])
            .unwrap();
        match cli.command {
            Commands::Backup(BackupArgs {
                command: BackupCommands::Restore { name },
                ..
            }) => assert_eq!(name, "2026-10-19T08-00-00-000Z"),
            _ => panic!("expected backup restore"),
        }
    }

    #[test]
    fn test_serve_auto_backup_flag() {
        let cli = Cli::try_parse_from(["intake", "serve", "--no-auto-backup"]).unwrap();
        match cli.command {
            Commands::Serve {
                no_auto_backup,
                upload_dir,
                ..
            } => {
                assert!(no_auto_backup);
                assert!(upload_dir.is_none());
            },
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_serve_rejects_bad_host() {
        assert!(Cli::try_parse_from(["intake", "serve", "--host", "not-an-ip"]).is_err());
    }
}
