//! Server configuration.
//!
//! Values are resolved in order of precedence (highest first):
//! 1. Command-line flags
//! 2. Environment variables prefixed with `INTAKE_`
//! 3. Built-in defaults

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use crate::backup::DEFAULT_MAX_BACKUPS;
use crate::error::{IntakeError, Result};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_BACKUP_DIR: &str = "backups";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

pub const ENV_HOST: &str = "INTAKE_HOST";
pub const ENV_PORT: &str = "INTAKE_PORT";
pub const ENV_DATA_DIR: &str = "INTAKE_DATA_DIR";
pub const ENV_STATIC_DIR: &str = "INTAKE_STATIC_DIR";
pub const ENV_BACKUP_DIR: &str = "INTAKE_BACKUP_DIR";
pub const ENV_MAX_BACKUPS: &str = "INTAKE_MAX_BACKUPS";
pub const ENV_UPLOAD_DIR: &str = "INTAKE_UPLOAD_DIR";
pub const ENV_AUTO_BACKUP: &str = "INTAKE_AUTO_BACKUP";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Public site served for paths no route claims.
    pub static_dir: Option<PathBuf>,
    pub backup_dir: PathBuf,
    pub max_backups: usize,
    /// Take a backup every day at 02:00 local time while serving.
    pub auto_backup: bool,
    /// Where uploaded registration photos are written.
    pub upload_dir: PathBuf,
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            static_dir: None,
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
            max_backups: DEFAULT_MAX_BACKUPS,
            auto_backup: true,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

/// Overrides given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<IpAddr>,
    pub port: Option<u16>,
    pub data_dir: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    pub backup_dir: Option<PathBuf>,
    pub upload_dir: Option<PathBuf>,
    pub auto_backup: Option<bool>,
}

impl ServerConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup(ENV_HOST) {
            config.host = parse_var(ENV_HOST, &host)?;
        }
        if let Some(port) = lookup(ENV_PORT) {
            config.port = parse_var(ENV_PORT, &port)?;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_STATIC_DIR).filter(|v| !v.is_empty()) {
            config.static_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = lookup(ENV_BACKUP_DIR).filter(|v| !v.is_empty()) {
            config.backup_dir = PathBuf::from(dir);
        }
        if let Some(max) = lookup(ENV_MAX_BACKUPS) {
            config.max_backups = parse_var(ENV_MAX_BACKUPS, &max)?;
        }
        if let Some(dir) = lookup(ENV_UPLOAD_DIR).filter(|v| !v.is_empty()) {
            config.upload_dir = PathBuf::from(dir);
        }
        if let Some(enabled) = lookup(ENV_AUTO_BACKUP) {
            config.auto_backup = parse_var(ENV_AUTO_BACKUP, &enabled)?;
        }

        Ok(config)
    }

    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(dir) = overrides.data_dir {
            self.data_dir = dir;
        }
        if let Some(dir) = overrides.static_dir {
            self.static_dir = Some(dir);
        }
        if let Some(dir) = overrides.backup_dir {
            self.backup_dir = dir;
        }
        if let Some(dir) = overrides.upload_dir {
            self.upload_dir = dir;
        }
        if let Some(enabled) = overrides.auto_backup {
            self.auto_backup = enabled;
        }
        self
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| IntakeError::ConfigError(format!("Invalid value for {}: '{}'", key, raw)))
}
