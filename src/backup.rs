//! Timestamped snapshots of the data directory.

use chrono::{DateTime, Days, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::{IntakeError, Result};
use crate::records::RecordKind;

pub const DEFAULT_MAX_BACKUPS: usize = 30;

/// Local hour at which the server takes its automatic backup.
pub const DAILY_BACKUP_HOUR: u32 = 2;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Backup directory names sort chronologically.
const BACKUP_NAME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S-%3fZ";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupInfo {
    pub name: String,
    pub path: String,
    /// When the backup was taken, read from its name.
    pub date: DateTime<Utc>,
    /// Total bytes of the copied data files.
    pub size: u64,
    pub files: Vec<String>,
}

/// Creation time and collision suffix of a backup directory name.
///
/// Anything that is not `<timestamp>` or `<timestamp>-<n>` is not a backup.
fn parse_backup_name(name: &str) -> Option<(DateTime<Utc>, u32)> {
    let (stamp, suffix) = match name.rsplit_once('-') {
        Some((head, tail))
            if head.ends_with('Z') && !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) =>
        {
            (head, tail.parse().ok()?)
        },
        _ => (name, 0),
    };
    NaiveDateTime::parse_from_str(stamp, BACKUP_NAME_FORMAT)
        .ok()
        .map(|dt| (dt.and_utc(), suffix))
}

/// First `hour:00` strictly after `now`.
pub fn next_daily_run(now: NaiveDateTime, hour: u32) -> NaiveDateTime {
    let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or_default();
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + Days::new(1)
    }
}

pub struct BackupManager {
    data_dir: PathBuf,
    backup_dir: PathBuf,
    max_backups: usize,
}

impl BackupManager {
    pub fn new(data_dir: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            backup_dir: backup_dir.into(),
            max_backups: DEFAULT_MAX_BACKUPS,
        }
    }

    pub fn with_max_backups(mut self, max_backups: usize) -> Self {
        self.max_backups = max_backups.max(1);
        self
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Copy the current data files into a new backup directory, then prune.
    pub async fn create(&self) -> Result<BackupInfo> {
        let stamp = Utc::now().format(BACKUP_NAME_FORMAT).to_string();
        let mut name = stamp.clone();
        let mut target = self.backup_dir.join(&name);
        let mut attempt = 1;
        while tokio::fs::try_exists(&target).await? {
            name = format!("{}-{}", stamp, attempt);
            target = self.backup_dir.join(&name);
            attempt += 1;
        }
        tokio::fs::create_dir_all(&target).await?;

        let mut files = Vec::new();
        let mut size = 0;
        for kind in RecordKind::ALL {
            let source = self.data_dir.join(kind.file_name());
            if tokio::fs::try_exists(&source).await? {
                size += tokio::fs::copy(&source, target.join(kind.file_name())).await?;
                files.push(kind.file_name().to_string());
            }
        }

        tracing::info!(
            backup = %name,
            files = files.len(),
            location = %target.display(),
            "Backup created"
        );

        self.prune().await?;

        let date = parse_backup_name(&name).map_or_else(Utc::now, |(date, _)| date);
        Ok(BackupInfo {
            name,
            path: target.display().to_string(),
            date,
            size,
            files,
        })
    }

    /// Backups newest first.
    pub async fn list(&self) -> Result<Vec<BackupInfo>> {
        let mut names = self.backup_names().await?;
        names.reverse();

        let mut backups = Vec::with_capacity(names.len());
        for (name, date) in names {
            let path = self.backup_dir.join(&name);
            let mut files = Vec::new();
            let mut size = 0;
            for kind in RecordKind::ALL {
                match tokio::fs::metadata(path.join(kind.file_name())).await {
                    Ok(meta) => {
                        size += meta.len();
                        files.push(kind.file_name().to_string());
                    },
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
                    Err(e) => return Err(e.into()),
                }
            }
            backups.push(BackupInfo {
                name,
                path: path.display().to_string(),
                date,
                size,
                files,
            });
        }
        Ok(backups)
    }

    /// Copy a backup's files back into the data directory.
    pub async fn restore(&self, name: &str) -> Result<usize> {
        if parse_backup_name(name).is_none() {
            return Err(IntakeError::InvalidInput(format!(
                "Invalid backup name '{}'",
                name
            )));
        }

        let source = self.backup_dir.join(name);
        if !tokio::fs::try_exists(&source).await? {
            return Err(IntakeError::BackupNotFound(name.to_string()));
        }

        tokio::fs::create_dir_all(&self.data_dir).await?;
        let mut restored = 0;
        for kind in RecordKind::ALL {
            let file = source.join(kind.file_name());
            if tokio::fs::try_exists(&file).await? {
                tokio::fs::copy(&file, self.data_dir.join(kind.file_name())).await?;
                restored += 1;
            }
        }

        tracing::info!(backup = name, restored, "Backup restored");
        Ok(restored)
    }

    /// Names of backup directories, oldest first. Other entries are ignored.
    async fn backup_names(&self) -> Result<Vec<(String, DateTime<Utc>)>> {
        let mut entries = match tokio::fs::read_dir(&self.backup_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if let Some(order) = parse_backup_name(&name) {
                found.push((order, name));
            }
        }

        found.sort_unstable();
        Ok(found
            .into_iter()
            .map(|((date, _), name)| (name, date))
            .collect())
    }

    async fn prune(&self) -> Result<()> {
        let names = self.backup_names().await?;
        if names.len() <= self.max_backups {
            return Ok(());
        }

        let excess = names.len() - self.max_backups;
        for (name, _) in names.into_iter().take(excess) {
            let path = self.backup_dir.join(&name);
            match tokio::fs::remove_dir_all(&path).await {
                Ok(()) => tracing::info!(backup = %name, "Removed old backup"),
                Err(e) => tracing::warn!("Failed to remove old backup {}: {}", path.display(), e),
            }
        }
        Ok(())
    }

    /// Take a backup every day at `hour` local time until the task is aborted.
    pub fn spawn_daily(self: Arc<Self>, hour: u32) -> JoinHandle<()> {
        tokio::spawn(async move {
            let now = chrono::Local::now().naive_local();
            let first = next_daily_run(now, hour);
            let delay = (first - now).to_std().unwrap_or_default();
            tracing::info!(next = %first, "Automatic backup scheduled");

            let mut ticks = tokio::time::interval_at(Instant::now() + delay, DAY);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if let Err(e) = self.create().await {
                    tracing::warn!("Automatic backup failed: {}", e);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, BackupManager) {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("registrations.json"), "[{\"id\": 1}]").unwrap();
        let mgr = BackupManager::new(&data, dir.path().join("backups"));
        (dir, mgr)
    }

    #[tokio::test]
    async fn test_create_copies_existing_files_only() {
        let (_dir, mgr) = setup();
        let info = mgr.create().await.unwrap();
        assert_eq!(info.files, ["registrations.json"]);
        assert!(Path::new(&info.path).join("registrations.json").exists());
        assert!(!Path::new(&info.path).join("contacts.json").exists());
    }

    #[tokio::test]
    async fn test_list_newest_first_and_prune() {
        let (_dir, mgr) = setup();
        let mgr = mgr.with_max_backups(2);
        for _ in 0..4 {
            mgr.create().await.unwrap();
        }

        let backups = mgr.list().await.unwrap();
        assert_eq!(backups.len(), 2);
        assert!(backups[0].name > backups[1].name);
    }

    #[tokio::test]
    async fn test_restore_roundtrip() {
        let (dir, mgr) = setup();
        let info = mgr.create().await.unwrap();

        let data_file = dir.path().join("data").join("registrations.json");
        std::fs::write(&data_file, "[]").unwrap();

        assert_eq!(mgr.restore(&info.name).await.unwrap(), 1);
        assert_eq!(std::fs::read_to_string(&data_file).unwrap(), "[{\"id\": 1}]");
    }

    #[tokio::test]
    async fn test_restore_rejects_bad_names() {
        let (_dir, mgr) = setup();
        assert!(matches!(
            mgr.restore("../etc").await,
            Err(IntakeError::InvalidInput(_))
        ));
        assert!(matches!(
            mgr.restore("2020-01-01T00-00-00-000Z").await,
            Err(IntakeError::BackupNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_prune_leaves_foreign_directories() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("registrations.json"), "[]").unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::fs::create_dir_all(dir.path().join("2019-notes")).unwrap();

        // Backups written next to unrelated folders
        let mgr = BackupManager::new(&data, dir.path()).with_max_backups(1);
        mgr.create().await.unwrap();
        let newest = mgr.create().await.unwrap();

        assert!(dir.path().join("assets").is_dir());
        assert!(dir.path().join("2019-notes").is_dir());
        assert!(data.join("registrations.json").exists());

        let backups = mgr.list().await.unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].name, newest.name);
        assert!(matches!(
            mgr.restore("assets").await,
            Err(IntakeError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_backup_info_size_and_date() {
        let (_dir, mgr) = setup();
        let info = mgr.create().await.unwrap();
        assert_eq!(info.size, "[{\"id\": 1}]".len() as u64);

        let listed = mgr.list().await.unwrap();
        assert_eq!(listed[0].size, info.size);
        assert_eq!(listed[0].date, info.date);
        assert!(Utc::now() - info.date < chrono::TimeDelta::minutes(1));
    }

    #[test]
    fn test_parse_backup_name() {
        let (date, suffix) = parse_backup_name("2026-10-19T02-00-00-123Z").unwrap();
        assert_eq!(date.to_rfc3339(), "2026-10-19T02:00:00.123+00:00");
        assert_eq!(suffix, 0);

        assert_eq!(parse_backup_name("2026-10-19T02-00-00-123Z-12").unwrap().1, 12);
        assert!(parse_backup_name("assets").is_none());
        assert!(parse_backup_name("2026-10-19").is_none());
        assert!(parse_backup_name("2026-10-19T02-00-00-123Z-x").is_none());
        assert!(parse_backup_name("../2026-10-19T02-00-00-123Z").is_none());
    }

    #[test]
    fn test_next_daily_run() {
        let at = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap();

        assert_eq!(
            next_daily_run(at("2026-10-19 01:15:00"), DAILY_BACKUP_HOUR),
            at("2026-10-19 02:00:00")
        );
        assert_eq!(
            next_daily_run(at("2026-10-19 02:00:00"), DAILY_BACKUP_HOUR),
            at("2026-10-20 02:00:00")
        );
        assert_eq!(
            next_daily_run(at("2026-12-31 23:59:59"), DAILY_BACKUP_HOUR),
            at("2027-01-01 02:00:00")
        );
    }

    #[tokio::test]
    async fn test_daily_task_stops_when_aborted() {
        let (_dir, mgr) = setup();
        let task = Arc::new(mgr).spawn_daily(DAILY_BACKUP_HOUR);
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_list_without_backup_dir() {
        let (_dir, mgr) = setup();
        assert!(mgr.list().await.unwrap().is_empty());
    }
}
