use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const DEFAULT_MAX_BACKUPS: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupMetadata {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Pattern that was applied, as produced by `Pattern::describe`
    pub operation: String,
    pub files: Vec<FileBackup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileBackup {
    pub original_path: PathBuf,
    pub backup_path: PathBuf,
}

pub struct BackupManager {
    backups_dir: PathBuf,
    max_backups: usize,
}

impl BackupManager {
    /// Backups under ~/.mdtrim/backups
    pub fn new() -> Result<Self> {
        let backups_dir = crate::config::mdtrim_dir()?.join("backups");
        Self::with_directory(backups_dir)
    }

    /// Create a BackupManager with a custom backup directory
    pub fn with_directory(dir: impl Into<PathBuf>) -> Result<Self> {
        let backups_dir = dir.into();

        fs::create_dir_all(&backups_dir).with_context(|| {
            format!(
                "Failed to create backups directory: {}",
                backups_dir.display()
            )
        })?;

        Ok(Self {
            backups_dir,
            max_backups: DEFAULT_MAX_BACKUPS,
        })
    }

    pub fn with_max_backups(mut self, max_backups: usize) -> Self {
        self.max_backups = max_backups.max(1);
        self
    }

    /// Get the backup directory path
    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    pub fn create_backup(&mut self, operation: &str, files: &[PathBuf]) -> Result<String> {
        // Millisecond timestamp keeps ids sortable; uuid prefix keeps them unique
        let id = format!(
            "{}-{}",
            Utc::now().format("%Y%m%d-%H%M%S%3f"),
            Uuid::new_v4().to_string().split_at(8).0
        );
        let backup_dir = self.backups_dir.join(&id);

        fs::create_dir_all(&backup_dir).with_context(|| {
            format!(
                "Failed to create backup directory: {}",
                backup_dir.display()
            )
        })?;

        let mut file_backups = Vec::new();

        for file_path in files {
            if !file_path.exists() {
                continue;
            }

            let file_name = file_path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", file_path.display()))?;

            let backup_path = backup_dir.join(file_name);

            fs::copy(file_path, &backup_path)
                .with_context(|| format!("Failed to backup file: {}", file_path.display()))?;

            // Absolute path so rollback works from any working directory
            let original_path = fs::canonicalize(file_path).unwrap_or_else(|_| file_path.clone());

            file_backups.push(FileBackup {
                original_path,
                backup_path,
            });
        }

        let metadata = BackupMetadata {
            id: id.clone(),
            timestamp: Utc::now(),
            operation: operation.to_string(),
            files: file_backups,
        };

        let metadata_path = backup_dir.join("operation.json");
        let metadata_json =
            serde_json::to_string_pretty(&metadata).context("Failed to serialize metadata")?;

        fs::write(&metadata_path, metadata_json)
            .with_context(|| format!("Failed to write metadata: {}", metadata_path.display()))?;

        tracing::info!(id = %id, files = metadata.files.len(), "created backup");

        self.cleanup_old_backups()?;

        Ok(id)
    }

    pub fn restore_backup(&self, id: &str) -> Result<()> {
        let backup_dir = self.backups_dir.join(id);
        let metadata_path = backup_dir.join("operation.json");

        if !backup_dir.exists() {
            anyhow::bail!("Backup not found: {}", id);
        }

        let metadata_json = fs::read_to_string(&metadata_path)
            .with_context(|| format!("Failed to read metadata: {}", metadata_path.display()))?;

        let metadata: BackupMetadata =
            serde_json::from_str(&metadata_json).context("Failed to parse metadata")?;

        for file_backup in &metadata.files {
            if !file_backup.backup_path.exists() {
                eprintln!(
                    "Warning: Backup file missing: {}",
                    file_backup.backup_path.display()
                );
                continue;
            }

            fs::copy(&file_backup.backup_path, &file_backup.original_path).with_context(|| {
                format!(
                    "Failed to restore file: {}",
                    file_backup.original_path.display()
                )
            })?;

            println!("Restored: {}", file_backup.original_path.display());
        }

        // Remove backup after successful restore
        fs::remove_dir_all(&backup_dir).with_context(|| {
            format!(
                "Failed to remove backup directory: {}",
                backup_dir.display()
            )
        })?;

        tracing::info!(id = %id, "restored backup");
        println!("Backup {} removed after restore", id);

        Ok(())
    }

    pub fn get_last_backup_id(&self) -> Result<Option<String>> {
        let backups = self.list_backups()?;
        Ok(backups.last().map(|b| b.id.clone()))
    }

    /// All readable backups, oldest first
    pub fn list_backups(&self) -> Result<Vec<BackupMetadata>> {
        let mut backups = Vec::new();

        for entry in fs::read_dir(&self.backups_dir).with_context(|| {
            format!(
                "Failed to read backups directory: {}",
                self.backups_dir.display()
            )
        })? {
            let entry = entry?;
            let metadata_path = entry.path().join("operation.json");

            if !metadata_path.exists() {
                continue;
            }

            let metadata_json = fs::read_to_string(&metadata_path)?;
            if let Ok(metadata) = serde_json::from_str::<BackupMetadata>(&metadata_json) {
                backups.push(metadata);
            }
        }

        // Equal timestamps (rare) fall back to id order
        backups.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(backups)
    }

    fn cleanup_old_backups(&self) -> Result<()> {
        let backups = self.list_backups()?;

        if backups.len() > self.max_backups {
            for backup in backups.iter().take(backups.len() - self.max_backups) {
                let backup_dir = self.backups_dir.join(&backup.id);
                fs::remove_dir_all(&backup_dir).with_context(|| {
                    format!("Failed to remove old backup: {}", backup_dir.display())
                })?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const OPERATION: &str = "literal anchor=\"A\" marker=\"M\" scope=first";

    /// Helper function to create a test file with content
    fn create_test_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let file_path = dir.join(name);
        let mut file = File::create(&file_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file_path
    }

    /// Helper function to create a test backup manager with a temp directory
    fn create_test_manager() -> (BackupManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let manager = BackupManager::with_directory(temp_dir.path().join("backups")).unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_create_backup_single_file() {
        let (mut manager, temp_dir) = create_test_manager();
        let test_file = create_test_file(temp_dir.path(), "README.md", "A\ndup\nM\n");

        let backup_id = manager
            .create_backup(OPERATION, std::slice::from_ref(&test_file))
            .unwrap();

        let backup_dir = manager.backups_dir().join(&backup_id);
        assert!(backup_dir.exists(), "Backup directory should exist");

        let backup_file = backup_dir.join("README.md");
        assert_eq!(
            fs::read_to_string(&backup_file).unwrap(),
            "A\ndup\nM\n",
            "Backup content should match original"
        );

        let metadata_json = fs::read_to_string(backup_dir.join("operation.json")).unwrap();
        let metadata: BackupMetadata = serde_json::from_str(&metadata_json).unwrap();
        assert_eq!(metadata.id, backup_id);
        assert_eq!(metadata.operation, OPERATION);
        assert_eq!(metadata.files.len(), 1);
        assert_eq!(
            metadata.files[0].original_path,
            fs::canonicalize(&test_file).unwrap()
        );
    }

    #[test]
    fn test_create_backup_nonexistent_file_skipped() {
        let (mut manager, temp_dir) = create_test_manager();
        let missing = temp_dir.path().join("does_not_exist.md");

        let backup_id = manager.create_backup(OPERATION, &[missing]).unwrap();

        let metadata_path = manager.backups_dir().join(&backup_id).join("operation.json");
        let metadata: BackupMetadata =
            serde_json::from_str(&fs::read_to_string(&metadata_path).unwrap()).unwrap();
        assert!(metadata.files.is_empty());
    }

    #[test]
    fn test_create_backup_generates_unique_ids() {
        let (mut manager, temp_dir) = create_test_manager();
        let test_file = create_test_file(temp_dir.path(), "README.md", "content");

        let id1 = manager
            .create_backup(OPERATION, std::slice::from_ref(&test_file))
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let id2 = manager
            .create_backup(OPERATION, std::slice::from_ref(&test_file))
            .unwrap();

        assert_ne!(id1, id2, "Backup IDs should be unique");
    }

    #[test]
    fn test_restore_backup_success() {
        let (mut manager, temp_dir) = create_test_manager();
        let test_file = create_test_file(temp_dir.path(), "README.md", "A\ndup\nM\n");

        let backup_id = manager
            .create_backup(OPERATION, std::slice::from_ref(&test_file))
            .unwrap();

        fs::write(&test_file, "A\nM\n").unwrap();
        manager.restore_backup(&backup_id).unwrap();

        assert_eq!(fs::read_to_string(&test_file).unwrap(), "A\ndup\nM\n");
        assert!(
            !manager.backups_dir().join(&backup_id).exists(),
            "Backup should be removed after restore"
        );
    }

    #[test]
    fn test_restore_backup_unknown_id() {
        let (manager, _temp_dir) = create_test_manager();
        let result = manager.restore_backup("20250101-000000000-deadbeef");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Backup not found"));
    }

    #[test]
    fn test_list_backups_chronological() {
        let (mut manager, temp_dir) = create_test_manager();
        let test_file = create_test_file(temp_dir.path(), "README.md", "content");

        let first = manager
            .create_backup("first", std::slice::from_ref(&test_file))
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let second = manager
            .create_backup("second", std::slice::from_ref(&test_file))
            .unwrap();

        let backups = manager.list_backups().unwrap();
        assert_eq!(backups.len(), 2);
        assert_eq!(backups[0].id, first);
        assert_eq!(backups[1].id, second);
        assert_eq!(manager.get_last_backup_id().unwrap(), Some(second));
    }

    #[test]
    fn test_list_backups_ignores_stray_directories() {
        let (manager, _temp_dir) = create_test_manager();
        fs::create_dir_all(manager.backups_dir().join("not-a-backup")).unwrap();

        assert!(manager.list_backups().unwrap().is_empty());
        assert_eq!(manager.get_last_backup_id().unwrap(), None);
    }

    #[test]
    fn test_cleanup_keeps_max_backups() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = BackupManager::with_directory(temp_dir.path().join("backups"))
            .unwrap()
            .with_max_backups(2);
        let test_file = create_test_file(temp_dir.path(), "README.md", "content");

        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(
                manager
                    .create_backup(OPERATION, std::slice::from_ref(&test_file))
                    .unwrap(),
            );
            std::thread::sleep(std::time::Duration::from_millis(10));
        }

        let remaining: Vec<String> = manager
            .list_backups()
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(remaining, ids[1..].to_vec());
    }
}
