//! Flat download directory on the local file system.

use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tracing::{debug, warn};

use super::error::StorageError;
use super::naming::{candidate_name, is_servable_name, safe_filename};
use super::types::{StagingArea, StoredFile};
use crate::stream::ContainerFormat;

/// How many ` (n)` suffixes are tried before giving up.
const MAX_NAME_ATTEMPTS: usize = 1000;

/// Prefix of per-attempt staging directories. Hidden from listings.
const STAGING_PREFIX: &str = ".staging-";

/// Download directory shared by all requests.
#[derive(Debug, Clone)]
pub struct DownloadStorage {
    root: PathBuf,
}

impl DownloadStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the download directory if missing.
    pub async fn ensure_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StorageError::DirectoryCreationFailed {
                path: self.root.clone(),
                source,
            })
    }

    /// Fresh staging directory inside the download directory.
    ///
    /// Living on the same file system lets [`store`](Self::store) place the
    /// result without copying.
    pub async fn staging_area(&self) -> Result<StagingArea, StorageError> {
        self.ensure_dir().await?;
        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&self.root)
            .map_err(|source| StorageError::DirectoryCreationFailed {
                path: self.root.clone(),
                source,
            })?;
        Ok(StagingArea::new(dir))
    }

    /// Move a staged file into the download directory under a name derived
    /// from `title`. Existing files are never overwritten; a ` (n)` suffix is
    /// added instead.
    pub async fn store(
        &self,
        staged: &Path,
        title: &str,
        container: &ContainerFormat,
    ) -> Result<StoredFile, StorageError> {
        let meta = fs::metadata(staged).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::SourceNotFound {
                    path: staged.to_path_buf(),
                }
            } else {
                StorageError::Io(e)
            }
        })?;

        let extension = staged
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_else(|| container.extension().to_string());
        let stem = safe_filename(title);

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let filename = candidate_name(&stem, &extension, attempt);
            let destination = self.root.join(&filename);

            if Self::place_no_clobber(staged, &destination).await? {
                debug!("Stored {:?} as {}", staged, filename);
                let modified_at = fs::metadata(&destination)
                    .await
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .map(DateTime::<Utc>::from);
                return Ok(StoredFile {
                    filename,
                    size_bytes: meta.len(),
                    modified_at,
                });
            }
        }

        Err(StorageError::NameExhausted { base: stem })
    }

    /// Place `source` at `destination` unless something is already there.
    ///
    /// Returns `Ok(false)` when the name is taken.
    async fn place_no_clobber(source: &Path, destination: &Path) -> Result<bool, StorageError> {
        // hard_link fails with AlreadyExists instead of replacing the target.
        match fs::hard_link(source, destination).await {
            Ok(()) => {
                fs::remove_file(source).await?;
                return Ok(true);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => {
                debug!(
                    "hard link {:?} -> {:?} failed ({}), copying instead",
                    source, destination, e
                );
            }
        }

        let mut target = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(destination)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(error) => {
                return Err(StorageError::PlacementFailed {
                    source_path: source.to_path_buf(),
                    destination: destination.to_path_buf(),
                    error,
                })
            }
        };

        let copied = async {
            let mut reader = fs::File::open(source).await?;
            tokio::io::copy(&mut reader, &mut target).await?;
            target.sync_all().await
        }
        .await;

        if let Err(error) = copied {
            if let Err(e) = fs::remove_file(destination).await {
                warn!("Failed to remove partial copy {:?}: {}", destination, e);
            }
            return Err(StorageError::PlacementFailed {
                source_path: source.to_path_buf(),
                destination: destination.to_path_buf(),
                error,
            });
        }

        fs::remove_file(source).await?;
        Ok(true)
    }

    /// Path of a stored file, or `StoredFileMissing`.
    pub async fn resolve(&self, filename: &str) -> Result<PathBuf, StorageError> {
        if !is_servable_name(filename) {
            return Err(StorageError::missing(filename));
        }

        let path = self.root.join(filename);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(StorageError::missing(filename)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::missing(filename)),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Stored files, newest first. Staging directories and hidden files are skipped.
    pub async fn list(&self) -> Result<Vec<StoredFile>, StorageError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::Io(e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_servable_name(&filename) {
                continue;
            }

            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }

            files.push(StoredFile {
                filename,
                size_bytes: meta.len(),
                modified_at: meta.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        files.sort_by(|a, b| {
            b.modified_at
                .cmp(&a.modified_at)
                .then_with(|| a.filename.cmp(&b.filename))
        });
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn staged_file(area: &StagingArea, name: &str, contents: &[u8]) -> PathBuf {
        let path = area.path().join(name);
        fs::write(&path, contents).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_ensure_dir_creates_root() {
        let temp = TempDir::new().unwrap();
        let storage = DownloadStorage::new(temp.path().join("nested/downloads"));
        storage.ensure_dir().await.unwrap();
        assert!(storage.root().is_dir());
    }

    #[tokio::test]
    async fn test_staging_area_removed_on_drop() {
        let temp = TempDir::new().unwrap();
        let storage = DownloadStorage::new(temp.path());

        let area = storage.staging_area().await.unwrap();
        let path = area.to_path_buf();
        staged_file(&area, "partial.mp4.part", b"xx").await;
        assert!(path.starts_with(temp.path()));
        assert!(path.is_dir());

        drop(area);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_store_moves_file() {
        let temp = TempDir::new().unwrap();
        let storage = DownloadStorage::new(temp.path());
        let area = storage.staging_area().await.unwrap();
        let staged = staged_file(&area, "raw.mp4", b"video-bytes").await;

        let stored = storage
            .store(&staged, "My: Video?", &ContainerFormat::Mp4)
            .await
            .unwrap();

        assert_eq!(stored.filename, "My Video.mp4");
        assert_eq!(stored.size_bytes, 11);
        assert!(!staged.exists());
        assert_eq!(
            fs::read(temp.path().join("My Video.mp4")).await.unwrap(),
            b"video-bytes"
        );
    }

    #[tokio::test]
    async fn test_store_long_multibyte_title() {
        let temp = TempDir::new().unwrap();
        let storage = DownloadStorage::new(temp.path());
        let title: String = "日本語のタイトル".repeat(13).chars().take(100).collect();

        for _ in 0..2 {
            let area = storage.staging_area().await.unwrap();
            let staged = staged_file(&area, "x.mp4", b"bytes").await;
            let stored = storage
                .store(&staged, &title, &ContainerFormat::Mp4)
                .await
                .unwrap();
            assert!(stored.filename.len() <= 255);
            assert!(temp.path().join(&stored.filename).is_file());
        }

        let emoji_title = "🎸".repeat(100);
        let area = storage.staging_area().await.unwrap();
        let staged = staged_file(&area, "y.webm", b"bytes").await;
        let stored = storage
            .store(&staged, &emoji_title, &ContainerFormat::Webm)
            .await
            .unwrap();
        assert!(stored.filename.ends_with(".webm"));
        assert!(temp.path().join(&stored.filename).is_file());
    }

    #[tokio::test]
    async fn test_store_never_overwrites() {
        let temp = TempDir::new().unwrap();
        let storage = DownloadStorage::new(temp.path());
        fs::write(temp.path().join("clip.mp4"), b"first").await.unwrap();

        let area = storage.staging_area().await.unwrap();
        let staged = staged_file(&area, "clip.mp4", b"second").await;
        let stored = storage
            .store(&staged, "clip", &ContainerFormat::Mp4)
            .await
            .unwrap();

        assert_eq!(stored.filename, "clip (1).mp4");
        assert_eq!(fs::read(temp.path().join("clip.mp4")).await.unwrap(), b"first");
        assert_eq!(
            fs::read(temp.path().join("clip (1).mp4")).await.unwrap(),
            b"second"
        );
    }

    #[tokio::test]
    async fn test_store_uses_container_when_no_extension() {
        let temp = TempDir::new().unwrap();
        let storage = DownloadStorage::new(temp.path());
        let area = storage.staging_area().await.unwrap();
        let staged = staged_file(&area, "noext", b"x").await;

        let stored = storage
            .store(&staged, "clip", &ContainerFormat::Webm)
            .await
            .unwrap();
        assert_eq!(stored.filename, "clip.webm");
    }

    #[tokio::test]
    async fn test_store_missing_source() {
        let temp = TempDir::new().unwrap();
        let storage = DownloadStorage::new(temp.path());
        let result = storage
            .store(&temp.path().join("ghost.mp4"), "ghost", &ContainerFormat::Mp4)
            .await;
        assert!(matches!(result, Err(StorageError::SourceNotFound { .. })));
    }

    #[tokio::test]
    async fn test_resolve_existing_and_missing() {
        let temp = TempDir::new().unwrap();
        let storage = DownloadStorage::new(temp.path());
        fs::write(temp.path().join("clip.mp4"), b"x").await.unwrap();

        let path = storage.resolve("clip.mp4").await.unwrap();
        assert_eq!(path, temp.path().join("clip.mp4"));

        let err = storage.resolve("never-downloaded.mp4").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_resolve_rejects_traversal_and_hidden() {
        let temp = TempDir::new().unwrap();
        let storage = DownloadStorage::new(temp.path().join("downloads"));
        storage.ensure_dir().await.unwrap();
        fs::write(temp.path().join("secret.txt"), b"x").await.unwrap();

        assert!(storage.resolve("../secret.txt").await.unwrap_err().is_not_found());
        assert!(storage.resolve(".staging-x").await.unwrap_err().is_not_found());
        assert!(storage.resolve("").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_skips_staging_and_hidden() {
        let temp = TempDir::new().unwrap();
        let storage = DownloadStorage::new(temp.path());
        fs::write(temp.path().join("a.mp4"), b"aa").await.unwrap();
        fs::write(temp.path().join(".hidden"), b"x").await.unwrap();
        let _area = storage.staging_area().await.unwrap();

        let files = storage.list().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "a.mp4");
        assert_eq!(files[0].size_bytes, 2);
    }

    #[tokio::test]
    async fn test_list_missing_root_is_empty() {
        let storage = DownloadStorage::new("/nonexistent/vidgrab/downloads");
        assert!(storage.list().await.unwrap().is_empty());
    }
}
