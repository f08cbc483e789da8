//! File store for budget step attachments.
//!
//! Uploads are streamed chunk by chunk into a file under the media root and
//! only become a [`FileAttachment`] once fully flushed, so a failed upload
//! never leaves a referenced half-written file. The media root is served by
//! the HTTP layer under `/media/`, which is where the stored `url` points.

use crate::core::transition::FileAttachment;
use crate::errors::Result;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Handle on the media root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

/// An upload in progress; call [`PendingFile::finish`] after the last chunk.
#[derive(Debug)]
pub struct PendingFile {
    file: tokio::fs::File,
    filename: String,
    relative_path: String,
    absolute_path: PathBuf,
}

/// Strips directory components and anything else that could escape the
/// store root from a client-supplied filename.
fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| if c == ':' || c.is_control() { '_' } else { c })
        .collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

impl FileStore {
    /// Opens (and creates if needed) the store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// The directory served as `/media/`.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Starts streaming an upload under the given scope directory.
    ///
    /// Files are laid out as `{scope}/{nanos}_{filename}` so two uploads
    /// with the same name never collide.
    pub async fn begin(&self, scope: &str, filename: &str) -> Result<PendingFile> {
        let scope = sanitize_filename(scope);
        let filename = sanitize_filename(filename);
        let nanos = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default();
        let relative_path = format!("{scope}/{nanos}_{filename}");
        let absolute_path = self.root.join(&relative_path);

        if let Some(parent) = absolute_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = tokio::fs::File::create(&absolute_path).await?;

        Ok(PendingFile {
            file,
            filename,
            relative_path,
            absolute_path,
        })
    }

    /// Convenience wrapper writing one in-memory payload.
    pub async fn save(&self, scope: &str, filename: &str, bytes: &[u8]) -> Result<FileAttachment> {
        let mut pending = self.begin(scope, filename).await?;
        pending.write_chunk(bytes).await?;
        pending.finish().await
    }

    /// Best-effort removal, used to clean up after a failed transition.
    pub async fn remove(&self, attachment: &FileAttachment) {
        let path = self.root.join(&attachment.path);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove orphaned upload");
        }
    }
}

impl PendingFile {
    /// Appends one chunk of the upload.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.file.write_all(chunk).await.map_err(Into::into)
    }

    /// Flushes and returns the attachment record to persist.
    pub async fn finish(mut self) -> Result<FileAttachment> {
        self.file.flush().await?;
        drop(self.file);
        Ok(FileAttachment {
            filename: self.filename,
            path: self.relative_path.clone(),
            url: format!("/media/{}", self.relative_path),
        })
    }

    /// Abandons the upload, deleting whatever was written.
    pub async fn abort(self) {
        drop(self.file);
        if let Err(e) = tokio::fs::remove_file(&self.absolute_path).await {
            tracing::warn!(
                path = %self.absolute_path.display(),
                error = %e,
                "failed to remove aborted upload"
            );
        }
    }
}
