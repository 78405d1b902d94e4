use std::{io::ErrorKind, path::PathBuf};

use base64::{Engine as _, engine::general_purpose};
use tracing::instrument;

use crate::domain::{
    common::{entities::app_errors::CoreError, generate_random_string, generate_uuid_v7},
    upload::{
        entities::{ImageFormat, TempUpload, UploadedImage},
        ports::TempFileStore,
    },
};

/// Stages uploads as files in a single local directory.
#[derive(Debug, Clone)]
pub struct LocalTempFileStore {
    root: PathBuf,
}

impl LocalTempFileStore {
    /// Creates the directory if it does not exist yet.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            tracing::error!(error = %e, path = %root.display(), "Failed to create upload directory");
            CoreError::Storage(format!(
                "cannot create upload directory {}: {}",
                root.display(),
                e
            ))
        })?;

        tracing::info!(path = %root.display(), "Temporary upload directory ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// `<uuid>-<random>.<ext>`; nothing from the client name reaches the path.
    fn unique_path(&self, format: ImageFormat) -> PathBuf {
        let name = format!(
            "{}-{}.{}",
            generate_uuid_v7().simple(),
            generate_random_string(8).to_ascii_lowercase(),
            format.extension()
        );
        self.root.join(name)
    }
}

impl TempFileStore for LocalTempFileStore {
    #[instrument(skip(self, image), fields(file_name = %image.file_name, size = image.data.len()))]
    async fn store(
        &self,
        image: &UploadedImage,
        format: ImageFormat,
    ) -> Result<TempUpload, CoreError> {
        let path = self.unique_path(format);

        tokio::fs::write(&path, &image.data).await.map_err(|e| {
            tracing::error!(error = %e, path = %path.display(), "Failed to stage upload");
            CoreError::Storage(format!("failed to stage {}: {}", image.file_name, e))
        })?;

        tracing::debug!(path = %path.display(), "Upload staged");
        Ok(TempUpload::new(path, image.file_name.clone()))
    }

    async fn read_base64(&self, upload: &TempUpload) -> Result<String, CoreError> {
        let data = tokio::fs::read(upload.path()).await.map_err(|e| {
            tracing::error!(error = %e, path = %upload.path().display(), "Failed to read staged upload");
            CoreError::Storage(format!(
                "failed to read {}: {}",
                upload.original_name(),
                e
            ))
        })?;

        Ok(general_purpose::STANDARD.encode(data))
    }

    async fn remove(&self, mut upload: TempUpload) -> Result<(), CoreError> {
        match tokio::fs::remove_file(upload.path()).await {
            Ok(()) => {
                tracing::debug!(path = %upload.path().display(), "Staged upload removed");
                upload.mark_removed();
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                upload.mark_removed();
                Ok(())
            }
            // The Drop of `upload` makes one more attempt.
            Err(e) => Err(CoreError::Storage(format!(
                "failed to remove {}: {}",
                upload.path().display(),
                e
            ))),
        }
    }
}
