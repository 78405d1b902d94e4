use crate::domain::{
    common::entities::app_errors::CoreError,
    upload::entities::{ImageFormat, UploadedImage},
};

/// Limits applied to uploaded images before anything touches disk or a provider.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    max_file_bytes: usize,
    allowed_extensions: Vec<String>,
    max_images: usize,
}

impl UploadPolicy {
    pub fn new(max_file_bytes: usize, allowed_extensions: Vec<String>, max_images: usize) -> Self {
        Self {
            max_file_bytes,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
            max_images: max_images.max(1),
        }
    }

    pub fn max_file_bytes(&self) -> usize {
        self.max_file_bytes
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    pub fn max_images(&self) -> usize {
        self.max_images
    }

    pub fn validate(&self, image: &UploadedImage) -> Result<ImageFormat, CoreError> {
        let format = image
            .extension()
            .filter(|ext| self.allowed_extensions.iter().any(|allowed| allowed == ext))
            .and_then(|ext| ImageFormat::from_extension(&ext))
            .ok_or_else(|| CoreError::UnsupportedFileType(image.file_name.clone()))?;

        if image.data.is_empty() {
            return Err(CoreError::EmptyFile(image.file_name.clone()));
        }

        if image.data.len() > self.max_file_bytes {
            return Err(CoreError::FileTooLarge {
                name: image.file_name.clone(),
                size: image.data.len(),
                max: self.max_file_bytes,
            });
        }

        Ok(format)
    }

    pub fn validate_batch(&self, images: &[UploadedImage]) -> Result<Vec<ImageFormat>, CoreError> {
        if images.is_empty() {
            return Err(CoreError::NoImages);
        }

        if images.len() > self.max_images {
            return Err(CoreError::TooManyImages {
                count: images.len(),
                max: self.max_images,
            });
        }

        images.iter().map(|image| self.validate(image)).collect()
    }
}
