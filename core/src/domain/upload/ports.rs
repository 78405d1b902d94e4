use std::future::Future;

use crate::domain::{
    common::entities::app_errors::CoreError,
    upload::entities::{ImageFormat, TempUpload, UploadedImage},
};

/// Port for request-scoped temporary image storage
pub trait TempFileStore: Send + Sync {
    /// Write the image under a fresh unique name
    fn store(
        &self,
        image: &UploadedImage,
        format: ImageFormat,
    ) -> impl Future<Output = Result<TempUpload, CoreError>> + Send;

    /// Read a staged image back as standard base64
    fn read_base64(
        &self,
        upload: &TempUpload,
    ) -> impl Future<Output = Result<String, CoreError>> + Send;

    /// Delete a staged image; a file that is already gone is not an error
    fn remove(&self, upload: TempUpload) -> impl Future<Output = Result<(), CoreError>> + Send;
}
