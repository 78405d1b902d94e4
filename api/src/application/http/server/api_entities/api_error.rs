use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::IntoResponse,
};
use pantrychef_core::domain::common::entities::app_errors::CoreError;
use thiserror::Error;
use tracing::error;

use super::response::AnalyzeResponse;

pub const MSG_UNEXPECTED: &str = "Error inesperado. Por favor, intenta de nuevo.";
pub const MSG_UNAVAILABLE: &str =
    "Servicio temporalmente no disponible. Por favor, intenta de nuevo en unos minutos.";
pub const MSG_NO_INGREDIENTS: &str =
    "No se detectaron ingredientes. Intenta de nuevo con una foto más clara.";
pub const MSG_VISION_FAILED: &str =
    "Error al analizar la imagen. Revisa la configuración del proveedor de IA.";
pub const MSG_RECIPE_UNREADABLE: &str =
    "No se pudo generar una receta válida. Por favor, intenta de nuevo.";
pub const MSG_RECIPE_FAILED: &str =
    "Error al generar las recetas. Revisa la configuración del proveedor de IA.";

/// Errors returned to HTTP clients. Messages are user-facing; provider
/// payloads and credentials stay in the logs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Demasiadas solicitudes. Intenta de nuevo en {retry_after_secs} segundos.")]
    TooManyRequests { retry_after_secs: u64 },

    #[error("{0}")]
    UnprocessableEntity(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("{0}")]
    InternalServerError(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unexpected() -> Self {
        ApiError::InternalServerError(MSG_UNEXPECTED.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let mut response = (status, Json(AnalyzeResponse::failure(self.to_string()))).into_response();

        if let ApiError::TooManyRequests { retry_after_secs } = self
            && let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string())
        {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        response
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        match &error {
            CoreError::NoImages => ApiError::BadRequest("No se subieron archivos".to_string()),
            CoreError::TooManyImages { max, .. } => ApiError::BadRequest(format!(
                "Demasiadas imágenes. Máximo permitido: {}",
                max
            )),
            CoreError::UnsupportedFileType(name) => {
                ApiError::BadRequest(format!("Tipo de archivo no permitido: {}", name))
            }
            CoreError::EmptyFile(name) => {
                ApiError::BadRequest(format!("El archivo está vacío: {}", name))
            }
            CoreError::FileTooLarge { name, max, .. } => ApiError::PayloadTooLarge(format!(
                "El archivo {} supera el tamaño máximo de {} bytes",
                name, max
            )),
            CoreError::Validation(message) => ApiError::BadRequest(message.clone()),
            CoreError::NoIngredientsDetected => {
                ApiError::UnprocessableEntity(MSG_NO_INGREDIENTS.to_string())
            }
            CoreError::VisionFailed(_) | CoreError::RecipeFailed(_) => {
                stage_error(&error, error.root_cause())
            }
            CoreError::Parse(_) => ApiError::UnprocessableEntity(MSG_NO_INGREDIENTS.to_string()),
            CoreError::ProviderTransient { .. } => {
                ApiError::ServiceUnavailable(MSG_UNAVAILABLE.to_string())
            }
            CoreError::ProviderFatal { .. }
            | CoreError::Storage(_)
            | CoreError::Configuration(_)
            | CoreError::InternalServerError => {
                error!(error = %error, "Request failed");
                ApiError::unexpected()
            }
        }
    }
}

fn stage_error(error: &CoreError, cause: &CoreError) -> ApiError {
    match cause {
        CoreError::ProviderTransient { .. } => {
            ApiError::ServiceUnavailable(MSG_UNAVAILABLE.to_string())
        }
        CoreError::Parse(_) => match error {
            CoreError::RecipeFailed(_) => {
                ApiError::UnprocessableEntity(MSG_RECIPE_UNREADABLE.to_string())
            }
            _ => ApiError::UnprocessableEntity(MSG_NO_INGREDIENTS.to_string()),
        },
        _ => {
            error!(error = %error, "Provider call failed");
            match error {
                CoreError::RecipeFailed(_) => {
                    ApiError::InternalServerError(MSG_RECIPE_FAILED.to_string())
                }
                _ => ApiError::InternalServerError(MSG_VISION_FAILED.to_string()),
            }
        }
    }
}
