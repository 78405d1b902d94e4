use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("No images were uploaded")]
    NoImages,

    #[error("Too many images: {count} uploaded, at most {max} allowed")]
    TooManyImages { count: usize, max: usize },

    #[error("File type not allowed: {0}")]
    UnsupportedFileType(String),

    #[error("File is empty: {0}")]
    EmptyFile(String),

    #[error("File too large: {name} is {size} bytes, max is {max} bytes")]
    FileTooLarge { name: String, size: usize, max: usize },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("{provider} ({model}) temporarily unavailable: {message}")]
    ProviderTransient {
        provider: String,
        model: String,
        status: Option<u16>,
        message: String,
    },

    #[error("{provider} ({model}) rejected the request: {message}")]
    ProviderFatal {
        provider: String,
        model: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Failed to interpret model response: {0}")]
    Parse(String),

    #[error("No ingredients detected")]
    NoIngredientsDetected,

    #[error("Image analysis failed: {0}")]
    VisionFailed(Box<CoreError>),

    #[error("Recipe generation failed: {0}")]
    RecipeFailed(Box<CoreError>),

    #[error("Temporary storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error")]
    InternalServerError,
}

impl CoreError {
    /// Whether retrying the same provider call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::ProviderTransient { .. })
    }

    /// Unwraps the stage wrappers to get at the provider-level cause.
    pub fn root_cause(&self) -> &CoreError {
        match self {
            CoreError::VisionFailed(inner) | CoreError::RecipeFailed(inner) => inner.root_cause(),
            other => other,
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Storage(e.to_string())
    }
}
