use thiserror::Error;

/// Caller-supplied input that fails a precondition. Raised before any
/// provider call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("project description must not be empty")]
    EmptyDescription,
    /// The request body did not deserialize into the expected shape.
    #[error("invalid request body: {0}")]
    MalformedRequest(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<ExtractionError> for GenerationError {
    fn from(e: ExtractionError) -> Self {
        GenerationError::MalformedResponse(e.to_string())
    }
}

impl GenerationError {
    /// Stable machine-readable tag for logs and error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::Validation(_) => "VALIDATION_ERROR",
            GenerationError::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            GenerationError::MalformedResponse(_) => "MALFORMED_RESPONSE",
        }
    }
}
