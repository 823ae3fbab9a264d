use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    /// The requested backend object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A name lookup matched more than one backend object
    #[error("Multiple results: {0}")]
    MultipleResults(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Invalid network configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Kubernetes error: {0}")]
    KubernetesError(#[from] kube::error::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(_))
    }

    pub fn is_multiple_results(&self) -> bool {
        matches!(self, CoreError::MultipleResults(_))
    }
}
