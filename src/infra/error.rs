use thiserror::Error;

use super::manifest::ManifestError;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

impl InfraError {
    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
