use std::{error::Error as StdError, fmt};

use thiserror::Error;

use crate::{application::export::ExportError, config::LoadError, infra::error::InfraError};

/// Flattened view of an error and its `source()` chain, suitable for logs and
/// batch reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages.join(": "))
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("validation failed: {0}")]
    Validation(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[derive(Debug, Error)]
    #[error("outer failure")]
    struct Outer {
        #[source]
        inner: io::Error,
    }

    #[test]
    fn report_walks_the_source_chain() {
        let error = Outer {
            inner: io::Error::new(io::ErrorKind::NotFound, "missing file"),
        };
        let report = ErrorReport::from_error("tests", &error);
        assert_eq!(report.messages, vec!["outer failure", "missing file"]);
        assert_eq!(report.to_string(), "outer failure: missing file");
    }
}
