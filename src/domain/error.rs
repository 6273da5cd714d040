use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("invalid pdf option `{option}`: {reason}")]
    InvalidPdfOption { option: &'static str, reason: String },
}

impl DomainError {
    pub fn invalid_pdf_option(option: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidPdfOption {
            option,
            reason: reason.into(),
        }
    }
}
