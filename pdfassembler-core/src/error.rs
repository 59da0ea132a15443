use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Invalid PDF format: {0}")]
    Format(String),

    #[error("Dangling object reference: {0} {1} R")]
    DanglingReference(u32, u16),

    #[error("Invalid edit batch: {0}")]
    EditValidation(String),

    #[error("Failed to persist document: {0}")]
    Persistence(#[source] std::io::Error),

    #[error("Invalid image: {0}")]
    InvalidImage(String),
}

impl PdfError {
    /// Returns true for errors caused by malformed input bytes.
    pub fn is_format_error(&self) -> bool {
        matches!(self, PdfError::Format(_))
    }
}

pub type Result<T> = std::result::Result<T, PdfError>;
