/// Error types shared by the loader, catalog operations and both server surfaces.
///
/// `SourceError` covers everything that can go wrong between the remote sheet and a
/// parsed `Vec<Benefit>`. `CatalogError` is what boundary layers see: a source failure,
/// a rejected request, or a missing record.
use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("sheet source returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("sheet document exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("parse error: {0}")]
    Parse(String),
}

impl SourceError {
    /// Whether this failure came from reaching the remote source, as opposed to
    /// the content it returned.
    pub fn is_fetch(&self) -> bool {
        !matches!(self, SourceError::Parse(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("benefit not found: {0}")]
    NotFound(String),
}
