//! Error types

use pl_html::HtmlError;
use pl_net::NetError;

/// Pagelove error
#[derive(Debug, thiserror::Error)]
pub enum PageloveError {
    #[error(transparent)]
    Net(#[from] NetError),

    #[error(transparent)]
    Html(#[from] HtmlError),

    #[error("POST requires a body parameter")]
    MissingBody,

    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),
}

pub type Result<T> = std::result::Result<T, PageloveError>;
