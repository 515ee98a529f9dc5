//! Pagelove Networking
//!
//! Requests and responses, the transport seam, and the multipart
//! capability messages returned by discovery.

mod loader;
mod message;
mod response;
mod transport;
pub mod multipart;

pub use loader::{Method, Request};
pub use message::CapabilityMessage;
pub use multipart::MultipartPart;
pub use response::Response;
pub use transport::{ClientConfig, HttpTransport, HttpTransportBuilder, Transport};
pub use url::Url;

/// Network error
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("Invalid response: status {status}")]
    InvalidResponse { status: u16 },

    #[error("Response is not multipart")]
    NotMultipart,

    #[error("No boundary found in Content-Type header")]
    MissingBoundary,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    #[error("Body is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
}
