//! Capability negotiation configuration

/// Configuration options
#[derive(Debug, Clone)]
pub struct Config {
    /// `Prefer` header sent with discovery requests
    pub prefer: String,

    /// `Accept` header sent with discovery requests
    pub accept: String,

    /// Range unit used in `Content-Range` advertisements and `Range` requests
    pub range_unit: String,

    /// Log an error when an operation completes with a non-2xx status
    pub log_failed_methods: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefer: "return=representation".to_string(),
            accept: "multipart/mixed".to_string(),
            range_unit: "selector".to_string(),
            log_failed_methods: true,
        }
    }
}
