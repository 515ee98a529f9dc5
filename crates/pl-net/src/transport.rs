//! HTTP Transport
//!
//! The [`Transport`] trait is the seam between capability handling and the
//! network. [`HttpTransport`] runs the blocking `reqwest` client on smol's
//! blocking thread pool.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::{Method, NetError, Request, Response};

/// Executes requests
///
/// Non-2xx statuses are returned as responses, not errors.
pub trait Transport {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response, NetError>>;
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent string
    pub user_agent: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max redirects to follow (0 = disable)
    pub max_redirects: usize,
    /// Headers sent with every request
    pub default_headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("pagelove/", env!("CARGO_PKG_VERSION")).into(),
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
            max_redirects: 10,
            default_headers: Vec::new(),
        }
    }
}

/// HTTP transport builder
pub struct HttpTransportBuilder {
    config: ClientConfig,
}

impl HttpTransportBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn user_agent(mut self, ua: &str) -> Self {
        self.config.user_agent = ua.to_string();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    pub fn default_header(mut self, name: &str, value: &str) -> Self {
        self.config.default_headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn build(self) -> Result<HttpTransport, NetError> {
        HttpTransport::with_config(self.config)
    }
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Transport backed by `reqwest::blocking`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    config: ClientConfig,
}

impl HttpTransport {
    /// Create a transport with default settings
    pub fn new() -> Result<Self, NetError> {
        Self::builder().build()
    }

    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    /// Create with custom config
    pub fn with_config(config: ClientConfig) -> Result<Self, NetError> {
        let redirects = match config.max_redirects {
            0 => reqwest::redirect::Policy::none(),
            max => reqwest::redirect::Policy::limited(max),
        };

        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .redirect(redirects)
            .default_headers(header_map(
                config.default_headers.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            )?)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Response, NetError> {
        let url = Url::parse(&request.url).map_err(|e| NetError::InvalidUrl(format!("{}: {}", request.url, e)))?;
        tracing::info!("HTTP {} {}", request.method, url);

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), url)
            .headers(header_map(
                request.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            )?);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = smol::unblock(move || -> Result<Response, NetError> {
            let response = builder.send()?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect();
            let body = response.bytes()?.to_vec();
            Ok(Response { status, headers, body })
        })
        .await?;

        tracing::debug!("HTTP {} -> {} ({} bytes)", request.url, response.status, response.body.len());
        Ok(response)
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Options => reqwest::Method::OPTIONS,
        Method::Patch => reqwest::Method::PATCH,
    }
}

fn header_map<'a>(headers: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<HeaderMap, NetError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| NetError::InvalidHeader(name.to_string()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| NetError::InvalidHeader(format!("{}: {}", name, value)))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_config() {
        let builder = HttpTransportBuilder::new()
            .user_agent("pagelove-test")
            .max_redirects(0)
            .default_header("X-Client", "tests");
        assert_eq!(builder.config.user_agent, "pagelove-test");
        assert_eq!(builder.config.max_redirects, 0);
        assert_eq!(builder.config.default_headers.len(), 1);
    }

    #[test]
    fn test_invalid_default_header() {
        let result = HttpTransport::builder()
            .default_header("Bad Header", "x")
            .build();
        assert!(matches!(result, Err(NetError::InvalidHeader(_))));
    }

    #[test]
    fn test_invalid_url_is_rejected_before_sending() {
        let transport = HttpTransport::new().unwrap();
        let result = smol::block_on(transport.send(Request::get("not a url")));
        assert!(matches!(result, Err(NetError::InvalidUrl(_))));
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(to_reqwest_method(Method::Options), reqwest::Method::OPTIONS);
        assert_eq!(to_reqwest_method(Method::Delete).as_str(), Method::Delete.as_str());
    }
}
