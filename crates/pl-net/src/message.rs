//! Capability messages
//!
//! A successful multipart response to a discovery request. The body is
//! decoded once and re-split into parts on every request for them.

use smol::lock::OnceCell;

use crate::multipart::{self, MultipartPart};
use crate::{NetError, Response};

const BOUNDARY_PARAM: &str = "boundary=";

/// Multipart response carrying capability advertisements
#[derive(Debug)]
pub struct CapabilityMessage {
    response: Response,
    body: OnceCell<String>,
}

impl CapabilityMessage {
    /// Wrap a response, rejecting non-2xx and non-multipart responses
    pub fn new(response: Response) -> Result<Self, NetError> {
        if !response.ok() {
            return Err(NetError::InvalidResponse {
                status: response.status(),
            });
        }
        if !Self::is_multipart(&response) {
            return Err(NetError::NotMultipart);
        }
        Ok(Self {
            response,
            body: OnceCell::new(),
        })
    }

    /// Whether the response's Content-Type carries a boundary parameter
    pub fn is_multipart(response: &Response) -> bool {
        response
            .header("Content-Type")
            .and_then(boundary_param)
            .is_some()
    }

    /// The multipart boundary, without surrounding quotes
    pub fn boundary(&self) -> Result<&str, NetError> {
        self.response
            .header("Content-Type")
            .and_then(boundary_param)
            .ok_or(NetError::MissingBoundary)
    }

    /// Decoded body text, read from the response once
    pub async fn body(&self) -> Result<&str, NetError> {
        let body = self
            .body
            .get_or_try_init(|| async { self.response.text() })
            .await?;
        Ok(body.as_str())
    }

    /// Parts of the body in wire order
    pub async fn parts(&self) -> Result<Vec<MultipartPart>, NetError> {
        let boundary = self.boundary()?;
        let body = self.body().await?;
        let parts = multipart::parse(body, boundary);
        tracing::debug!("Parsed {} multipart parts", parts.len());
        Ok(parts)
    }

    pub fn response(&self) -> &Response {
        &self.response
    }
}

fn boundary_param(content_type: &str) -> Option<&str> {
    let start = content_type.find(BOUNDARY_PARAM)? + BOUNDARY_PARAM.len();
    let value = content_type[start..].split(';').next()?.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multipart_response(content_type: &str, body: &str) -> Response {
        Response::new(200)
            .with_header("Content-Type", content_type)
            .with_body(body)
    }

    #[test]
    fn test_rejects_error_status() {
        let response = Response::new(500).with_header("Content-Type", "multipart/mixed; boundary=x");
        assert!(matches!(
            CapabilityMessage::new(response),
            Err(NetError::InvalidResponse { status: 500 })
        ));
    }

    #[test]
    fn test_rejects_non_multipart() {
        let response = multipart_response("text/html", "<p>hi</p>");
        assert!(!CapabilityMessage::is_multipart(&response));
        assert!(matches!(CapabilityMessage::new(response), Err(NetError::NotMultipart)));

        let no_header = Response::new(204);
        assert!(matches!(CapabilityMessage::new(no_header), Err(NetError::NotMultipart)));
    }

    #[test]
    fn test_boundary_forms() {
        assert_eq!(boundary_param("multipart/mixed; boundary=abc"), Some("abc"));
        assert_eq!(boundary_param("multipart/mixed; boundary=\"a b\""), Some("a b"));
        assert_eq!(boundary_param("multipart/mixed; boundary=abc; charset=utf-8"), Some("abc"));
        assert_eq!(boundary_param("multipart/mixed; boundary="), None);
        assert_eq!(boundary_param("multipart/mixed"), None);
    }

    #[test]
    fn test_parts_reparsed_from_cached_body() {
        let body = "--z\r\nContent-Range: selector=#a\r\nAllow: DELETE\r\n\r\n\r\n--z--";
        let message = CapabilityMessage::new(multipart_response("multipart/mixed; boundary=z", body)).unwrap();

        smol::block_on(async {
            assert_eq!(message.body().await.unwrap(), body);
            let first = message.parts().await.unwrap();
            let second = message.parts().await.unwrap();
            assert_eq!(first, second);
            assert_eq!(first[0].header("allow"), Some("DELETE"));
        });
    }

    #[test]
    fn test_invalid_body_encoding() {
        let response = Response::new(200)
            .with_header("Content-Type", "multipart/mixed; boundary=z")
            .with_body(vec![0xc3, 0x28]);
        let message = CapabilityMessage::new(response).unwrap();
        let result = smol::block_on(message.parts());
        assert!(matches!(result, Err(NetError::Decode(_))));
    }
}
