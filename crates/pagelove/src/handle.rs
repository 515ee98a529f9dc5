//! Resource handles
//!
//! A handle performs the HTTP operations bound to one node. Requests are
//! addressed with a `Range` header naming the node's current selector, and
//! every settled exchange raises a completion event on the node.

use std::rc::Rc;

use pl_dom::{
    deliver_mutations, synthesize_selector, CompletionDetail, DomEvent, EventDispatcher, NodeId,
    SharedDocument,
};
use pl_html::outer_html;
use pl_net::{Method, Request, Response, Transport};

use crate::{Config, PageloveError, Result};

/// Request body for an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Markup sent as-is
    Text(String),
    /// A node, sent as its outer markup
    Node(NodeId),
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<NodeId> for Body {
    fn from(node: NodeId) -> Self {
        Body::Node(node)
    }
}

/// HTTP operations for a single node
pub struct ResourceHandle<T> {
    url: String,
    node: NodeId,
    document: SharedDocument,
    transport: Rc<T>,
    config: Rc<Config>,
}

impl<T: Transport> ResourceHandle<T> {
    pub fn new(
        url: &str,
        node: NodeId,
        document: SharedDocument,
        transport: Rc<T>,
        config: Rc<Config>,
    ) -> Self {
        Self {
            url: url.to_string(),
            node,
            document,
            transport,
            config,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    /// Whether the handle implements `method`
    pub fn supports(method: Method) -> bool {
        matches!(method, Method::Delete | Method::Post | Method::Put)
    }

    /// The node's selector at its current position
    pub fn selector(&self) -> String {
        synthesize_selector(self.document.borrow().tree(), self.node)
    }

    /// A request for `method` addressed at the node
    pub fn request(&self, method: Method) -> Request {
        let range = format!("{}={}", self.config.range_unit, self.selector());
        Request::new(method, &self.url).with_header("Range", &range)
    }

    async fn process_request(&self, request: Request) -> Result<Response> {
        let method = request.method;
        let response = self.transport.send(request).await?;

        let detail = CompletionDetail {
            method: method.to_string(),
            status: response.status(),
            headers: response.headers().to_vec(),
            body: Rc::from(response.bytes()),
        };
        self.document
            .dispatch_event(DomEvent::method_completed(self.node, detail));

        Ok(response)
    }

    fn body_text(&self, body: Body) -> String {
        match body {
            Body::Text(text) => text,
            Body::Node(node) => outer_html(self.document.borrow().tree(), node),
        }
    }

    /// Delete the resource; on success the node is removed from the tree
    pub async fn delete(&self) -> Result<Response> {
        let response = self.process_request(self.request(Method::Delete)).await?;

        if response.ok() {
            self.document.borrow_mut().tree_mut().detach(self.node);
            deliver_mutations(&self.document);
        } else {
            tracing::warn!(
                "DELETE {} for {} failed with status {}",
                self.url,
                self.selector(),
                response.status()
            );
        }

        Ok(response)
    }

    /// Create a child resource; on success the returned markup is appended
    /// to the node as its last child
    pub async fn post(&self, body: Option<Body>) -> Result<Response> {
        let payload = body.map(|body| self.body_text(body)).unwrap_or_default();
        if payload.is_empty() {
            return Err(PageloveError::MissingBody);
        }

        let response = self
            .process_request(self.request(Method::Post).with_body(payload))
            .await?;
        if !response.ok() {
            return Ok(response);
        }

        let text = response.text()?;
        let added = {
            let mut document = self.document.borrow_mut();
            let tree = document.tree_mut();
            let added = pl_html::parse_fragment(tree, &text)?;
            tree.append_child(self.node, added);
            added
        };
        deliver_mutations(&self.document);
        tracing::debug!("Appended {:?} under {}", added, self.selector());

        Ok(response.with_text(&text))
    }

    /// Replace the resource, by default with the node's current markup
    pub async fn put(&self, body: Option<Body>) -> Result<Response> {
        let payload = match body {
            Some(body) => self.body_text(body),
            None => outer_html(self.document.borrow().tree(), self.node),
        };

        self.process_request(self.request(Method::Put).with_body(payload))
            .await
    }

    /// Route `method` to the matching operation
    pub async fn call(&self, method: Method, body: Option<Body>) -> Result<Response> {
        match method {
            Method::Delete => self.delete().await,
            Method::Post => self.post(body).await,
            Method::Put => self.put(body).await,
            other => Err(PageloveError::UnsupportedMethod(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pl_dom::Document;
    use pl_net::NetError;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        requests: RefCell<Vec<Request>>,
    }

    impl Transport for Recorder {
        async fn send(&self, request: Request) -> std::result::Result<Response, NetError> {
            self.requests.borrow_mut().push(request);
            Ok(Response::new(204))
        }
    }

    fn handle() -> (ResourceHandle<Recorder>, Rc<Recorder>) {
        let document = pl_html::parse("<ul id=\"list\"><li>a</li></ul>")
            .unwrap()
            .into_shared();
        let list = document.borrow().get_element_by_id("list").unwrap();
        let transport = Rc::new(Recorder::default());
        let handle = ResourceHandle::new(
            "https://example.com/",
            list,
            document,
            Rc::clone(&transport),
            Rc::new(Config::default()),
        );
        (handle, transport)
    }

    #[test]
    fn test_request_carries_range() {
        let (handle, _) = handle();
        let request = handle.request(Method::Put);
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.header("Range"), Some("selector=#list"));
    }

    #[test]
    fn test_custom_range_unit() {
        let document = Document::new("about:blank").into_shared();
        let body = document.borrow().body();
        let handle = ResourceHandle::new(
            "https://example.com/",
            body,
            document,
            Rc::new(Recorder::default()),
            Rc::new(Config {
                range_unit: "css".to_string(),
                ..Config::default()
            }),
        );
        assert_eq!(
            handle.request(Method::Delete).header("range"),
            Some("css=html:nth-child(1) > body:nth-child(2)")
        );
    }

    #[test]
    fn test_unsupported_methods() {
        let (handle, transport) = handle();
        for method in [Method::Get, Method::Head, Method::Options, Method::Patch] {
            assert!(!ResourceHandle::<Recorder>::supports(method));
            let result = smol::block_on(handle.call(method, None));
            assert!(matches!(result, Err(PageloveError::UnsupportedMethod(_))));
        }
        assert!(transport.requests.borrow().is_empty());
    }

    #[test]
    fn test_post_rejects_empty_body() {
        let (handle, transport) = handle();
        let result = smol::block_on(handle.post(Some(Body::from(""))));
        assert!(matches!(result, Err(PageloveError::MissingBody)));
        assert!(transport.requests.borrow().is_empty());
    }

    #[test]
    fn test_node_body_is_serialized() {
        let (handle, transport) = handle();
        let item = handle
            .document()
            .borrow()
            .query_selector("li")
            .unwrap()
            .unwrap();
        smol::block_on(handle.put(Some(Body::from(item)))).unwrap();

        let requests = transport.requests.borrow();
        assert_eq!(requests[0].body_text().as_deref(), Some("<li>a</li>"));
    }
}
