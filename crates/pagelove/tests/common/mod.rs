//! Test utilities and fixtures for pagelove integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use pagelove::dom::SharedDocument;
use pagelove::net::{Method, NetError, Request, Response, Transport};
use pagelove::{Config, ControllerRegistry, DocumentController};

pub const URL: &str = "https://example.com/list";

pub const BOUNDARY: &str = "pl-boundary";

/// A list document with two identified items.
pub const LIST_HTML: &str = "<!DOCTYPE html><html><head><title>List</title></head><body>\
    <ul id=\"list\"><li id=\"item-1\">One</li><li id=\"item-2\">Two</li></ul>\
    </body></html>";

/// In-memory transport. Responses are queued per method; unqueued
/// requests get a 404. Every request is recorded.
#[derive(Default)]
pub struct MockTransport {
    responses: RefCell<HashMap<Method, VecDeque<Result<Response, String>>>>,
    requests: RefCell<Vec<Request>>,
}

impl MockTransport {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Queue a response for the next request with `method`.
    pub fn respond(&self, method: Method, response: Response) {
        self.responses
            .borrow_mut()
            .entry(method)
            .or_default()
            .push_back(Ok(response));
    }

    /// Queue a network failure for the next request with `method`.
    pub fn fail(&self, method: Method, reason: &str) {
        self.responses
            .borrow_mut()
            .entry(method)
            .or_default()
            .push_back(Err(reason.to_string()));
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    pub fn requests_for(&self, method: Method) -> Vec<Request> {
        self.requests
            .borrow()
            .iter()
            .filter(|request| request.method == method)
            .cloned()
            .collect()
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: Request) -> Result<Response, NetError> {
        // Suspend once so overlapping operations interleave
        smol::future::yield_now().await;

        let method = request.method;
        self.requests.borrow_mut().push(request);
        let queued = self
            .responses
            .borrow_mut()
            .get_mut(&method)
            .and_then(VecDeque::pop_front);

        match queued {
            Some(Ok(response)) => Ok(response),
            Some(Err(reason)) => Err(NetError::Network(reason)),
            None => Ok(Response::new(404)),
        }
    }
}

/// Build a multipart discovery response. Each part is a `Content-Range`
/// value and an optional `Allow` value.
pub fn discovery_response(parts: &[(&str, Option<&str>)]) -> Response {
    let mut body = String::new();
    for (range, allow) in parts {
        body.push_str(&format!("--{}\r\n", BOUNDARY));
        body.push_str(&format!("Content-Range: {}\r\n", range));
        if let Some(allow) = allow {
            body.push_str(&format!("Allow: {}\r\n", allow));
        }
        body.push_str("\r\n\r\n");
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));

    Response::new(200)
        .with_header("Content-Type", &format!("multipart/mixed; boundary={}", BOUNDARY))
        .with_body(body)
}

pub fn html_response(status: u16, html: &str) -> Response {
    Response::new(status)
        .with_header("Content-Type", "text/html; charset=utf-8")
        .with_body(html)
}

/// Parse `LIST_HTML` and attach a bound controller to it.
pub fn live_controller(
    transport: &Rc<MockTransport>,
) -> (SharedDocument, Rc<DocumentController<MockTransport>>) {
    let document = pagelove::html::parse(LIST_HTML)
        .expect("fixture parses")
        .into_shared();
    let registry = ControllerRegistry::new();
    let controller = registry
        .attach(URL, &document, Rc::clone(transport), Config::default())
        .expect("valid url");
    (document, controller)
}

/// Look up an element by id.
pub fn element(document: &SharedDocument, id: &str) -> pagelove::dom::NodeId {
    document
        .borrow()
        .get_element_by_id(id)
        .unwrap_or_else(|| panic!("no element #{}", id))
}
