//! Capability discovery
//!
//! One discovery pass sends `OPTIONS` for the document URL, reads the
//! multipart reply and subscribes every advertised selector. Each node
//! matching a selector, now or later, receives a capability event.

use std::rc::Rc;

use pl_dom::{DomEvent, EventDispatcher, MatchCallback, SelectorSubscriber, SharedDocument};
use pl_net::{CapabilityMessage, Method, MultipartPart, Request, Transport};

use crate::{Config, ResourceDocument, Result};

/// One part of a discovery response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityAdvertisement {
    pub selector: String,
    /// Methods from the `Allow` header; `None` when the header is missing
    pub allow: Option<Vec<String>>,
}

impl CapabilityAdvertisement {
    /// Read an advertisement from a part's `Content-Range` and `Allow`
    /// headers. Parts without a usable `Content-Range` yield `None`.
    pub fn from_part(part: &MultipartPart) -> Option<Self> {
        let range = part.header("content-range")?;
        let Some((_, selector)) = range.split_once('=') else {
            tracing::warn!("Ignoring Content-Range without a selector: {:?}", range);
            return None;
        };

        let allow = part.header("allow").map(|allow| {
            allow
                .split(',')
                .map(str::trim)
                .filter(|method| !method.is_empty())
                .map(String::from)
                .collect()
        });

        Some(Self {
            selector: selector.trim().to_string(),
            allow,
        })
    }
}

/// A discovery pass over one document resource
pub struct CapabilityDiscovery<'a, T> {
    resource: &'a ResourceDocument<T>,
    subscriber: &'a dyn SelectorSubscriber,
    config: &'a Config,
}

impl<'a, T: Transport> CapabilityDiscovery<'a, T> {
    pub fn new(
        resource: &'a ResourceDocument<T>,
        subscriber: &'a dyn SelectorSubscriber,
        config: &'a Config,
    ) -> Self {
        Self {
            resource,
            subscriber,
            config,
        }
    }

    /// The `OPTIONS` request announcing that we want a multipart reply
    pub fn request(&self) -> Request {
        Request::new(Method::Options, self.resource.url())
            .with_header("Prefer", &self.config.prefer)
            .with_header("Accept", &self.config.accept)
    }

    /// Run the pass, returning the advertisements in wire order
    pub async fn discover(&self) -> Result<Vec<CapabilityAdvertisement>> {
        tracing::info!("Discovering capabilities for {}", self.resource.url());

        let response = self.resource.transport().send(self.request()).await?;
        let message = CapabilityMessage::new(response)?;
        let parts = message.parts().await?;

        let mut advertisements = Vec::new();
        for part in &parts {
            let Some(advertisement) = CapabilityAdvertisement::from_part(part) else {
                continue;
            };

            let document = self.resource.document().await?;
            let callback = capability_callback(&document, &advertisement);
            self.subscriber.subscribe(&document, &advertisement.selector, callback);
            advertisements.push(advertisement);
        }

        tracing::info!(
            "Found {} capability advertisements in {} parts for {}",
            advertisements.len(),
            parts.len(),
            self.resource.url()
        );
        Ok(advertisements)
    }
}

fn capability_callback(document: &SharedDocument, advertisement: &CapabilityAdvertisement) -> MatchCallback {
    let document = Rc::downgrade(document);
    let selector = advertisement.selector.clone();
    let allow = advertisement.allow.clone();

    Rc::new(move |node| {
        let Some(allow) = &allow else {
            tracing::error!("Capability for {:?} has no Allow header", selector);
            return;
        };
        if let Some(document) = document.upgrade() {
            document.dispatch_event(DomEvent::capability(node, &selector, allow.clone()));
        }
    })
}
