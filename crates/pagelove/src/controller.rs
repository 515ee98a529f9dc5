//! Document controller
//!
//! Owns the binding state for one document resource. Once the document is
//! available the controller installs a capability listener and a
//! completion listener on the document root; capability events arriving
//! there bind operations on their target nodes.

use std::cell::Cell;
use std::rc::Rc;

use pl_dom::{DomEvent, DomEventType, DomSubscriber, EventListener, NodeId, SelectorSubscriber, SharedDocument};
use pl_net::{Method, Response, Transport};

use crate::{
    Body, BoundOperation, CapabilityAdvertisement, CapabilityDiscovery, CapabilityRegistry, Config,
    PageloveError, ResourceDocument, ResourceHandle, Result,
};

/// Binding state of a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    /// Document not yet available
    Unbound,
    /// Document fetch in progress
    Resolving,
    /// Listeners installed
    Bound,
}

/// Binds discovered capabilities onto one document
pub struct DocumentController<T: Transport + 'static> {
    resource: ResourceDocument<T>,
    config: Rc<Config>,
    subscriber: Rc<dyn SelectorSubscriber>,
    capabilities: Rc<CapabilityRegistry<T>>,
    state: Cell<BindingState>,
    discovering: Cell<bool>,
}

impl<T: Transport + 'static> DocumentController<T> {
    /// Create a controller with default configuration
    pub fn new(resource: ResourceDocument<T>) -> Self {
        Self::with_config(resource, Config::default())
    }

    /// Create a controller. A live document is bound immediately.
    pub fn with_config(resource: ResourceDocument<T>, config: Config) -> Self {
        let controller = Self {
            resource,
            config: Rc::new(config),
            subscriber: Rc::new(DomSubscriber::new()),
            capabilities: Rc::new(CapabilityRegistry::new()),
            state: Cell::new(BindingState::Unbound),
            discovering: Cell::new(false),
        };

        if let Some(document) = controller.resource.attached() {
            controller.bind(&document);
        }
        controller
    }

    /// Use a different selector subscriber for discovery
    pub fn with_subscriber(mut self, subscriber: Rc<dyn SelectorSubscriber>) -> Self {
        self.subscriber = subscriber;
        self
    }

    pub fn state(&self) -> BindingState {
        self.state.get()
    }

    pub fn url(&self) -> &str {
        self.resource.url()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resource(&self) -> &ResourceDocument<T> {
        &self.resource
    }

    /// The document, fetched on first use. Binds the controller.
    pub async fn document(&self) -> Result<SharedDocument> {
        if let Some(document) = self.resource.attached() {
            self.bind(&document);
            return Ok(document);
        }

        self.state.set(BindingState::Resolving);
        match self.resource.document().await {
            Ok(document) => {
                self.bind(&document);
                Ok(document)
            }
            Err(err) => {
                tracing::error!("Failed to load document {}: {}", self.url(), err);
                self.state.set(BindingState::Unbound);
                Err(err)
            }
        }
    }

    /// Run a discovery pass. An overlapping call returns no advertisements.
    pub async fn discover(&self) -> Result<Vec<CapabilityAdvertisement>> {
        let Some(_guard) = DiscoveryGuard::acquire(&self.discovering) else {
            tracing::warn!("Discovery already running for {}", self.url());
            return Ok(Vec::new());
        };

        self.document().await?;
        CapabilityDiscovery::new(&self.resource, self.subscriber.as_ref(), &self.config)
            .discover()
            .await
    }

    /// The operation bound for `method` on `node`, by method name
    pub fn capability(&self, node: NodeId, method: &str) -> Option<BoundOperation<T>> {
        let method = method.parse::<Method>().ok()?;
        self.capabilities.lookup(node, method)
    }

    /// Methods currently bound on `node`
    pub fn allowed_methods(&self, node: NodeId) -> Vec<Method> {
        self.capabilities.methods(node)
    }

    /// The resource handle bound to `node`
    pub fn handle(&self, node: NodeId) -> Option<Rc<ResourceHandle<T>>> {
        self.capabilities.handle(node)
    }

    /// Perform the operation bound for `method` on `node`
    pub async fn invoke(&self, node: NodeId, method: Method, body: Option<Body>) -> Result<Response> {
        let operation = self
            .capabilities
            .lookup(node, method)
            .ok_or_else(|| PageloveError::UnsupportedMethod(method.to_string()))?;
        operation.call(body).await
    }

    fn bind(&self, document: &SharedDocument) {
        if self.state.get() == BindingState::Bound {
            return;
        }

        let capability_listener = self.capability_listener(document);
        let completion_listener = self.completion_listener();
        {
            let mut doc = document.borrow_mut();
            doc.add_event_listener(NodeId::ROOT, DomEventType::Capability, capability_listener);
            doc.add_event_listener(NodeId::ROOT, DomEventType::MethodCompleted, completion_listener);
        }

        self.state.set(BindingState::Bound);
        tracing::debug!("Bound controller for {}", self.url());
    }

    fn capability_listener(&self, document: &SharedDocument) -> EventListener {
        let registry = Rc::downgrade(&self.capabilities);
        let document = Rc::downgrade(document);
        let transport = Rc::clone(self.resource.transport());
        let config = Rc::clone(&self.config);
        let url = self.url().to_string();

        Rc::new(move |event: &mut DomEvent| {
            let Some(detail) = event.capability_detail() else {
                return;
            };
            let (Some(registry), Some(document)) = (registry.upgrade(), document.upgrade()) else {
                return;
            };

            let node = event.target;
            let handle = registry.handle_for(node, || {
                ResourceHandle::new(&url, node, document, Rc::clone(&transport), Rc::clone(&config))
            });
            registry.bind(&handle, &detail.allow);
        })
    }

    fn completion_listener(&self) -> EventListener {
        let log_failures = self.config.log_failed_methods;

        Rc::new(move |event: &mut DomEvent| {
            let Some(detail) = event.completion_detail() else {
                return;
            };
            if !detail.ok() && log_failures {
                tracing::error!(
                    "{} on {:?} failed with status {}",
                    detail.method,
                    event.target,
                    detail.status
                );
            }
        })
    }
}

struct DiscoveryGuard<'a>(&'a Cell<bool>);

impl<'a> DiscoveryGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        (!flag.replace(true)).then_some(Self(flag))
    }
}

impl Drop for DiscoveryGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
