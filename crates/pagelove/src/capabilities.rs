//! Capability registry
//!
//! Maps `(node, method)` to the operation bound for it. One handle is kept
//! per node; binding again replaces earlier entries for the same method
//! and never removes others.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use pl_dom::NodeId;
use pl_net::{Method, Response, Transport};

use crate::{Body, ResourceHandle, Result};

/// A method bound to a node's resource handle
pub struct BoundOperation<T> {
    handle: Rc<ResourceHandle<T>>,
    method: Method,
}

impl<T> Clone for BoundOperation<T> {
    fn clone(&self) -> Self {
        Self {
            handle: Rc::clone(&self.handle),
            method: self.method,
        }
    }
}

impl<T: Transport> BoundOperation<T> {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn handle(&self) -> &Rc<ResourceHandle<T>> {
        &self.handle
    }

    /// Perform the operation
    pub async fn call(&self, body: Option<Body>) -> Result<Response> {
        self.handle.call(self.method, body).await
    }
}

/// Capabilities bound on the nodes of one document
pub struct CapabilityRegistry<T> {
    handles: RefCell<HashMap<NodeId, Rc<ResourceHandle<T>>>>,
    bindings: RefCell<HashMap<(NodeId, Method), BoundOperation<T>>>,
}

impl<T: Transport> CapabilityRegistry<T> {
    pub fn new() -> Self {
        Self {
            handles: RefCell::new(HashMap::new()),
            bindings: RefCell::new(HashMap::new()),
        }
    }

    /// The node's handle, created with `create` on first use
    pub fn handle_for(
        &self,
        node: NodeId,
        create: impl FnOnce() -> ResourceHandle<T>,
    ) -> Rc<ResourceHandle<T>> {
        let mut handles = self.handles.borrow_mut();
        Rc::clone(handles.entry(node).or_insert_with(|| Rc::new(create())))
    }

    /// Bind each allowed method on the handle's node. Returns the number
    /// of methods bound.
    pub fn bind(&self, handle: &Rc<ResourceHandle<T>>, allow: &[String]) -> usize {
        let node = handle.node();
        let mut bindings = self.bindings.borrow_mut();
        let mut bound = 0;

        for name in allow {
            let method = match name.parse::<Method>() {
                Ok(method) if ResourceHandle::<T>::supports(method) => method,
                Ok(method) => {
                    tracing::warn!("Skipping {} on {:?}: not a handle operation", method, node);
                    continue;
                }
                Err(err) => {
                    tracing::warn!("Skipping capability on {:?}: {}", node, err);
                    continue;
                }
            };

            bindings.insert(
                (node, method),
                BoundOperation {
                    handle: Rc::clone(handle),
                    method,
                },
            );
            bound += 1;
        }

        tracing::debug!("Bound {} methods on {:?}", bound, node);
        bound
    }

    /// The operation bound for `method` on `node`
    pub fn lookup(&self, node: NodeId, method: Method) -> Option<BoundOperation<T>> {
        self.bindings.borrow().get(&(node, method)).cloned()
    }

    /// Methods bound on `node`, in a stable order
    pub fn methods(&self, node: NodeId) -> Vec<Method> {
        let mut methods: Vec<Method> = self
            .bindings
            .borrow()
            .keys()
            .filter(|(bound, _)| *bound == node)
            .map(|(_, method)| *method)
            .collect();
        methods.sort();
        methods
    }

    pub fn handle(&self, node: NodeId) -> Option<Rc<ResourceHandle<T>>> {
        self.handles.borrow().get(&node).map(Rc::clone)
    }

    /// Number of bound `(node, method)` pairs
    pub fn len(&self) -> usize {
        self.bindings.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.borrow().is_empty()
    }
}

impl<T: Transport> Default for CapabilityRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
