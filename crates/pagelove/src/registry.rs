//! Controller registry
//!
//! Side table from live documents to their controllers. Entries hold weak
//! references only, so neither the document nor the registry keeps a
//! controller alive.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use pl_dom::SharedDocument;
use pl_net::Transport;

use crate::{Config, DocumentController, ResourceDocument, Result};

struct Entry<T: Transport + 'static> {
    document: Weak<RefCell<pl_dom::Document>>,
    controller: Weak<DocumentController<T>>,
}

impl<T: Transport + 'static> Entry<T> {
    fn is_alive(&self) -> bool {
        self.document.strong_count() > 0 && self.controller.strong_count() > 0
    }
}

/// Finds or creates the controller for a live document
pub struct ControllerRegistry<T: Transport + 'static> {
    entries: RefCell<Vec<Entry<T>>>,
}

impl<T: Transport + 'static> ControllerRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
        }
    }

    /// The controller for `document`, created and bound if none is alive
    pub fn attach(
        &self,
        url: &str,
        document: &SharedDocument,
        transport: Rc<T>,
        config: Config,
    ) -> Result<Rc<DocumentController<T>>> {
        self.prune();
        if let Some(controller) = self.controller_for(document) {
            return Ok(controller);
        }

        let resource = ResourceDocument::live(url, Rc::clone(document), transport)?;
        let controller = Rc::new(DocumentController::with_config(resource, config));
        self.entries.borrow_mut().push(Entry {
            document: Rc::downgrade(document),
            controller: Rc::downgrade(&controller),
        });

        tracing::debug!("Attached controller for {}", url);
        Ok(controller)
    }

    /// The live controller for `document`, if any
    pub fn controller_for(&self, document: &SharedDocument) -> Option<Rc<DocumentController<T>>> {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| std::ptr::eq(entry.document.as_ptr(), Rc::as_ptr(document)))
            .find_map(|entry| entry.controller.upgrade())
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.prune();
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prune(&self) {
        self.entries.borrow_mut().retain(Entry::is_alive);
    }
}

impl<T: Transport + 'static> Default for ControllerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pl_dom::Document;
    use pl_net::{NetError, Request, Response};

    struct Offline;

    impl Transport for Offline {
        async fn send(&self, _request: Request) -> std::result::Result<Response, NetError> {
            Err(NetError::Network("offline".to_string()))
        }
    }

    const URL: &str = "https://example.com/";

    #[test]
    fn test_attach_returns_existing_controller() {
        let registry = ControllerRegistry::new();
        let document = Document::new(URL).into_shared();
        let transport = Rc::new(Offline);

        let first = registry
            .attach(URL, &document, Rc::clone(&transport), Config::default())
            .unwrap();
        let second = registry
            .attach(URL, &document, transport, Config::default())
            .unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_document_does_not_keep_controller_alive() {
        let registry = ControllerRegistry::new();
        let document = Document::new(URL).into_shared();

        let controller = registry
            .attach(URL, &document, Rc::new(Offline), Config::default())
            .unwrap();
        let weak = Rc::downgrade(&controller);
        drop(controller);

        assert!(weak.upgrade().is_none());
        assert!(registry.controller_for(&document).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_separate_documents_get_separate_controllers() {
        let registry = ControllerRegistry::new();
        let a = Document::new(URL).into_shared();
        let b = Document::new(URL).into_shared();
        let transport = Rc::new(Offline);

        let first = registry.attach(URL, &a, Rc::clone(&transport), Config::default()).unwrap();
        let second = registry.attach(URL, &b, transport, Config::default()).unwrap();

        assert!(!Rc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 2);
    }
}
