//! DOM Events
//!
//! Capability and completion events raised by the binding layer, and
//! bubbling dispatch over a shared document.

use std::rc::Rc;

use crate::{NodeId, SharedDocument};

/// DOM event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomEventType {
    /// A node matched an advertised capability
    Capability,
    /// A capability operation's HTTP exchange settled
    MethodCompleted,
}

impl DomEventType {
    /// Wire-compatible event name
    pub fn as_str(&self) -> &'static str {
        match self {
            DomEventType::Capability => "PLCapability",
            DomEventType::MethodCompleted => "PLMethodCompleted",
        }
    }
}

/// Payload of a capability event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityDetail {
    pub selector: String,
    pub allow: Vec<String>,
}

/// Payload of a completion event: the method and the raw response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionDetail {
    pub method: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Rc<[u8]>,
}

impl CompletionDetail {
    /// Check if the response status is 2xx
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The response body, if it is valid UTF-8
    pub fn body_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDetail {
    Capability(CapabilityDetail),
    Completion(CompletionDetail),
}

/// DOM event
#[derive(Debug, Clone)]
pub struct DomEvent {
    pub event_type: DomEventType,
    pub target: NodeId,
    pub current_target: Option<NodeId>,
    pub detail: EventDetail,
    pub bubbles: bool,
    pub cancelable: bool,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl DomEvent {
    /// Create a capability event
    pub fn capability(target: NodeId, selector: &str, allow: Vec<String>) -> Self {
        Self {
            event_type: DomEventType::Capability,
            target,
            current_target: None,
            detail: EventDetail::Capability(CapabilityDetail {
                selector: selector.to_string(),
                allow,
            }),
            bubbles: true,
            cancelable: true,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// Create a method-completed event
    pub fn method_completed(target: NodeId, detail: CompletionDetail) -> Self {
        Self {
            event_type: DomEventType::MethodCompleted,
            target,
            current_target: None,
            detail: EventDetail::Completion(detail),
            bubbles: true,
            cancelable: true,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn capability_detail(&self) -> Option<&CapabilityDetail> {
        match &self.detail {
            EventDetail::Capability(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn completion_detail(&self) -> Option<&CompletionDetail> {
        match &self.detail {
            EventDetail::Completion(detail) => Some(detail),
            _ => None,
        }
    }

    /// Prevent default action
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    /// Stop propagation
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Check if default was prevented
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Event listener callback
pub type EventListener = Rc<dyn Fn(&mut DomEvent)>;

/// Event dispatcher trait
pub trait EventDispatcher {
    /// Dispatch an event; returns false if a listener prevented the default
    fn dispatch_event(&self, event: DomEvent) -> bool;
}

impl EventDispatcher for SharedDocument {
    fn dispatch_event(&self, mut event: DomEvent) -> bool {
        let path: Vec<(NodeId, Vec<EventListener>)> = {
            let doc = self.borrow();
            let mut path = Vec::new();
            let mut current = Some(event.target);
            while let Some(node) = current {
                path.push((node, doc.listeners(node, event.event_type)));
                if !event.bubbles {
                    break;
                }
                current = doc.tree().parent(node);
            }
            path
        };

        tracing::trace!(
            "Dispatching {} on {:?} through {} nodes",
            event.event_type.as_str(),
            event.target,
            path.len()
        );

        for (node, listeners) in path {
            event.current_target = Some(node);
            for listener in listeners {
                listener(&mut event);
            }
            if event.propagation_stopped {
                break;
            }
        }
        event.current_target = None;

        !event.default_prevented
    }
}
