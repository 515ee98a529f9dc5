//! Pagelove
//!
//! Discovers which HTTP operations a server permits on the parts of a
//! document and binds them as capabilities on the matching nodes.
//!
//! # Example
//! ```rust,ignore
//! use std::rc::Rc;
//! use pagelove::{DocumentController, ResourceDocument, net::HttpTransport};
//!
//! let transport = Rc::new(HttpTransport::new()?);
//! let resource = ResourceDocument::new("https://example.com/list", transport)?;
//! let controller = DocumentController::new(resource);
//!
//! smol::block_on(async {
//!     controller.discover().await?;
//!     let document = controller.document().await?;
//!     let item = document.borrow().get_element_by_id("item-1");
//!     if let Some(item) = item {
//!         controller.invoke(item, pagelove::net::Method::Delete, None).await?;
//!     }
//!     Ok::<_, pagelove::PageloveError>(())
//! })?;
//! ```

mod capabilities;
mod config;
mod controller;
mod discovery;
mod error;
mod handle;
mod registry;
mod resource;

pub use capabilities::{BoundOperation, CapabilityRegistry};
pub use config::Config;
pub use controller::{BindingState, DocumentController};
pub use discovery::{CapabilityAdvertisement, CapabilityDiscovery};
pub use error::{PageloveError, Result};
pub use handle::{Body, ResourceHandle};
pub use registry::ControllerRegistry;
pub use resource::ResourceDocument;

// Re-export sub-crates for advanced usage
pub use pl_dom as dom;
pub use pl_html as html;
pub use pl_net as net;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
