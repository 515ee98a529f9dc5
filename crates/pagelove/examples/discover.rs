//! Example: discover the capabilities of a remote document
//!
//! Run with `RUST_LOG=debug cargo run --example discover -- <url>`.

use std::rc::Rc;

use anyhow::Context;
use pagelove::net::HttpTransport;
use pagelove::{DocumentController, ResourceDocument};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let url = std::env::args()
        .nth(1)
        .context("usage: discover <url>")?;

    let transport = Rc::new(HttpTransport::new()?);
    let resource = ResourceDocument::new(&url, transport)?;
    let controller = DocumentController::new(resource);

    println!("pagelove v{}", pagelove::VERSION);

    smol::block_on(async {
        let advertisements = controller.discover().await?;
        let document = controller.document().await?;

        for advertisement in &advertisements {
            let node = document.borrow().query_selector(&advertisement.selector).ok().flatten();
            match node {
                Some(node) => {
                    let methods: Vec<String> = controller
                        .allowed_methods(node)
                        .iter()
                        .map(ToString::to_string)
                        .collect();
                    println!("{:<40} {}", advertisement.selector, methods.join(", "));
                }
                None => println!("{:<40} (no matching node yet)", advertisement.selector),
            }
        }

        Ok::<_, anyhow::Error>(())
    })
}
