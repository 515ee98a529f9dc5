//! Document resources
//!
//! A document resource is either a live tree the caller already holds or
//! a remote document fetched with GET the first time it is needed.

use std::rc::Rc;

use pl_dom::SharedDocument;
use pl_html::HtmlParser;
use pl_net::{NetError, Request, Transport};
use smol::lock::OnceCell;
use url::Url;

use crate::{PageloveError, Result};

/// The document behind a URL
pub struct ResourceDocument<T> {
    url: Url,
    transport: Rc<T>,
    live: Option<SharedDocument>,
    fetched: OnceCell<SharedDocument>,
}

impl<T: Transport> ResourceDocument<T> {
    /// A remote document, fetched on first access
    pub fn new(url: &str, transport: Rc<T>) -> Result<Self> {
        Ok(Self {
            url: parse_url(url)?,
            transport,
            live: None,
            fetched: OnceCell::new(),
        })
    }

    /// A document already held in memory
    pub fn live(url: &str, document: SharedDocument, transport: Rc<T>) -> Result<Self> {
        Ok(Self {
            url: parse_url(url)?,
            transport,
            live: Some(document),
            fetched: OnceCell::new(),
        })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn transport(&self) -> &Rc<T> {
        &self.transport
    }

    /// The document if it is live or has already been fetched
    pub fn attached(&self) -> Option<SharedDocument> {
        self.live
            .as_ref()
            .or_else(|| self.fetched.get())
            .map(Rc::clone)
    }

    /// The backing document, fetching and parsing it at most once
    pub async fn document(&self) -> Result<SharedDocument> {
        if let Some(document) = &self.live {
            return Ok(Rc::clone(document));
        }

        let document = self
            .fetched
            .get_or_try_init(|| async {
                tracing::debug!("Fetching document {}", self.url);
                let response = self.transport.send(Request::get(self.url.as_str())).await?;
                if !response.ok() {
                    tracing::warn!("GET {} returned status {}", self.url, response.status());
                }

                let html = response.text()?;
                let document = HtmlParser::new().parse_with_url(&html, self.url.as_str())?;
                Ok::<_, PageloveError>(document.into_shared())
            })
            .await?;

        Ok(Rc::clone(document))
    }
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| NetError::InvalidUrl(format!("{}: {}", url, e)).into())
}
