//! Spreadsheet discovery.
//!
//! Walks the paginated statistics listing and collects the download link of
//! every published spreadsheet, in listing order (newest first).

use crate::{DiscoveryError, FeedError, Transport};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Statistics page listing the reference-rate spreadsheets.
pub const DEFAULT_LISTING_URL: &str =
    "https://www.bcv.org.ve/estadisticas/tipo-cambio-de-referencia-smc";

const MAIN_BLOCK: &str = "#block-system-main";
const FILE_ICON: &str = ".file-icon";
const PAGINATION: &str = ".pagination";
const NEXT_LINK: &str = ".next a";

/// Links found on one listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    /// Spreadsheet download URLs, in page order
    pub sheets: Vec<Url>,
    /// Next listing page, if any
    pub next: Option<Url>,
}

/// Parse a listing page fetched from `page_url`.
pub fn parse_listing(html: &str, page_url: &Url) -> Result<ListingPage, DiscoveryError> {
    let document = Html::parse_document(html);

    let main_block = document
        .select(&selector(MAIN_BLOCK)?)
        .next()
        .ok_or_else(|| DiscoveryError::MissingMainBlock(page_url.to_string()))?;

    let mut sheets = Vec::new();
    for icon in main_block.select(&selector(FILE_ICON)?) {
        let href = icon
            .parent()
            .and_then(ElementRef::wrap)
            .and_then(|link| link.value().attr("href"));
        if let Some(href) = href {
            sheets.push(resolve(page_url, href)?);
        }
    }

    let pagination = main_block
        .select(&selector(PAGINATION)?)
        .next()
        .ok_or_else(|| DiscoveryError::MissingPagination(page_url.to_string()))?;

    let next = pagination
        .select(&selector(NEXT_LINK)?)
        .next()
        .and_then(|anchor| anchor.value().attr("href"))
        .map(|href| resolve(page_url, href))
        .transpose()?;

    Ok(ListingPage { sheets, next })
}

fn selector(css: &str) -> Result<Selector, DiscoveryError> {
    Selector::parse(css).map_err(|e| DiscoveryError::Selector(e.to_string()))
}

fn resolve(page_url: &Url, href: &str) -> Result<Url, DiscoveryError> {
    page_url
        .join(href.trim())
        .map_err(|e| DiscoveryError::InvalidLink {
            page: page_url.to_string(),
            href: href.to_string(),
            reason: e.to_string(),
        })
}

/// Discovers spreadsheet download URLs by following the listing's pagination.
pub struct SheetLocator {
    transport: Arc<dyn Transport>,
    listing_url: Url,
}

impl SheetLocator {
    pub fn new(transport: Arc<dyn Transport>, listing_url: Url) -> Self {
        Self {
            transport,
            listing_url,
        }
    }

    /// Fetch every listing page and return all spreadsheet links in order.
    pub async fn discover(&self) -> Result<Vec<Url>, FeedError> {
        let mut urls = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(self.listing_url.clone());

        while let Some(page_url) = next {
            if !visited.insert(page_url.clone()) {
                return Err(DiscoveryError::PaginationLoop(page_url.to_string()).into());
            }

            let html = self.transport.fetch_text(&page_url).await?;
            let page = parse_listing(&html, &page_url)?;
            debug!(page = %page_url, sheets = page.sheets.len(), "Parsed listing page");

            urls.extend(page.sheets);
            next = page.next;
        }

        info!(pages = visited.len(), sheets = urls.len(), "Discovered rate spreadsheets");
        Ok(urls)
    }
}
