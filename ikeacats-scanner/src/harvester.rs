use crate::detail::{self, DEFAULT_PAGE_URL_TEMPLATE};
use crate::download::{self, DownloadCallback};
use crate::error::Result;
use crate::index::{self, DEFAULT_INDEX_URL};
use crate::model::{Catalogue, DownloadedFile, Listing};
use crate::throttle::Throttle;
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Called with the zero-based position and id of each listing before its
/// detail page is fetched.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Walks the three stages against one HTTP client: index, detail pages,
/// downloads. Every per-item step is followed by a throttle wait.
pub struct Harvester {
    client: Client,
    index_url: String,
    page_url_template: String,
    throttle: Throttle,
    progress_callback: Option<ProgressCallback>,
    download_callback: Option<DownloadCallback>,
}

impl Harvester {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ikeacats/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            index_url: DEFAULT_INDEX_URL.to_string(),
            page_url_template: DEFAULT_PAGE_URL_TEMPLATE.to_string(),
            throttle: Throttle::default(),
            progress_callback: None,
            download_callback: None,
        })
    }

    pub fn with_index_url(mut self, url: impl Into<String>) -> Self {
        self.index_url = url.into();
        self
    }

    pub fn with_page_url_template(mut self, template: impl Into<String>) -> Self {
        self.page_url_template = template.into();
        self
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_download_callback(mut self, callback: DownloadCallback) -> Self {
        self.download_callback = Some(callback);
        self
    }

    pub fn throttle(&self) -> Throttle {
        self.throttle
    }

    /// Fetch the index document and read its listings.
    pub async fn fetch_listings(&self) -> Result<Vec<Listing>> {
        info!("Fetching catalogue index from {}", self.index_url);
        let body = self
            .client
            .get(&self.index_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let listings = index::parse_index(&body)?;
        info!("Index lists {} catalogues", listings.len());
        Ok(listings)
    }

    /// Resolve one listing's title and PDF URL from its detail page. The
    /// throttle is awaited whether or not extraction succeeded.
    pub async fn resolve_catalogue(&self, listing: &Listing) -> Result<Catalogue> {
        let result = self.fetch_catalogue(listing).await;
        if let Err(ref e) = result {
            warn!("Could not resolve catalogue {}: {}", listing.id, e);
        }
        self.throttle.wait().await;
        result
    }

    async fn fetch_catalogue(&self, listing: &Listing) -> Result<Catalogue> {
        let url = detail::page_url(&self.page_url_template, &listing.id)?;
        debug!("Fetching {}", url);

        let html = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let catalogue = detail::extract_catalogue(&html, &url)?;
        debug!("Listing {} resolved to {:?}", listing.id, catalogue);
        Ok(catalogue)
    }

    /// Resolve every listing in order. The first failure ends the stage.
    pub async fn resolve_catalogues(&self, listings: &[Listing]) -> Result<Vec<Catalogue>> {
        let mut catalogues = Vec::with_capacity(listings.len());
        for (idx, listing) in listings.iter().enumerate() {
            if let Some(ref callback) = self.progress_callback {
                callback(idx, listing.id.clone());
            }
            catalogues.push(self.resolve_catalogue(listing).await?);
        }
        Ok(catalogues)
    }

    /// Download one catalogue into `target`, then wait out the throttle.
    pub async fn download(&self, catalogue: &Catalogue, target: &Path) -> Result<DownloadedFile> {
        let result = download::download_to(
            &self.client,
            catalogue,
            target,
            self.download_callback.as_ref(),
        )
        .await;
        if let Err(ref e) = result {
            warn!("Download of {} failed: {}", catalogue.url, e);
        }
        self.throttle.wait().await;
        result
    }

    /// Download every catalogue in order. The first failure ends the stage.
    pub async fn download_all(
        &self,
        catalogues: &[Catalogue],
        target: &Path,
    ) -> Result<Vec<DownloadedFile>> {
        let mut files = Vec::with_capacity(catalogues.len());
        for catalogue in catalogues {
            files.push(self.download(catalogue, target).await?);
        }
        Ok(files)
    }
}
