use crate::adapters::pdf::PdfCanvas;
use crate::config::toml_config::{OutputConfig, SheetConfig};
use crate::core::assemble::PageAssembler;
use crate::core::fetch::{ArtworkFetcher, TargetResolution};
use crate::core::layout::{layout, GridLayout};
use crate::core::normalize::normalize;
use crate::core::pool::WorkerPool;
use crate::core::resolver::CatalogResolver;
use crate::core::{
    ArtworkCache, CanonicalKey, CardRequest, Document, LayoutStrategy, Pipeline, Resolver,
};
use crate::domain::model::ResolutionReport;
use crate::utils::error::Result;
use crate::utils::observer::{PipelineEvent, PipelineObserver};
use crate::utils::validation::Validate;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

const USER_AGENT: &str = concat!("card-sheet/", env!("CARGO_PKG_VERSION"));

/// Fetch → layout → PDF, wired from a [`SheetConfig`].
pub struct SheetPipeline<R: Resolver + 'static, L: LayoutStrategy> {
    resolver: Arc<R>,
    fetcher: ArtworkFetcher<R>,
    pool: WorkerPool,
    layout: L,
    assembler: PageAssembler,
    output: OutputConfig,
    observer: Arc<dyn PipelineObserver>,
}

impl SheetPipeline<CatalogResolver, GridLayout> {
    /// Validates `config` and builds the HTTP catalog resolver and grid it
    /// describes.
    pub fn from_config(
        config: &SheetConfig,
        observer: Arc<dyn PipelineObserver>,
    ) -> Result<Self> {
        config.validate()?;

        let client = Client::builder().user_agent(USER_AGENT).build()?;
        let resolver = CatalogResolver::new(client.clone(), config.catalog.clone());
        let grid = GridLayout::from(&config.layout);
        tracing::debug!(
            "Catalog {} ({:?} lookups), {}x{} grid, {} workers",
            config.catalog.base_url,
            config.catalog.lookup_style,
            grid.rows(),
            grid.cols(),
            config.fetch.concurrency
        );

        Ok(Self::with_resolver(config, resolver, client, grid, observer))
    }
}

impl<R: Resolver + 'static, L: LayoutStrategy> SheetPipeline<R, L> {
    pub fn with_resolver(
        config: &SheetConfig,
        resolver: R,
        client: Client,
        layout: L,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        let (card_width, card_height) = layout.cell_size();
        let target = TargetResolution::for_card(card_width, card_height, config.fetch.print_dpi);
        let resolver = Arc::new(resolver);
        let pool = WorkerPool::new(config.fetch.concurrency);

        let fetcher = ArtworkFetcher::new(
            resolver.clone(),
            client,
            pool.clone(),
            Duration::from_secs(config.fetch.timeout_seconds),
            target,
            observer.clone(),
        );

        Self {
            resolver,
            fetcher,
            pool,
            layout,
            assembler: PageAssembler::new(observer.clone()),
            output: config.output.clone(),
            observer,
        }
    }

    pub fn output(&self) -> &OutputConfig {
        &self.output
    }

    /// Resolves every unique key once and reports, per entry and in input
    /// order, what it normalized to and where its artwork lives. Nothing
    /// is downloaded.
    pub async fn inspect(&self, entries: &[CardRequest]) -> Vec<ResolutionReport> {
        let keys: Vec<CanonicalKey> = entries
            .iter()
            .map(|entry| normalize(&entry.name))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let jobs = keys.iter().cloned().map(|key| {
            let resolver = self.resolver.clone();
            let observer = self.observer.clone();
            async move {
                observer.on_event(&PipelineEvent::LookupAttempted { key: key.clone() });
                resolver.resolve(&key).await
            }
        });
        let outcomes = self.pool.run_all(jobs).await;

        let resolved: HashMap<CanonicalKey, Option<String>> = keys
            .into_iter()
            .zip(outcomes)
            .map(|(key, outcome)| {
                let url = match outcome {
                    Ok(Ok(locator)) => Some(locator.url),
                    Ok(Err(e)) => {
                        tracing::debug!("🔎 '{}' unresolved: {}", key, e);
                        None
                    }
                    Err(e) => {
                        tracing::warn!("❌ Lookup task for '{}' aborted: {}", key, e);
                        None
                    }
                };
                (key, url)
            })
            .collect();

        entries
            .iter()
            .map(|entry| {
                let key = normalize(&entry.name);
                ResolutionReport {
                    name: entry.name.clone(),
                    resolved_url: resolved.get(&key).cloned().flatten(),
                    normalized_key: key,
                }
            })
            .collect()
    }
}

#[async_trait]
impl<R: Resolver + 'static, L: LayoutStrategy> Pipeline for SheetPipeline<R, L> {
    async fn extract(&self, keys: BTreeSet<CanonicalKey>) -> Result<ArtworkCache> {
        Ok(self.fetcher.fetch_all(keys).await)
    }

    async fn transform(&self, requests: &[CardRequest], cache: &ArtworkCache) -> Result<Document> {
        Ok(layout(requests, cache, &self.layout))
    }

    async fn load(&self, document: &Document, cache: &ArtworkCache) -> Result<Vec<u8>> {
        let canvas = PdfCanvas::new(
            document.page_size,
            self.output.jpeg_quality,
            self.output.title.clone(),
        );
        self.assembler.assemble(canvas, document, cache)
    }
}
