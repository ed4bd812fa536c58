use crate::core::pool::WorkerPool;
use crate::core::{ArtworkCache, ArtworkLocator, CanonicalKey, ResolvedArtwork, Resolver};
use crate::utils::error::{Result, SheetError};
use crate::utils::observer::{FailureKind, PipelineEvent, PipelineObserver};
use image::imageops::{self, FilterType};
use reqwest::Client;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

const MM_PER_INCH: f64 = 25.4;

/// Pixel size every artwork is resized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetResolution {
    pub width: u32,
    pub height: u32,
}

impl TargetResolution {
    /// Pixel size of a `width_mm` × `height_mm` card printed at `dpi`.
    pub fn for_card(width_mm: f64, height_mm: f64, dpi: u32) -> Self {
        let px = |mm: f64| ((mm / MM_PER_INCH * f64::from(dpi)).round() as u32).max(1);
        Self {
            width: px(width_mm),
            height: px(height_mm),
        }
    }
}

/// Resolves, downloads and decodes every requested key exactly once.
pub struct ArtworkFetcher<R: Resolver + 'static> {
    resolver: Arc<R>,
    client: Client,
    pool: WorkerPool,
    timeout: Duration,
    target: TargetResolution,
    observer: Arc<dyn PipelineObserver>,
}

impl<R: Resolver + 'static> ArtworkFetcher<R> {
    pub fn new(
        resolver: Arc<R>,
        client: Client,
        pool: WorkerPool,
        timeout: Duration,
        target: TargetResolution,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        Self {
            resolver,
            client,
            pool,
            timeout,
            target,
            observer,
        }
    }

    pub fn target(&self) -> TargetResolution {
        self.target
    }

    /// Fetches every key under the pool's concurrency limit. Keys that
    /// fail at any step are left out of the returned cache; the call
    /// returns only once all of them have settled.
    pub async fn fetch_all(&self, keys: BTreeSet<CanonicalKey>) -> ArtworkCache {
        let keys: Vec<CanonicalKey> = keys.into_iter().collect();

        tracing::info!(
            "🚀 Fetching {} unique artworks ({} workers, {}x{} px)",
            keys.len(),
            self.pool.limit(),
            self.target.width,
            self.target.height
        );

        let jobs = keys.iter().cloned().map(|key| {
            let resolver = self.resolver.clone();
            let client = self.client.clone();
            let observer = self.observer.clone();
            let timeout = self.timeout;
            let target = self.target;
            async move {
                fetch_one(
                    resolver.as_ref(),
                    &client,
                    &key,
                    timeout,
                    target,
                    observer.as_ref(),
                )
                .await
            }
        });

        let outcomes = self.pool.run_all(jobs).await;

        let mut cache = ArtworkCache::new(self.observer.clone());
        for (key, outcome) in keys.into_iter().zip(outcomes) {
            match outcome {
                Ok(Ok(artwork)) => {
                    self.observer.on_event(&PipelineEvent::FetchSucceeded {
                        key,
                        width: artwork.width(),
                        height: artwork.height(),
                    });
                    cache.insert(artwork);
                }
                Ok(Err(e)) => {
                    self.observer.on_event(&PipelineEvent::FetchFailed {
                        key,
                        kind: failure_kind(&e),
                        reason: e.to_string(),
                    });
                }
                Err(join_error) => {
                    self.observer.on_event(&PipelineEvent::FetchFailed {
                        key,
                        kind: FailureKind::Fetch,
                        reason: format!("fetch task aborted: {}", join_error),
                    });
                }
            }
        }

        tracing::info!("📊 Fetched {} artworks", cache.len());
        cache
    }
}

fn failure_kind(error: &SheetError) -> FailureKind {
    match error {
        SheetError::NotFound { .. } => FailureKind::NotFound,
        SheetError::LookupError { .. } => FailureKind::Lookup,
        _ => FailureKind::Fetch,
    }
}

async fn fetch_one<R: Resolver + ?Sized>(
    resolver: &R,
    client: &Client,
    key: &CanonicalKey,
    timeout: Duration,
    target: TargetResolution,
    observer: &dyn PipelineObserver,
) -> Result<ResolvedArtwork> {
    observer.on_event(&PipelineEvent::LookupAttempted { key: key.clone() });

    let locator = resolver.resolve(key).await?;
    let bytes = download(client, key, &locator, timeout).await?;

    // 解碼與縮放是 CPU 工作，丟到 blocking 執行緒
    let owned_key = key.clone();
    tokio::task::spawn_blocking(move || decode_artwork(owned_key, bytes, target))
        .await
        .map_err(|e| SheetError::FetchError {
            key: key.to_string(),
            message: format!("decode task failed: {}", e),
        })?
}

async fn download(
    client: &Client,
    key: &CanonicalKey,
    locator: &ArtworkLocator,
    timeout: Duration,
) -> Result<impl AsRef<[u8]> + Send + 'static> {
    let fail = |message: String| SheetError::FetchError {
        key: key.to_string(),
        message,
    };

    tracing::debug!("Downloading artwork for '{}' from {}", key, locator.url);

    let response = client
        .get(&locator.url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| fail(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fail(format!("image host responded with {}", status)));
    }

    response.bytes().await.map_err(|e| fail(e.to_string()))
}

/// Decodes raw image bytes and stretches them to `target`.
pub fn decode_artwork(
    key: CanonicalKey,
    bytes: impl AsRef<[u8]>,
    target: TargetResolution,
) -> Result<ResolvedArtwork> {
    let decoded = image::load_from_memory(bytes.as_ref()).map_err(|e| SheetError::FetchError {
        key: key.to_string(),
        message: format!("cannot decode artwork: {}", e),
    })?;

    // 固定長寬比：不同比例的原圖直接拉伸，不留白邊
    let rgb = decoded.to_rgb8();
    let image = imageops::resize(&rgb, target.width, target.height, FilterType::Lanczos3);

    Ok(ResolvedArtwork { key, image })
}
