use crate::core::normalize::normalize;
use crate::core::{CanonicalKey, CardRequest, Pipeline};
use crate::domain::model::{SheetOutput, PDF_MEDIA_TYPE};
use crate::utils::error::{Result, SheetError};
use std::collections::BTreeSet;
use std::time::Instant;

pub const DEFAULT_FILENAME: &str = "carte.pdf";

/// Runs a [`Pipeline`] for one request: dedup, fetch barrier, layout,
/// assembly. The per-request artwork cache is dropped before `run`
/// returns, whichever way it returns.
pub struct SheetEngine<P: Pipeline> {
    pipeline: P,
    filename: String,
}

impl<P: Pipeline> SheetEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            filename: DEFAULT_FILENAME.to_string(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self, requests: &[CardRequest]) -> Result<SheetOutput> {
        if requests.is_empty() {
            return Err(SheetError::EmptyInput);
        }

        let started = Instant::now();
        let keys: BTreeSet<CanonicalKey> =
            requests.iter().map(|request| normalize(&request.name)).collect();
        let requested = keys.len();

        tracing::info!(
            "🚀 Starting sheet: {} entries, {} unique cards",
            requests.len(),
            requested
        );

        // Extract：所有下載結束後才會回來
        let cache = self.pipeline.extract(keys.clone()).await?;
        tracing::info!(
            "📥 Fetch phase settled in {:.2?}: {}/{} cards resolved",
            started.elapsed(),
            cache.len(),
            requested
        );

        if cache.is_empty() {
            return Err(SheetError::NoResolutions { requested });
        }

        let unresolved: Vec<CanonicalKey> = keys
            .into_iter()
            .filter(|key| !cache.contains(key))
            .collect();
        if !unresolved.is_empty() {
            tracing::warn!("⚠️ {} cards skipped: {:?}", unresolved.len(), unresolved);
        }

        // Transform
        let document = self.pipeline.transform(requests, &cache).await?;
        if document.is_empty() {
            return Err(SheetError::NoResolutions { requested });
        }
        tracing::info!(
            "🔄 Laid out {} cards on {} pages",
            document.placement_count(),
            document.page_count()
        );

        // Load
        let bytes = self.pipeline.load(&document, &cache).await?;
        drop(cache);

        tracing::info!(
            "✅ Sheet ready: {} ({} bytes) in {:.2?}",
            self.filename,
            bytes.len(),
            started.elapsed()
        );

        Ok(SheetOutput {
            bytes,
            filename: self.filename.clone(),
            media_type: PDF_MEDIA_TYPE,
            pages: document.page_count(),
            placements: document.placement_count(),
            unresolved,
        })
    }
}
