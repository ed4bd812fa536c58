use crate::domain::model::{
    ArtworkCache, ArtworkLocator, CanonicalKey, CardRequest, Document, PageSize, ResolvedArtwork,
    Slot,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Maps a canonical key to the location of its artwork.
///
/// Implementations perform exactly one lookup and never retry. A missing
/// card is [`SheetError::NotFound`](crate::SheetError::NotFound); a transport
/// failure or timeout is [`SheetError::LookupError`](crate::SheetError::LookupError).
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, key: &CanonicalKey) -> Result<ArtworkLocator>;
}

/// Decides where the i-th surviving card lands.
pub trait LayoutStrategy: Send + Sync {
    fn page_size(&self) -> PageSize;

    /// Card size in millimetres, `(width, height)`.
    fn cell_size(&self) -> (f64, f64);

    /// Number of slots on one page.
    fn capacity(&self) -> usize;

    fn slot(&self, index: usize) -> Slot;
}

/// Paginated drawing surface that turns placed images into bytes.
/// Rectangles are in millimetres from the top-left page corner.
pub trait PageCanvas {
    fn begin_page(&mut self, index: usize) -> Result<()>;
    fn draw_image(
        &mut self,
        artwork: &ResolvedArtwork,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()>;
    fn finish(self) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Fetch phase: one resolve + download per key, settled before returning.
    async fn extract(&self, keys: BTreeSet<CanonicalKey>) -> Result<ArtworkCache>;
    async fn transform(&self, requests: &[CardRequest], cache: &ArtworkCache) -> Result<Document>;
    async fn load(&self, document: &Document, cache: &ArtworkCache) -> Result<Vec<u8>>;
}
