pub mod assemble;
pub mod engine;
pub mod fetch;
pub mod layout;
pub mod normalize;
pub mod pipeline;
pub mod pool;
pub mod resolver;

pub use crate::domain::model::{
    ArtworkCache, ArtworkLocator, CanonicalKey, CardRequest, Document, Page, PageSize, Placement,
    ResolvedArtwork, Slot,
};
pub use crate::domain::ports::{LayoutStrategy, PageCanvas, Pipeline, Resolver, Storage};
pub use crate::utils::error::Result;
