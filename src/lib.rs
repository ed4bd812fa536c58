pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(test)]
mod test_helpers;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::SheetConfig, LayoutPreset};

pub use adapters::pdf::PdfCanvas;
pub use core::{
    engine::SheetEngine, layout::GridLayout, normalize::normalize, pipeline::SheetPipeline,
    resolver::CatalogResolver,
};
pub use domain::model::{CardRequest, ResolutionReport, SheetOutput};
pub use utils::error::{ErrorPayload, Result, SheetError};
pub use utils::observer::{PipelineEvent, PipelineObserver, RecordingObserver, TracingObserver};
