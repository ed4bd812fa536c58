pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};
use toml_config::LayoutConfig;
#[cfg(feature = "cli")]
use toml_config::SheetConfig;

/// Layout preset selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(ValueEnum))]
pub enum LayoutPreset {
    /// 3 × 3 standard cards per A4 page
    Grid,
    /// One large card per A4 page
    FullPage,
}

impl LayoutPreset {
    pub fn layout_config(self) -> LayoutConfig {
        match self {
            LayoutPreset::Grid => LayoutConfig::default(),
            LayoutPreset::FullPage => LayoutConfig::full_page(),
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Parser)]
#[command(name = "card-sheet")]
#[command(about = "Build printable card sheets from a list of card names")]
#[command(version)]
pub struct CliConfig {
    /// TOML configuration file
    #[arg(long, short, global = true)]
    pub config: Option<String>,

    #[arg(long, short, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve, fetch and lay out every card, then write the PDF
    Generate {
        /// JSON card list (`-` for stdin)
        #[arg(long, short)]
        input: String,

        /// Output directory (overrides `output.directory`)
        #[arg(long, short)]
        output: Option<String>,

        /// Output file name (overrides `output.filename`)
        #[arg(long)]
        filename: Option<String>,

        #[arg(long, value_enum)]
        layout: Option<LayoutPreset>,

        /// Concurrent downloads (overrides `fetch.concurrency`)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Catalog base URL (overrides `catalog.base_url`)
        #[arg(long)]
        catalog_url: Option<String>,
    },
    /// Show how each name normalizes and which artwork it resolves to
    Inspect {
        /// JSON card list (`-` for stdin)
        #[arg(long, short)]
        input: String,

        #[arg(long)]
        catalog_url: Option<String>,
    },
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn input(&self) -> &str {
        match &self.command {
            Command::Generate { input, .. } | Command::Inspect { input, .. } => input,
        }
    }

    /// 命令列參數覆蓋設定檔
    pub fn apply_overrides(&self, config: &mut SheetConfig) {
        match &self.command {
            Command::Generate {
                output,
                filename,
                layout,
                concurrency,
                catalog_url,
                ..
            } => {
                if let Some(directory) = output {
                    config.output.directory = directory.clone();
                }
                if let Some(filename) = filename {
                    config.output.filename = filename.clone();
                }
                if let Some(preset) = layout {
                    config.layout = preset.layout_config();
                }
                if let Some(concurrency) = concurrency {
                    config.fetch.concurrency = *concurrency;
                }
                if let Some(url) = catalog_url {
                    config.catalog.base_url = url.clone();
                }
            }
            Command::Inspect { catalog_url, .. } => {
                if let Some(url) = catalog_url {
                    config.catalog.base_url = url.clone();
                }
            }
        }
    }
}
