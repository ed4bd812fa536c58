use anyhow::Context;
use card_sheet::config::Command;
use card_sheet::core::Storage;
use card_sheet::utils::error::ErrorSeverity;
use card_sheet::utils::logger;
use card_sheet::{
    CardRequest, CliConfig, LocalStorage, SheetConfig, SheetEngine, SheetError, SheetPipeline,
    TracingObserver,
};
use clap::Parser;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting card-sheet CLI");

    let result = match load_config(&cli) {
        Ok(config) => match &cli.command {
            Command::Generate { .. } => generate(&cli, &config).await,
            Command::Inspect { .. } => inspect(&cli, &config).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ card-sheet failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        let payload =
            serde_json::to_string(&e.payload()).context("cannot serialize error payload")?;
        println!("{}", payload);

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low | ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

fn load_config(cli: &CliConfig) -> Result<SheetConfig, SheetError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            SheetConfig::from_file(path)?
        }
        None => SheetConfig::default(),
    };

    // 應用命令列覆蓋設定
    cli.apply_overrides(&mut config);
    tracing::debug!("Effective config: {:?}", config);
    Ok(config)
}

async fn read_requests(input: &str) -> Result<Vec<CardRequest>, SheetError> {
    let body = if input == "-" {
        let mut buffer = Vec::new();
        tokio::io::stdin().read_to_end(&mut buffer).await?;
        buffer
    } else {
        LocalStorage::new(".").read_file(input).await?
    };

    CardRequest::parse_list(&body)
}

async fn generate(cli: &CliConfig, config: &SheetConfig) -> Result<(), SheetError> {
    let requests = read_requests(cli.input()).await?;
    let pipeline = SheetPipeline::from_config(config, Arc::new(TracingObserver))?;
    let filename = pipeline.output().filename.clone();
    let engine = SheetEngine::new(pipeline).with_filename(filename);

    let output = engine.run(&requests).await?;

    let storage = LocalStorage::new(&config.output.directory);
    storage.write_file(&output.filename, &output.bytes).await?;
    let path = storage.resolve(&output.filename);

    println!("✅ Card sheet generated!");
    println!(
        "📄 {} pages, {} cards ({})",
        output.pages, output.placements, output.media_type
    );
    if !output.unresolved.is_empty() {
        let skipped: Vec<&str> = output.unresolved.iter().map(|k| k.as_str()).collect();
        println!("⚠️ Skipped: {}", skipped.join(", "));
    }
    println!("📁 Output saved to: {}", path.display());
    Ok(())
}

async fn inspect(cli: &CliConfig, config: &SheetConfig) -> Result<(), SheetError> {
    let requests = read_requests(cli.input()).await?;
    let pipeline = SheetPipeline::from_config(config, Arc::new(TracingObserver))?;

    let reports = pipeline.inspect(&requests).await;
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}
