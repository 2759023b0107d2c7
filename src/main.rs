use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use epg_merger::{
    config::{Config, PolicyKind},
    guide::GuideMerger,
    ingestor::{EpgIngestor, GuideLocation},
    utils::xmltv_writer::write_merged_guide,
};

#[derive(Parser)]
#[command(name = "epg-merger")]
#[command(version)]
#[command(about = "Merges a remote XMLTV guide with locally scheduled filler programmes")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CONFIG_FILE", default_value = "config.toml")]
    config: String,

    /// Primary guide URL or path (overrides config file)
    #[arg(short = 'P', long, value_name = "URL|PATH")]
    primary: Option<String>,

    /// Template guide path
    #[arg(short, long, value_name = "PATH")]
    template: Option<String>,

    /// Supplementary guide URL or path
    #[arg(short, long, value_name = "URL|PATH")]
    supplementary: Option<String>,

    /// Output file
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Number of days to generate
    #[arg(short = 'n', long)]
    days: Option<u32>,

    /// Block length for the tile policy
    #[arg(short, long, value_name = "MINUTES")]
    block_minutes: Option<u32>,

    /// Expansion policy
    #[arg(long, value_enum)]
    policy: Option<PolicyKind>,

    /// First generated day, defaults to today in the configured timezone
    #[arg(long, value_name = "YYYY-MM-DD")]
    reference_day: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("epg_merger={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting EPG merger v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    // Override config with CLI arguments
    if let Some(primary) = cli.primary {
        config.sources.primary = Some(primary);
    }
    if let Some(template) = cli.template {
        config.sources.template = template;
    }
    if let Some(supplementary) = cli.supplementary {
        config.sources.supplementary = Some(supplementary);
    }
    if let Some(output) = cli.output {
        config.sources.output = output;
    }
    if let Some(days) = cli.days {
        config.schedule.days = days;
    }
    if let Some(block_minutes) = cli.block_minutes {
        config.schedule.block_minutes = block_minutes;
    }
    if let Some(policy) = cli.policy {
        config.schedule.policy = policy;
    }
    if let Some(reference_day) = cli.reference_day {
        config.schedule.reference_day = Some(reference_day);
    }

    config.validate()?;
    let merge_config = config.merge_config(Utc::now())?;

    let ingestor = EpgIngestor::new(&config.fetch)?;

    let primary_location = GuideLocation::parse(config.sources.primary.as_deref().unwrap_or_default());
    let primary = ingestor.load_document(&primary_location, "primary").await?;

    let template_location = GuideLocation::parse(&config.sources.template);
    let template = ingestor.load_document(&template_location, "template").await?;

    let supplementary_location = config
        .sources
        .supplementary
        .as_deref()
        .map(GuideLocation::parse);
    let supplementary = ingestor
        .load_optional_document(supplementary_location.as_ref(), "supplementary")
        .await;
    if supplementary_location.is_some() && supplementary.is_none() {
        warn!("Continuing without the supplementary guide");
    }

    let outcome = GuideMerger::new(merge_config).merge(&primary, &template, supplementary.as_ref())?;

    let written = write_merged_guide(&config.sources.output, &outcome.guide).await?;
    info!(
        "Merged EPG saved to '{}' ({} bytes): {} channels, {} programmes, {} day(s) of scheduled programming",
        config.sources.output.display(),
        written,
        outcome.guide.channels.len(),
        outcome.guide.programmes.len(),
        config.schedule.days
    );

    Ok(())
}
