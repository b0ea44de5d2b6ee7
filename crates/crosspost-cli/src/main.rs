//! Crosspost CLI — publish one video to YouTube, TikTok, and Instagram.
//!
//! Credentials are read as `{platform}_token.json` from
//! CROSSPOST_CREDENTIALS_DIR (default: the working directory). Tuning knobs
//! live in CROSSPOST_* environment variables; see `PublishConfig`.

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crosspost_cli::{content_type_for, init_tracing};
use crosspost_publish::{
    FileSource, Platform, PlatformTarget, Privacy, PublishConfig, Publisher, PublishRequest,
};

#[derive(Parser)]
#[command(name = "crosspost", about = "Publish a video to multiple platforms")]
struct Cli {
    /// Path to the video file
    file: std::path::PathBuf,

    /// Platforms to publish to, in order
    #[arg(long, value_delimiter = ',', default_values = ["youtube", "tiktok", "instagram"])]
    platforms: Vec<Platform>,

    /// Caption used wherever no per-platform override is given
    #[arg(long, default_value = "")]
    caption: String,

    /// YouTube video title (required when publishing to YouTube)
    #[arg(long)]
    title: Option<String>,

    /// YouTube description override
    #[arg(long)]
    youtube_description: Option<String>,

    /// TikTok caption override
    #[arg(long)]
    tiktok_caption: Option<String>,

    /// Instagram caption override
    #[arg(long)]
    instagram_caption: Option<String>,

    /// Audience: private, unlisted, or public
    #[arg(long)]
    privacy: Option<String>,
}

fn parse_privacy(raw: &str) -> anyhow::Result<Privacy> {
    match raw.to_lowercase().as_str() {
        "private" => Ok(Privacy::Private),
        "unlisted" => Ok(Privacy::Unlisted),
        "public" => Ok(Privacy::Public),
        other => anyhow::bail!("Unknown privacy level: {}", other),
    }
}

fn build_target(cli: &Cli, platform: Platform, privacy: Option<Privacy>) -> PlatformTarget {
    let mut target = PlatformTarget::new(platform);
    target.privacy = privacy;
    match platform {
        Platform::Youtube => {
            target.title = cli.title.clone();
            target.caption = cli.youtube_description.clone();
        }
        Platform::Tiktok => {
            target.caption = cli.tiktok_caption.clone();
        }
        Platform::Instagram => {
            target.caption = cli.instagram_caption.clone();
        }
    }
    target
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize result")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = PublishConfig::from_env()?;

    let privacy = cli.privacy.as_deref().map(parse_privacy).transpose()?;
    let targets = cli
        .platforms
        .iter()
        .map(|&platform| build_target(&cli, platform, privacy))
        .collect();

    let filename = cli
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .context("Invalid file path")?
        .to_string();

    let mut source = FileSource::open(&cli.file)
        .await
        .with_context(|| format!("Failed to open {}", cli.file.display()))?;

    let request = PublishRequest::new(
        filename.clone(),
        content_type_for(&filename),
        cli.caption.clone(),
        targets,
    );

    let publisher = Publisher::from_config(&config)?;
    let cancel = CancellationToken::new();

    // Ctrl-C cancels the whole job; the running attempt aborts at its next
    // chunk or poll boundary and remaining platforms are skipped.
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling job");
            ctrl_c_cancel.cancel();
        }
    });

    let result = publisher.run(&request, &mut source, &cancel).await;
    print_json(&result)?;

    if result.attempts.iter().all(|a| !a.is_success()) {
        std::process::exit(1);
    }
    Ok(())
}
