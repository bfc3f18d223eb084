//! StreamVOD uploader entry point.

mod config;
mod progress;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use streamvod_upload::{
    HttpPartTransport, HttpSessionClient, UploadOrchestrator, format_name, validate_media_file,
};
use tracing_subscriber::EnvFilter;

use crate::config::UploaderConfig;
use crate::progress::ProgressReporter;

#[derive(Parser)]
#[command(name = "streamvod-uploader")]
#[command(about = "Upload a video to StreamVOD through presigned multipart URLs")]
#[command(version)]
struct Cli {
    /// Video file to upload
    file: PathBuf,

    /// Config file path (default: ~/.config/streamvod/uploader.toml)
    #[arg(long, env = "STREAMVOD_CONFIG")]
    config: Option<PathBuf>,

    /// API base URL (overrides config and environment)
    #[arg(long)]
    backend_url: Option<String>,

    /// Bearer token (overrides config and environment)
    #[arg(long)]
    token: Option<String>,

    /// Part size in MiB
    #[arg(long)]
    part_size_mib: Option<u64>,

    /// Parts uploaded at the same time
    #[arg(long, short = 'j')]
    concurrency: Option<usize>,

    /// Check plain-MD5 ETags against the bytes sent
    #[arg(long)]
    verify_etag: bool,
}

impl Cli {
    fn apply(&self, config: &mut UploaderConfig) {
        if let Some(url) = &self.backend_url {
            config.backend_url = url.clone();
        }
        if let Some(token) = &self.token {
            config.auth_token = token.clone();
        }
        if let Some(mib) = self.part_size_mib {
            config.part_size_bytes = mib.saturating_mul(1024 * 1024);
        }
        if let Some(n) = self.concurrency {
            config.max_concurrency = n;
        }
        if self.verify_etag {
            config.verify_etag = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = UploaderConfig::load(cli.config.as_deref())?;
    config.apply_env()?;
    cli.apply(&mut config);
    config.validate()?;

    let metadata = tokio::fs::metadata(&cli.file)
        .await
        .with_context(|| format!("cannot read {}", cli.file.display()))?;
    validate_media_file(&cli.file, metadata.len())?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        file = %cli.file.display(),
        format = %format_name(&cli.file),
        bytes = metadata.len(),
        backend = %config.backend_url,
        "starting StreamVOD uploader"
    );

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .build()
        .context("failed to build HTTP client")?;
    let client = HttpSessionClient::with_client(http.clone(), &config.backend_url, config.token())?;
    let transport = HttpPartTransport::with_client(http);

    let mut orchestrator =
        UploadOrchestrator::new(Arc::new(client), Arc::new(transport), config.upload_options());
    let reporter = ProgressReporter::new();
    orchestrator.on_progress(move |p| reporter.report(p));

    let cancel = orchestrator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling upload");
            cancel.cancel();
        }
    });

    let object = orchestrator
        .upload_file(&cli.file)
        .await
        .with_context(|| format!("upload of {} failed", cli.file.display()))?;

    tracing::info!(
        video_id = %object.video_id,
        key = %object.object_key,
        status = %object.status,
        "upload complete"
    );
    if !object.message.is_empty() {
        tracing::info!("{}", object.message);
    }
    println!("{}", object.video_id);
    Ok(())
}
