// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{bail, Context};
use brickcrawl::config::settings::Settings;
use brickcrawl::domain::models::job::ScrapeJob;
use brickcrawl::domain::services::catalog_scraper::CatalogScraper;
use brickcrawl::domain::services::image_fetcher::ImageFetcher;
use brickcrawl::engines::reqwest_engine::ReqwestEngine;
use brickcrawl::engines::traits::HttpEngine;
use brickcrawl::infrastructure::storage::LocalStorage;
use brickcrawl::workers::events::QueueEvent;
use brickcrawl::workers::ScrapeQueue;
use std::sync::Arc;
use tracing::{info, warn};

use brickcrawl::utils::telemetry;

const USAGE: &str = "usage: brickcrawl ID[:QTY[:REV]]...";

/// 命令行请求
struct Request {
    job: ScrapeJob,
    explicit_revision: bool,
}

/// 主函数
///
/// 解析 `ID[:QTY[:REV]]` 参数，入队后等待所有任务结束
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();

    let requests = parse_args(std::env::args().skip(1))?;

    // 2. Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    info!("Configuration loaded");

    // 3. Build the pipeline
    let engine: Arc<dyn HttpEngine> = Arc::new(ReqwestEngine::new(&settings.catalog.user_agent)?);
    let delay = settings.delay_strategy();
    let images = ImageFetcher::new(
        engine.clone(),
        settings.images.batch_size,
        settings.pacing.batch_window(),
        delay.clone(),
    );
    let scraper = Arc::new(CatalogScraper::new(
        engine,
        settings.catalog_urls(),
        images,
        settings.pacing.page_window(),
        delay,
    ));
    let sink = Arc::new(LocalStorage::new(&settings.storage.local_path));
    let queue = ScrapeQueue::new(scraper.clone(), sink);

    // 4. Revision check for requests without an explicit revision
    for request in requests.iter().filter(|r| !r.explicit_revision) {
        let identifier = &request.job.identifier;
        if scraper.detector().has_alternate_revision(identifier).await {
            info!(
                "{} has an older inventory revision; storing the latest (use {}::1 for the older one)",
                identifier, identifier
            );
        }
    }

    // 5. Enqueue and wait
    let mut events = queue.events().subscribe_channel();
    let total = requests.len();
    for request in requests {
        queue.enqueue_job(request.job);
    }

    let (mut completed, mut failed, mut cancelled) = (0usize, 0usize, false);
    while completed + failed < total {
        tokio::select! {
            event = events.recv() => match event {
                Some(QueueEvent::JobStarted { identifier, status }) => {
                    info!("[{}] {}", identifier, status);
                }
                Some(QueueEvent::JobCompleted { identifier, display_name, status, .. }) => {
                    info!("[{}] {} - {}", identifier, display_name, status);
                    completed += 1;
                }
                Some(QueueEvent::JobFailed { identifier, status }) => {
                    warn!("[{}] {}", identifier, status);
                    failed += 1;
                }
                Some(QueueEvent::QueueEmptied) if cancelled => break,
                Some(_) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c(), if !cancelled => {
                warn!("Interrupted; finishing the current set");
                queue.cancel();
                cancelled = true;
            }
        }
    }

    info!(
        "Done: {} added, {} failed, {} not processed",
        completed,
        failed,
        queue.len()
    );
    if failed > 0 {
        bail!("{} of {} sets failed", failed, total);
    }
    Ok(())
}

fn parse_args(args: impl Iterator<Item = String>) -> anyhow::Result<Vec<Request>> {
    let mut requests = Vec::new();
    for arg in args {
        let mut parts = arg.splitn(3, ':');
        let identifier = parts.next().unwrap_or_default();
        let quantity = parts.next();
        let revision = parts.next();

        match ScrapeJob::coerce(identifier, quantity, revision) {
            Some(job) => requests.push(Request {
                job,
                explicit_revision: revision.is_some_and(|r| !r.trim().is_empty()),
            }),
            None => warn!("Ignoring empty set number in '{}'", arg),
        }
    }

    if requests.is_empty() {
        bail!(USAGE);
    }
    Ok(requests)
}
