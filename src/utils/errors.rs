// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

use crate::domain::repositories::persistence_sink::SinkError;
use crate::domain::services::catalog_scraper::ScrapeError;

/// 单个任务的错误类型
///
/// 抓取失败、持久化失败以及任务内的 panic 会逃逸到工作循环，
/// 其 `Display` 文本即失败通知中的状态信息
#[derive(Error, Debug)]
pub enum JobError {
    #[error("{0}")]
    Scrape(#[from] ScrapeError),

    #[error("Failed to persist result: {0}")]
    Persist(#[from] SinkError),

    #[error("job panicked")]
    Panicked,
}
