// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供后台抓取工作器和队列事件通知
pub mod events;
pub mod scrape_worker;

pub use scrape_worker::ScrapeQueue;
