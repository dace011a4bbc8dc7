// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use bytes::Bytes;
use futures::future::join_all;
use metrics::counter;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::engines::traits::{FetchRequest, HttpEngine};
use crate::utils::pacing::{pause, DelayStrategy, PauseWindow};

/// 浏览器通常的并发连接数
pub const DEFAULT_BATCH_SIZE: usize = 6;

/// 批量图片下载器
///
/// 按固定大小分批下载：批内并发，等待整批结束后再开始下一批，
/// 批与批之间随机停顿。单张图片失败只会让该键得到 `None`
pub struct ImageFetcher {
    engine: Arc<dyn HttpEngine>,
    batch_size: usize,
    pause_window: PauseWindow,
    delay: Arc<dyn DelayStrategy>,
}

impl ImageFetcher {
    /// 创建新的图片下载器
    ///
    /// # 参数
    ///
    /// * `engine` - HTTP引擎
    /// * `batch_size` - 每批并发数量，0 按1处理
    /// * `pause_window` - 批间停顿窗口
    /// * `delay` - 停顿策略
    pub fn new(
        engine: Arc<dyn HttpEngine>,
        batch_size: usize,
        pause_window: PauseWindow,
        delay: Arc<dyn DelayStrategy>,
    ) -> Self {
        Self {
            engine,
            batch_size: batch_size.max(1),
            pause_window,
            delay,
        }
    }

    /// 下载全部图片
    ///
    /// # 参数
    ///
    /// * `items` - `(键, URL)` 列表，键应当唯一
    ///
    /// # 返回值
    ///
    /// 每个输入键对应一项，成功为图片字节，失败为 `None`
    pub async fn fetch_all<K>(&self, items: Vec<(K, String)>) -> HashMap<K, Option<Bytes>>
    where
        K: Eq + Hash + Clone,
    {
        let mut results = HashMap::with_capacity(items.len());
        let batches: Vec<&[(K, String)]> = items.chunks(self.batch_size).collect();
        let batch_count = batches.len();

        for (index, batch) in batches.into_iter().enumerate() {
            let fetches = batch.iter().map(|(key, url)| async move {
                (key.clone(), self.fetch_one(url).await)
            });

            for (key, data) in join_all(fetches).await {
                results.insert(key, data);
            }

            if index + 1 < batch_count {
                pause(self.delay.as_ref(), &self.pause_window, "image batch").await;
            }
        }

        results
    }

    async fn fetch_one(&self, url: &str) -> Option<Bytes> {
        match self.engine.fetch(&FetchRequest::get(url)).await {
            Ok(response) if response.is_success() => {
                counter!("images_fetched_total").increment(1);
                Some(response.body)
            }
            Ok(response) => {
                debug!("Image {} returned status {}", url, response.status_code);
                counter!("images_missing_total").increment(1);
                None
            }
            Err(e) => {
                warn!("Error downloading image from {}: {}", url, e);
                counter!("images_missing_total").increment(1);
                None
            }
        }
    }
}
