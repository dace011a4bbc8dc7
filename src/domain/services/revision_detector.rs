// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::debug;

use crate::domain::models::catalog::Revision;
use crate::engines::traits::{FetchRequest, HttpEngine};
use crate::utils::url_utils::CatalogUrls;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("valid anchor selector"));

/// 旧版清单检测器
///
/// 入队前用于决定是否需要让调用方选择版本，
/// 抓取时用于标记 `has_alternate_revision`；两处使用同一条规则
pub struct RevisionDetector {
    engine: Arc<dyn HttpEngine>,
    urls: CatalogUrls,
}

impl RevisionDetector {
    /// 创建新的检测器
    pub fn new(engine: Arc<dyn HttpEngine>, urls: CatalogUrls) -> Self {
        Self { engine, urls }
    }

    /// 套装是否存在旧版清单
    ///
    /// 抓取默认版本的清单页并检测旧版链接；任何抓取或解析错误都返回 `false`
    pub async fn has_alternate_revision(&self, identifier: &str) -> bool {
        let url = self.urls.inventory_page(identifier, Revision::LATEST);
        match self.engine.fetch(&FetchRequest::get(&url)).await {
            Ok(response) if response.is_success() => links_to_older_revision(&response.text()),
            Ok(response) => {
                debug!(
                    "Revision check for {} got status {}",
                    identifier, response.status_code
                );
                false
            }
            Err(e) => {
                debug!("Revision check for {} failed: {}", identifier, e);
                false
            }
        }
    }
}

/// 检测规则：页面中存在文本含 "Older" 或 href 含 `v=1` 的链接
pub fn links_to_older_revision(inventory_html: &str) -> bool {
    let doc = Html::parse_document(inventory_html);
    doc.select(&ANCHOR).any(|a| {
        a.text().any(|t| t.contains("Older"))
            || a.value().attr("href").is_some_and(|href| href.contains("v=1"))
    })
}
