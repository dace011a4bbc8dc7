// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::domain::models::catalog::{CatalogEntity, ComponentLine, ImageKey, Revision, ScrapeResult};
use crate::domain::services::field_extractor::{
    element_text, extract_piece_count, extract_release_year, parse_dimensions,
    split_color_and_part_name,
};
use crate::domain::services::image_fetcher::ImageFetcher;
use crate::domain::services::revision_detector::{links_to_older_revision, RevisionDetector};
use crate::engines::traits::{EngineError, FetchRequest, HttpEngine};
use crate::utils::pacing::{pause, DelayStrategy, PauseWindow};
use crate::utils::url_utils::CatalogUrls;

/// 描述单元格中从此标记开始的内容都会被丢弃
const CATALOG_MARKER: &str = "Catalog:";

static ITEM_NAME: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#item-name-title").expect("valid item name selector"));
static INVENTORY_TABLE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table#id-main-legacy-table").expect("valid inventory table selector")
});
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid row selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("valid cell selector"));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("valid link selector"));

static PART_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"P=([^&]+)").expect("valid part parameter regex"));
static COLOR_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"idColor=(\d+)").expect("valid color parameter regex"));

/// 抓取错误类型
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// 必需页面抓取失败
    #[error("Error scraping set {identifier}: {source}")]
    Fetch {
        identifier: String,
        #[source]
        source: EngineError,
    },
}

/// 清单行解析错误
#[derive(Error, Debug)]
pub enum RowParseError {
    /// 颜色ID超出范围
    #[error("invalid color id '{0}'")]
    InvalidColorId(String),
    /// 零件编号为空
    #[error("empty part number in '{0}'")]
    EmptyPartNumber(String),
}

/// 详情页解析结果
struct ItemPage {
    display_name: String,
    release_year: Option<i32>,
    piece_count: Option<u32>,
}

/// 目录抓取器
///
/// 抓取套装详情页和清单页，解析出套装信息和清单行，
/// 再批量下载结果中引用的所有图片
pub struct CatalogScraper {
    engine: Arc<dyn HttpEngine>,
    urls: CatalogUrls,
    images: ImageFetcher,
    detector: RevisionDetector,
    page_window: PauseWindow,
    delay: Arc<dyn DelayStrategy>,
}

impl CatalogScraper {
    /// 创建新的抓取器
    ///
    /// # 参数
    ///
    /// * `engine` - HTTP引擎
    /// * `urls` - 目录URL生成器
    /// * `images` - 图片下载器
    /// * `page_window` - 详情页与清单页之间的停顿窗口
    /// * `delay` - 停顿策略
    pub fn new(
        engine: Arc<dyn HttpEngine>,
        urls: CatalogUrls,
        images: ImageFetcher,
        page_window: PauseWindow,
        delay: Arc<dyn DelayStrategy>,
    ) -> Self {
        let detector = RevisionDetector::new(engine.clone(), urls.clone());
        Self {
            engine,
            urls,
            images,
            detector,
            page_window,
            delay,
        }
    }

    /// 旧版清单检测器
    pub fn detector(&self) -> &RevisionDetector {
        &self.detector
    }

    /// 抓取一个套装
    ///
    /// # 参数
    ///
    /// * `identifier` - 套装编号
    /// * `revision` - 清单版本
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapeResult)` - 图片已填充的抓取结果
    /// * `Err(ScrapeError)` - 详情页或清单页抓取失败
    #[instrument(skip(self))]
    pub async fn scrape(
        &self,
        identifier: &str,
        revision: Revision,
    ) -> Result<ScrapeResult, ScrapeError> {
        let item_url = self.urls.item_page(identifier);
        let inventory_url = self.urls.inventory_page(identifier, revision);

        let item_html = self.fetch_page(identifier, &item_url).await?;

        // Avoid a burst-pattern fetch signature between the two pages
        pause(self.delay.as_ref(), &self.page_window, "before inventory page").await;

        let inventory_html = self.fetch_page(identifier, &inventory_url).await?;

        let item = parse_item_page(&item_html, identifier);

        // The latest-revision inventory page is exactly the page the detector
        // inspects, so reuse it instead of fetching it twice
        let has_alternate_revision = if revision.is_legacy() {
            self.detector.has_alternate_revision(identifier).await
        } else {
            links_to_older_revision(&inventory_html)
        };

        let mut lines = parse_inventory_page(&inventory_html, &self.urls);
        info!(
            "Parsed {} inventory rows for {} ({:?})",
            lines.len(),
            identifier,
            item.display_name
        );

        let mut entity = CatalogEntity {
            identifier: identifier.to_string(),
            display_name: item.display_name,
            source_url: item_url,
            release_year: item.release_year,
            piece_count: item.piece_count,
            has_alternate_revision,
            quantity: 1,
            revision,
            date_added: Utc::now(),
            image: None,
        };

        let mut images = self
            .images
            .fetch_all(self.image_requests(identifier, &lines))
            .await;

        entity.image = images.remove(&ImageKey::Entity).flatten();
        for line in lines.iter_mut() {
            line.image = images.get(&line.image_key()).cloned().flatten();
        }

        Ok(ScrapeResult { entity, lines })
    }

    /// 需要下载的图片：套装一张，每个不同的零件颜色组合一张
    fn image_requests(&self, identifier: &str, lines: &[ComponentLine]) -> Vec<(ImageKey, String)> {
        let mut seen = HashSet::new();
        let mut requests = vec![(ImageKey::Entity, self.urls.entity_image(identifier))];
        for line in lines {
            let key = line.image_key();
            if seen.insert(key.clone()) {
                requests.push((
                    key,
                    self.urls.component_image(&line.part_number, line.color_id),
                ));
            }
        }
        requests
    }

    async fn fetch_page(&self, identifier: &str, url: &str) -> Result<String, ScrapeError> {
        let wrap = |source| ScrapeError::Fetch {
            identifier: identifier.to_string(),
            source,
        };

        let response = self
            .engine
            .fetch(&FetchRequest::get(url))
            .await
            .map_err(wrap)?;

        if !response.is_success() {
            return Err(wrap(EngineError::Status {
                url: url.to_string(),
                status: response.status_code,
            }));
        }

        debug!(
            "Fetched {} ({} bytes, {}ms)",
            url,
            response.body.len(),
            response.response_time_ms
        );
        Ok(response.text())
    }
}

fn parse_item_page(html: &str, identifier: &str) -> ItemPage {
    let doc = Html::parse_document(html);

    let display_name = doc
        .select(&ITEM_NAME)
        .next()
        .map(|node| decode(&element_text(&node)))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| identifier.to_string());

    ItemPage {
        display_name,
        release_year: extract_release_year(&doc),
        piece_count: extract_piece_count(&doc),
    }
}

/// 解析清单表
///
/// 跳过表头；单行解析失败只记录日志并跳过该行
pub fn parse_inventory_page(html: &str, urls: &CatalogUrls) -> Vec<ComponentLine> {
    let doc = Html::parse_document(html);
    let Some(table) = doc.select(&INVENTORY_TABLE).next() else {
        warn!("Inventory table not found");
        return Vec::new();
    };

    let mut lines = Vec::new();
    for (index, row) in table.select(&ROW).enumerate().skip(1) {
        match parse_row(&row, urls) {
            Ok(Some(line)) => lines.push(line),
            Ok(None) => debug!("Skipping inventory row {}", index),
            Err(e) => warn!("Error parsing inventory row {}: {}", index, e),
        }
    }
    lines
}

fn parse_row(row: &ElementRef, urls: &CatalogUrls) -> Result<Option<ComponentLine>, RowParseError> {
    let cells: Vec<ElementRef> = row.select(&CELL).collect();
    if cells.len() < 4 {
        return Ok(None);
    }

    let Some(href) = cells[2]
        .select(&LINK)
        .next()
        .and_then(|link| link.value().attr("href"))
    else {
        return Ok(None);
    };

    let (Some(part), Some(color)) = (PART_PARAM.captures(href), COLOR_PARAM.captures(href)) else {
        return Ok(None);
    };

    let part_number = part[1].trim().to_string();
    if part_number.is_empty() {
        return Err(RowParseError::EmptyPartNumber(href.to_string()));
    }
    let color_id = color[1]
        .parse::<u32>()
        .map_err(|_| RowParseError::InvalidColorId(color[1].to_string()))?;

    let quantity = decode(&element_text(&cells[1])).parse::<u32>().unwrap_or(0);

    let mut description = decode(&element_text(&cells[3]));
    if let Some(idx) = description.find(CATALOG_MARKER) {
        description.truncate(idx);
        description = description.trim().to_string();
    }

    let (color_name, part_name) = split_color_and_part_name(&description);
    let (length, width) = parse_dimensions(&part_name);

    Ok(Some(ComponentLine {
        part_url: urls.part_page(&part_number, color_id),
        price_guide_url: urls.price_guide(&part_number, color_id),
        part_number,
        color_id,
        quantity,
        color_name,
        part_name,
        length,
        width,
        image: None,
    }))
}

/// 解码残留的HTML实体并去除首尾空白（包括 `&nbsp;`）
fn decode(text: &str) -> String {
    html_escape::decode_html_entities(text).trim().to_string()
}
