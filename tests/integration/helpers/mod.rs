// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use brickcrawl::domain::models::catalog::{CatalogEntity, ComponentLine};
use brickcrawl::domain::repositories::persistence_sink::{PersistenceSink, SinkError};
use brickcrawl::domain::services::catalog_scraper::CatalogScraper;
use brickcrawl::domain::services::image_fetcher::{ImageFetcher, DEFAULT_BATCH_SIZE};
use brickcrawl::engines::traits::{EngineError, FetchRequest, FetchResponse, HttpEngine};
use brickcrawl::infrastructure::storage::InMemorySink;
use brickcrawl::utils::pacing::{DelayStrategy, NoDelay, PauseWindow};
use brickcrawl::utils::url_utils::CatalogUrls;
use brickcrawl::workers::events::QueueEvent;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

pub const ITEM_BASE: &str = "http://catalog.test/v2/catalog";
pub const INVENTORY_BASE: &str = "http://catalog.test";
pub const IMAGE_BASE: &str = "http://img.test";

pub fn test_urls() -> CatalogUrls {
    CatalogUrls::new(ITEM_BASE, INVENTORY_BASE, IMAGE_BASE)
}

/// 预设响应
#[derive(Clone)]
enum Route {
    Respond { status: u16, body: Bytes },
    Fail,
}

/// 测试用HTTP引擎
///
/// 按完整URL返回预设响应，未注册的URL返回404；
/// 记录请求顺序和最大并发数
#[derive(Default)]
pub struct StubEngine {
    routes: Mutex<HashMap<String, Route>>,
    requests: Mutex<Vec<String>>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn html(&self, url: impl Into<String>, body: impl Into<String>) {
        self.routes.lock().insert(
            url.into(),
            Route::Respond {
                status: 200,
                body: Bytes::from(body.into()),
            },
        );
    }

    pub fn bytes(&self, url: impl Into<String>, body: &'static [u8]) {
        self.routes.lock().insert(
            url.into(),
            Route::Respond {
                status: 200,
                body: Bytes::from_static(body),
            },
        );
    }

    pub fn status(&self, url: impl Into<String>, status: u16) {
        self.routes.lock().insert(
            url.into(),
            Route::Respond {
                status,
                body: Bytes::new(),
            },
        );
    }

    pub fn fail(&self, url: impl Into<String>) {
        self.routes.lock().insert(url.into(), Route::Fail);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpEngine for StubEngine {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError> {
        self.requests.lock().push(request.url.clone());
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let route = self.routes.lock().get(&request.url).cloned();
        match route {
            Some(Route::Respond { status, body }) => Ok(FetchResponse {
                status_code: status,
                content_type: "text/html".to_string(),
                body,
                response_time_ms: self.latency.as_millis() as u64,
            }),
            Some(Route::Fail) => Err(EngineError::Other(format!(
                "connection reset: {}",
                request.url
            ))),
            None => Ok(FetchResponse {
                status_code: 404,
                content_type: "text/html".to_string(),
                body: Bytes::new(),
                response_time_ms: 0,
            }),
        }
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// 使用零停顿构建抓取器
pub fn build_scraper(engine: Arc<dyn HttpEngine>) -> CatalogScraper {
    build_scraper_with_urls(engine, test_urls())
}

pub fn build_scraper_with_urls(engine: Arc<dyn HttpEngine>, urls: CatalogUrls) -> CatalogScraper {
    let images = ImageFetcher::new(
        engine.clone(),
        DEFAULT_BATCH_SIZE,
        PauseWindow::from_millis(0, 0),
        Arc::new(NoDelay),
    );
    CatalogScraper::new(
        engine,
        urls,
        images,
        PauseWindow::from_millis(0, 0),
        Arc::new(NoDelay),
    )
}

/// 套装详情页
pub fn item_page(identifier: &str, name: &str, year: i32, pieces: u32) -> String {
    format!(
        r#"<html><body>
            <h1 id="item-name-title">{name}</h1>
            <table><tr><td>
                <span>Year Released: <a class="links" href="/catalogList.asp?itemYear={year}&catType=S">{year}</a></span>
                <br><a class="links" href="/catalogItemInv.asp?S={identifier}">{pieces} Parts</a>
            </td></tr></table>
        </body></html>"#
    )
}

/// 清单行 `(数量, 零件编号, 颜色ID, 描述)`
pub fn inventory_row(quantity: &str, part_number: &str, color_id: u32, description: &str) -> String {
    format!(
        r#"<tr><td><img src="x.png"></td><td>&nbsp;{quantity}&nbsp;</td>
           <td><a href="/v2/catalog/catalogitem.page?P={part_number}&amp;idColor={color_id}">{part_number}</a></td>
           <td><b>{description}</b></td></tr>"#
    )
}

/// 清单页，`older_link` 为真时包含旧版清单链接
pub fn inventory_page(identifier: &str, rows: &[String], older_link: bool) -> String {
    let older = if older_link {
        format!(
            r#"<a href="/catalogItemInv.asp?S={}&amp;v=1">Older Version</a>"#,
            identifier
        )
    } else {
        String::new()
    };
    format!(
        r#"<html><body>{older}
            <table id="id-main-legacy-table">
                <tr><td>Image</td><td>Qty</td><td>Item No</td><td>Description</td></tr>
                {rows}
            </table>
        </body></html>"#,
        rows = rows.concat()
    )
}

/// 注册一个单零件的套装
pub fn register_simple_set(engine: &StubEngine, identifier: &str, name: &str) {
    let urls = test_urls();
    engine.html(urls.item_page(identifier), item_page(identifier, name, 2020, 1));
    engine.html(
        urls.inventory_page(identifier, Default::default()),
        inventory_page(
            identifier,
            &[inventory_row("1", "3001", 5, "Red Brick 2 x 4")],
            false,
        ),
    );
}

/// 持久化总是失败的接收端
pub struct FailingSink;

#[async_trait]
impl PersistenceSink for FailingSink {
    async fn put_entity(&self, _entity: &CatalogEntity) -> Result<(), SinkError> {
        Err(SinkError::Other("disk full".to_string()))
    }

    async fn put_component(&self, _line: &ComponentLine) -> Result<(), SinkError> {
        Ok(())
    }

    async fn put_inventory_link(
        &self,
        _entity_identifier: &str,
        _part_number: &str,
        _color_id: u32,
        _quantity: u32,
    ) -> Result<(), SinkError> {
        Ok(())
    }
}

/// 对指定套装 panic、其余委托给内存存储的接收端
pub struct PanickingSink {
    pub target: &'static str,
    pub inner: InMemorySink,
}

#[async_trait]
impl PersistenceSink for PanickingSink {
    async fn put_entity(&self, entity: &CatalogEntity) -> Result<(), SinkError> {
        if entity.identifier == self.target {
            panic!("sink exploded on {}", entity.identifier);
        }
        self.inner.put_entity(entity).await
    }

    async fn put_component(&self, line: &ComponentLine) -> Result<(), SinkError> {
        self.inner.put_component(line).await
    }

    async fn put_inventory_link(
        &self,
        entity_identifier: &str,
        part_number: &str,
        color_id: u32,
        quantity: u32,
    ) -> Result<(), SinkError> {
        self.inner
            .put_inventory_link(entity_identifier, part_number, color_id, quantity)
            .await
    }
}

/// 记录每次停顿窗口、实际不停顿的策略
#[derive(Default)]
pub struct CountingDelay {
    windows: Mutex<Vec<PauseWindow>>,
}

impl CountingDelay {
    pub fn count(&self) -> usize {
        self.windows.lock().len()
    }

    pub fn windows(&self) -> Vec<PauseWindow> {
        self.windows.lock().clone()
    }
}

impl DelayStrategy for CountingDelay {
    fn pick(&self, window: &PauseWindow) -> Duration {
        self.windows.lock().push(*window);
        Duration::ZERO
    }
}

/// 收集事件直到 `QueueEmptied`
pub async fn collect_until_emptied(rx: &mut UnboundedReceiver<QueueEvent>) -> Vec<QueueEvent> {
    let mut events = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("queue did not empty in time")
            .expect("event channel closed");
        let done = matches!(event, QueueEvent::QueueEmptied);
        events.push(event);
        if done {
            return events;
        }
    }
}

/// 事件对应的套装编号
pub fn identifier_of(event: &QueueEvent) -> Option<&str> {
    match event {
        QueueEvent::JobStarted { identifier, .. }
        | QueueEvent::JobCompleted { identifier, .. }
        | QueueEvent::JobFailed { identifier, .. } => Some(identifier),
        _ => None,
    }
}
