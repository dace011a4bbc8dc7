// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::sync::Arc;

use crate::utils::pacing::{DelayStrategy, NoDelay, PauseWindow, RandomDelay};
use crate::utils::url_utils::CatalogUrls;

/// 应用程序配置设置
///
/// 包含目录站点、请求节奏、图片批量下载和本地存储等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 目录站点配置
    pub catalog: CatalogSettings,
    /// 请求节奏配置
    pub pacing: PacingSettings,
    /// 图片下载配置
    pub images: ImageSettings,
    /// 存储配置
    pub storage: StorageSettings,
}

/// 目录站点配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    /// 套装详情页根地址
    pub item_base_url: String,
    /// 清单页根地址
    pub inventory_base_url: String,
    /// 图片服务根地址
    pub image_base_url: String,
    /// 所有请求使用的浏览器 User-Agent
    pub user_agent: String,
}

/// 请求节奏配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct PacingSettings {
    /// 是否启用随机停顿
    pub enabled: bool,
    /// 详情页与清单页之间的最小停顿（毫秒）
    pub page_delay_min_ms: u64,
    /// 详情页与清单页之间的最大停顿（毫秒）
    pub page_delay_max_ms: u64,
    /// 图片批次之间的最小停顿（毫秒）
    pub batch_pause_min_ms: u64,
    /// 图片批次之间的最大停顿（毫秒）
    pub batch_pause_max_ms: u64,
}

/// 图片下载配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ImageSettings {
    /// 每批并发下载数量
    pub batch_size: usize,
}

/// 存储配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// 本地存储路径
    pub local_path: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和
    /// `BRICKCRAWL__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("BRICKCRAWL").separator("__"));

        builder.build()?.try_deserialize()
    }

    fn defaults() -> Result<config::builder::ConfigBuilder<config::builder::DefaultState>, ConfigError>
    {
        Config::builder()
            // Catalog endpoints
            .set_default("catalog.item_base_url", "https://www.bricklink.com/v2/catalog")?
            .set_default("catalog.inventory_base_url", "https://www.bricklink.com")?
            .set_default("catalog.image_base_url", "https://img.bricklink.com")?
            .set_default(
                "catalog.user_agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
            )?
            // Pacing
            .set_default("pacing.enabled", true)?
            .set_default("pacing.page_delay_min_ms", 300)?
            .set_default("pacing.page_delay_max_ms", 1500)?
            .set_default("pacing.batch_pause_min_ms", 100)?
            .set_default("pacing.batch_pause_max_ms", 300)?
            // Images
            .set_default("images.batch_size", 6)?
            // Storage
            .set_default("storage.local_path", "./storage")
    }

    /// 根据目录配置构建URL生成器
    pub fn catalog_urls(&self) -> CatalogUrls {
        CatalogUrls::new(
            &self.catalog.item_base_url,
            &self.catalog.inventory_base_url,
            &self.catalog.image_base_url,
        )
    }

    /// 根据节奏配置选择停顿策略
    pub fn delay_strategy(&self) -> Arc<dyn DelayStrategy> {
        if self.pacing.enabled {
            Arc::new(RandomDelay)
        } else {
            Arc::new(NoDelay)
        }
    }
}

impl PacingSettings {
    /// 页面之间的停顿窗口
    pub fn page_window(&self) -> PauseWindow {
        PauseWindow::from_millis(self.page_delay_min_ms, self.page_delay_max_ms)
    }

    /// 图片批次之间的停顿窗口
    pub fn batch_window(&self) -> PauseWindow {
        PauseWindow::from_millis(self.batch_pause_min_ms, self.batch_pause_max_ms)
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
