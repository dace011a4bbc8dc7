// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 清单版本
///
/// 一个套装可能发布过多个清单：1 表示旧版清单，2 及以上表示最新清单
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(u32);

impl Revision {
    /// 旧版清单
    pub const LEGACY: Revision = Revision(1);
    /// 最新清单
    pub const LATEST: Revision = Revision(2);

    /// 创建清单版本，0 视为最新清单
    pub fn new(value: u32) -> Self {
        if value == 0 {
            Self::LATEST
        } else {
            Self(value)
        }
    }

    /// 版本号
    pub fn value(&self) -> u32 {
        self.0
    }

    /// 是否为旧版清单
    pub fn is_legacy(&self) -> bool {
        self.0 == 1
    }

    /// 界面显示用的版本标记
    pub fn badge(&self) -> &'static str {
        if self.is_legacy() {
            "vOld"
        } else {
            "vNew"
        }
    }
}

impl Default for Revision {
    fn default() -> Self {
        Self::LATEST
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 目录实体（套装）
///
/// 由抓取器生成；`quantity` 和 `revision` 由工作器根据原始任务写入，
/// 而不是从页面推断
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntity {
    /// 套装编号，例如 `21061-1`
    pub identifier: String,
    /// 显示名称
    pub display_name: String,
    /// 套装详情页地址
    pub source_url: String,
    /// 发布年份
    pub release_year: Option<i32>,
    /// 零件数量
    pub piece_count: Option<u32>,
    /// 是否存在另一版本的清单
    pub has_alternate_revision: bool,
    /// 拥有数量
    pub quantity: u32,
    /// 存储的清单版本
    pub revision: Revision,
    /// 添加时间
    pub date_added: DateTime<Utc>,
    /// 套装图片
    #[serde(skip)]
    pub image: Option<Bytes>,
}

impl CatalogEntity {
    /// 写入来自任务的数量和版本
    ///
    /// 以调用方明确选择的版本为准，不与页面推断的结果合并
    pub fn stamp(&mut self, quantity: u32, revision: Revision) {
        self.quantity = quantity;
        self.revision = revision;
    }
}

/// 清单中的一行零件
///
/// `(part_number, color_id)` 唯一确定颜色名、零件名和尺寸；
/// 同一键可以出现多行，数量不预先合并
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentLine {
    /// 零件编号
    pub part_number: String,
    /// 颜色ID
    pub color_id: u32,
    /// 数量，无法解析时为0
    pub quantity: u32,
    /// 颜色名称
    pub color_name: String,
    /// 零件名称（包含颜色前缀的完整描述）
    pub part_name: String,
    /// 长度（凸点）
    pub length: u32,
    /// 宽度（凸点）
    pub width: u32,
    /// 零件详情页地址
    pub part_url: String,
    /// 价格指南地址
    pub price_guide_url: String,
    /// 零件图片
    #[serde(skip)]
    pub image: Option<Bytes>,
}

impl ComponentLine {
    /// 图片键
    pub fn image_key(&self) -> ImageKey {
        ImageKey::Component {
            part_number: self.part_number.clone(),
            color_id: self.color_id,
        }
    }
}

/// 一次抓取的完整结果，交给持久化接收端
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    /// 套装
    pub entity: CatalogEntity,
    /// 按页面顺序排列的清单行
    pub lines: Vec<ComponentLine>,
}

/// 图片键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageKey {
    /// 套装自身的图片
    Entity,
    /// 某个零件颜色组合的图片
    Component { part_number: String, color_id: u32 },
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ImageKey::Entity => write!(f, "set"),
            ImageKey::Component {
                part_number,
                color_id,
            } => write!(f, "{}_{}", part_number, color_id),
        }
    }
}
