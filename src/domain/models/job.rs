// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::catalog::Revision;

/// 默认拥有数量
pub const DEFAULT_QUANTITY: u32 = 1;

/// 抓取任务
///
/// 入队时创建，创建后不可变，由工作器恰好消费一次
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeJob {
    /// 任务唯一标识符，仅用于日志关联
    pub id: Uuid,
    /// 套装编号
    pub identifier: String,
    /// 拥有数量，至少为1
    pub quantity: u32,
    /// 要存储的清单版本
    pub revision: Revision,
}

impl ScrapeJob {
    /// 创建新的抓取任务
    ///
    /// 数量小于1时按1处理
    pub fn new(identifier: impl Into<String>, quantity: u32, revision: Revision) -> Self {
        Self {
            id: Uuid::new_v4(),
            identifier: identifier.into(),
            quantity: quantity.max(DEFAULT_QUANTITY),
            revision,
        }
    }

    /// 从用户可编辑的文本字段构建任务
    ///
    /// # 参数
    ///
    /// * `identifier` - 套装编号，去除首尾空白后为空则拒绝
    /// * `quantity` - 数量文本，缺失、无法解析或小于1时取1
    /// * `revision` - 版本文本，缺失、无法解析或小于1时取最新版本
    ///
    /// # 返回值
    ///
    /// * `Some(ScrapeJob)` - 合法任务
    /// * `None` - 套装编号为空
    pub fn coerce(identifier: &str, quantity: Option<&str>, revision: Option<&str>) -> Option<Self> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return None;
        }

        let quantity = quantity
            .and_then(|q| q.trim().parse::<i64>().ok())
            .filter(|q| *q >= 1)
            .and_then(|q| u32::try_from(q).ok())
            .unwrap_or(DEFAULT_QUANTITY);

        let revision = revision
            .and_then(|r| r.trim().parse::<i64>().ok())
            .filter(|r| *r >= 1)
            .and_then(|r| u32::try_from(r).ok())
            .map(Revision::new)
            .unwrap_or_default();

        Some(Self::new(identifier, quantity, revision))
    }
}
