// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::catalog::{CatalogEntity, ComponentLine};

/// 持久化错误类型
#[derive(Error, Debug)]
pub enum SinkError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// 其他错误
    #[error("Sink error: {0}")]
    Other(String),
}

/// 持久化接收端特质
///
/// 工作器在抓取成功后，对每个结果调用一次 `put_entity`，
/// 对每一行调用一次 `put_component` 和 `put_inventory_link`
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// 保存套装
    async fn put_entity(&self, entity: &CatalogEntity) -> Result<(), SinkError>;

    /// 保存零件信息
    async fn put_component(&self, line: &ComponentLine) -> Result<(), SinkError>;

    /// 保存套装与零件的清单关联
    async fn put_inventory_link(
        &self,
        entity_identifier: &str,
        part_number: &str,
        color_id: u32,
        quantity: u32,
    ) -> Result<(), SinkError>;
}
