// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::domain::models::catalog::{CatalogEntity, ComponentLine};
use crate::domain::repositories::persistence_sink::{PersistenceSink, SinkError};

/// 套装与零件的清单关联
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLink {
    pub entity_identifier: String,
    pub part_number: String,
    pub color_id: u32,
    pub quantity: u32,
}

/// 本地文件系统存储实现
///
/// 目录结构：
/// - `sets/{id}.json`
/// - `parts/{part}_{color}.json`
/// - `inventories/{id}.jsonl`，每行一个清单关联
/// - `images/sets/{id}.png` 与 `images/parts/{part}_{color}.png`
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn get_full_path(&self, dir: &str, file_name: &str) -> PathBuf {
        self.base_path.join(dir).join(file_name)
    }

    async fn save(&self, path: &Path, data: &[u8]) -> Result<(), SinkError> {
        // 确保目录存在
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        debug!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }

    async fn save_image(&self, path: &Path, image: &Option<Bytes>) -> Result<(), SinkError> {
        match image {
            Some(bytes) => self.save(path, bytes).await,
            None => Ok(()),
        }
    }

    fn inventory_path(&self, identifier: &str) -> PathBuf {
        self.get_full_path("inventories", &format!("{}.jsonl", file_stem(identifier)))
    }
}

#[async_trait]
impl PersistenceSink for LocalStorage {
    async fn put_entity(&self, entity: &CatalogEntity) -> Result<(), SinkError> {
        let stem = file_stem(&entity.identifier);
        let json = serde_json::to_vec_pretty(entity)?;
        self.save(&self.get_full_path("sets", &format!("{}.json", stem)), &json)
            .await?;
        self.save_image(
            &self.get_full_path("images/sets", &format!("{}.png", stem)),
            &entity.image,
        )
        .await?;

        // A new scrape replaces the previous inventory for this set
        match fs::remove_file(self.inventory_path(&entity.identifier)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SinkError::Io(e)),
        }
    }

    async fn put_component(&self, line: &ComponentLine) -> Result<(), SinkError> {
        let stem = format!("{}_{}", file_stem(&line.part_number), line.color_id);
        let json = serde_json::to_vec_pretty(line)?;
        self.save(&self.get_full_path("parts", &format!("{}.json", stem)), &json)
            .await?;
        self.save_image(
            &self.get_full_path("images/parts", &format!("{}.png", stem)),
            &line.image,
        )
        .await
    }

    async fn put_inventory_link(
        &self,
        entity_identifier: &str,
        part_number: &str,
        color_id: u32,
        quantity: u32,
    ) -> Result<(), SinkError> {
        let link = InventoryLink {
            entity_identifier: entity_identifier.to_string(),
            part_number: part_number.to_string(),
            color_id,
            quantity,
        };
        let mut line = serde_json::to_vec(&link)?;
        line.push(b'\n');

        let path = self.inventory_path(entity_identifier);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

/// 把标识符转换为安全的文件名
fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// 内存持久化实现
///
/// 零件按 `(零件编号, 颜色ID)` 去重，重新保存同一套装时替换其旧清单
#[derive(Default)]
pub struct InMemorySink {
    entities: RwLock<HashMap<String, CatalogEntity>>,
    components: RwLock<HashMap<(String, u32), ComponentLine>>,
    links: RwLock<Vec<InventoryLink>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(&self, identifier: &str) -> Option<CatalogEntity> {
        self.entities.read().get(identifier).cloned()
    }

    pub fn entities(&self) -> Vec<CatalogEntity> {
        self.entities.read().values().cloned().collect()
    }

    pub fn component(&self, part_number: &str, color_id: u32) -> Option<ComponentLine> {
        self.components
            .read()
            .get(&(part_number.to_string(), color_id))
            .cloned()
    }

    pub fn component_count(&self) -> usize {
        self.components.read().len()
    }

    /// 某个套装的清单关联
    pub fn inventory(&self, entity_identifier: &str) -> Vec<InventoryLink> {
        self.links
            .read()
            .iter()
            .filter(|link| link.entity_identifier == entity_identifier)
            .cloned()
            .collect()
    }

    /// 所有套装中某个零件颜色组合的总数量
    ///
    /// 每条关联的数量乘以所属套装的拥有数量后求和
    pub fn total_quantity(&self, part_number: &str, color_id: u32) -> u32 {
        let entities = self.entities.read();
        self.links
            .read()
            .iter()
            .filter(|link| link.part_number == part_number && link.color_id == color_id)
            .map(|link| {
                let owned = entities
                    .get(&link.entity_identifier)
                    .map_or(1, |entity| entity.quantity);
                link.quantity.saturating_mul(owned)
            })
            .fold(0u32, u32::saturating_add)
    }
}

#[async_trait]
impl PersistenceSink for InMemorySink {
    async fn put_entity(&self, entity: &CatalogEntity) -> Result<(), SinkError> {
        self.links
            .write()
            .retain(|link| link.entity_identifier != entity.identifier);
        self.entities
            .write()
            .insert(entity.identifier.clone(), entity.clone());
        Ok(())
    }

    async fn put_component(&self, line: &ComponentLine) -> Result<(), SinkError> {
        self.components
            .write()
            .insert((line.part_number.clone(), line.color_id), line.clone());
        Ok(())
    }

    async fn put_inventory_link(
        &self,
        entity_identifier: &str,
        part_number: &str,
        color_id: u32,
        quantity: u32,
    ) -> Result<(), SinkError> {
        self.links.write().push(InventoryLink {
            entity_identifier: entity_identifier.to_string(),
            part_number: part_number.to_string(),
            color_id,
            quantity,
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
