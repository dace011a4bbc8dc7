// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::form_urlencoded;

use crate::domain::models::catalog::Revision;

/// 目录站点URL生成器
///
/// 集中维护详情页、清单页和图片地址的格式，
/// 根地址来自配置以便测试时指向本地模拟服务
#[derive(Debug, Clone)]
pub struct CatalogUrls {
    item_base: String,
    inventory_base: String,
    image_base: String,
}

impl CatalogUrls {
    /// 创建URL生成器，末尾的 `/` 会被去掉
    pub fn new(item_base: &str, inventory_base: &str, image_base: &str) -> Self {
        Self {
            item_base: item_base.trim_end_matches('/').to_string(),
            inventory_base: inventory_base.trim_end_matches('/').to_string(),
            image_base: image_base.trim_end_matches('/').to_string(),
        }
    }

    /// 套装详情页，与清单版本无关
    pub fn item_page(&self, identifier: &str) -> String {
        format!("{}/catalogitem.page?S={}", self.item_base, encode(identifier))
    }

    /// 清单页，版本1使用 `v=1` 参数选择旧版清单
    pub fn inventory_page(&self, identifier: &str, revision: Revision) -> String {
        let base = format!(
            "{}/catalogItemInv.asp?S={}",
            self.inventory_base,
            encode(identifier)
        );
        if revision.is_legacy() {
            format!("{}&v=1", base)
        } else {
            base
        }
    }

    /// 套装图片
    pub fn entity_image(&self, identifier: &str) -> String {
        format!("{}/ItemImage/SN/0/{}.png", self.image_base, identifier)
    }

    /// 零件缩略图
    pub fn component_image(&self, part_number: &str, color_id: u32) -> String {
        format!(
            "{}/ItemImage/PT/{}/{}.t1.png",
            self.image_base, color_id, part_number
        )
    }

    /// 零件详情页
    pub fn part_page(&self, part_number: &str, color_id: u32) -> String {
        format!(
            "{}/catalogitem.page?P={}&idColor={}",
            self.item_base,
            encode(part_number),
            color_id
        )
    }

    /// 零件价格指南页
    pub fn price_guide(&self, part_number: &str, color_id: u32) -> String {
        format!("{}#T=P", self.part_page(part_number, color_id))
    }
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
