// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 目录抓取（catalog_scraper）：抓取详情页和清单页并组装结果
/// - 字段提取（field_extractor）：年份、零件数、颜色与尺寸的解析规则
/// - 图片下载（image_fetcher）：分批并发下载图片
/// - 版本检测（revision_detector）：判断套装是否存在旧版清单
pub mod catalog_scraper;
pub mod field_extractor;
pub mod image_fetcher;
pub mod revision_detector;
