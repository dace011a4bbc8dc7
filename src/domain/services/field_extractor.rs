// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// 发布年份标签
const YEAR_LABEL: &str = "Year Released:";

/// 颜色名称的结尾词
///
/// 目录中的描述把颜色和零件名连在一起（如 "Trans-Clear Brick 2 x 2"），
/// 只能靠一组总是出现在颜色短语末尾的词来定位颜色结束的位置。
/// "Trans"、"Opaque" 等前缀不会是颜色名的最后一个词，因此不在表中
const TERMINAL_COLOR_WORDS: &[&str] = &[
    // Metallic
    "Brass", "Silver", "Gold", "Copper",
    // Grayscale
    "Gray", "Grey",
    // Hues
    "Green", "Blue", "Red", "Yellow", "Orange", "Pink", "Purple", "Violet", "Brown",
    // Neutrals
    "Tan", "Black", "White",
    // Special named colors
    "Aqua", "Azure", "Lavender", "Magenta", "Lime", "Coral", "Turquoise", "Nougat",
    "Salmon", "Lilac", "Sienna", "Umber", "Rust",
    // Transparency
    "Clear",
];

static YEAR_LINK: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"a.links[href*="itemYear="]"#).expect("valid year link selector")
});

static INVENTORY_LINK: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"a[href*="catalogItemInv.asp"]"#).expect("valid inventory link selector")
});

static PIECE_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d+)\s*Parts\b").expect("valid piece count regex"));

static DIMENSIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*x\s*(\d+)").expect("valid dimensions regex"));

/// 提取元素的可见文本
pub fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// 提取发布年份
///
/// 找到包含 "Year Released:" 的文本节点，在其父元素中查找
/// 指向 `itemYear=` 的链接，并把链接文本解析为整数
///
/// # 返回值
///
/// 标签、链接或整数解析任一缺失时返回 `None`
pub fn extract_release_year(doc: &Html) -> Option<i32> {
    doc.root_element()
        .descendants()
        .filter(|node| {
            node.value()
                .as_text()
                .is_some_and(|text| text.contains(YEAR_LABEL))
        })
        .filter_map(|node| node.parent().and_then(ElementRef::wrap))
        .find_map(|parent| {
            parent
                .select(&YEAR_LINK)
                .next()
                .and_then(|link| element_text(&link).parse::<i32>().ok())
        })
}

/// 提取零件数量
///
/// 查找指向清单页且文本形如 `<数字> Parts` 的链接
///
/// # 返回值
///
/// 未找到匹配链接或数字无法解析时返回 `None`
pub fn extract_piece_count(doc: &Html) -> Option<u32> {
    doc.select(&INVENTORY_LINK).find_map(|link| {
        let text = element_text(&link);
        PIECE_COUNT
            .captures(&text)
            .and_then(|caps| caps[1].parse::<u32>().ok())
    })
}

/// 拆分颜色名称和零件名称
///
/// 按空格和连字符分词，从左到右找到第一个颜色结尾词，
/// 颜色名是原文从开头到该词结尾的部分（保留原有空格和连字符）。
/// 零件名始终是完整的原始描述
///
/// # 返回值
///
/// `(颜色名, 零件名)`；没有匹配时颜色名为空
pub fn split_color_and_part_name(description: &str) -> (String, String) {
    let part_name = description.to_string();

    let mut token_start: Option<usize> = None;
    let mut color_end: Option<usize> = None;

    let is_separator = |c: char| c == ' ' || c == '-';
    let boundaries = description
        .char_indices()
        .chain(std::iter::once((description.len(), ' ')));

    for (idx, c) in boundaries {
        if is_separator(c) {
            if let Some(start) = token_start.take() {
                let token = &description[start..idx];
                if is_terminal_color_word(token) {
                    color_end = Some(idx);
                    break;
                }
            }
        } else if token_start.is_none() {
            token_start = Some(idx);
        }
    }

    match color_end {
        Some(end) => (description[..end].trim().to_string(), part_name),
        None => (String::new(), part_name),
    }
}

fn is_terminal_color_word(token: &str) -> bool {
    TERMINAL_COLOR_WORDS
        .iter()
        .any(|word| word.eq_ignore_ascii_case(token))
}

/// 解析零件尺寸
///
/// 取零件名中第一个 `<整数> x <整数>` 模式
///
/// # 返回值
///
/// `(长度, 宽度)`，没有匹配时为 `(0, 0)`
pub fn parse_dimensions(part_name: &str) -> (u32, u32) {
    DIMENSIONS
        .captures(part_name)
        .and_then(|caps| {
            let length = caps[1].parse::<u32>().ok()?;
            let width = caps[2].parse::<u32>().ok()?;
            Some((length, width))
        })
        .unwrap_or((0, 0))
}

#[cfg(test)]
#[path = "field_extractor_test.rs"]
mod tests;
