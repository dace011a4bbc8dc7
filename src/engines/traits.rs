// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 非成功状态码
    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

/// 抓取请求
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// 目标URL
    pub url: String,
    /// 额外请求头
    pub headers: HashMap<String, String>,
}

impl FetchRequest {
    /// 创建不带额外请求头的GET请求
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
        }
    }
}

/// 抓取响应
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP状态码
    pub status_code: u16,
    /// 内容类型
    pub content_type: String,
    /// 响应体
    pub body: Bytes,
    /// 响应时间（毫秒）
    pub response_time_ms: u64,
}

impl FetchResponse {
    /// 是否为2xx状态码
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// 以UTF-8文本读取响应体，非法字节被替换
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP引擎特质
///
/// 所有出站请求的传输层接缝；引擎原样返回任何状态码，
/// 由调用方决定非成功状态的处理方式
#[async_trait]
pub trait HttpEngine: Send + Sync {
    /// 执行GET请求
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}
