// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{EngineError, FetchRequest, FetchResponse, HttpEngine};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Instant;

/// 抓取引擎
///
/// 基于reqwest实现的HTTP引擎，所有请求共用一个客户端和浏览器 User-Agent。
/// 不设置请求超时，挂起的连接由传输层自身的错误结束
pub struct ReqwestEngine {
    client: reqwest::Client,
}

impl ReqwestEngine {
    /// 创建新的引擎实例
    ///
    /// # 参数
    ///
    /// * `user_agent` - 浏览器风格的 User-Agent
    ///
    /// # 返回值
    ///
    /// * `Ok(ReqwestEngine)` - 引擎实例
    /// * `Err(EngineError)` - 客户端构建失败
    pub fn new(user_agent: &str) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpEngine for ReqwestEngine {
    /// 执行HTTP抓取
    ///
    /// # 参数
    ///
    /// * `request` - 抓取请求
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchResponse)` - 任意状态码的响应
    /// * `Err(EngineError)` - 传输失败
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError> {
        // Build headers
        let mut headers = HeaderMap::new();
        for (k, v) in &request.headers {
            if let (Ok(k), Ok(v)) = (
                HeaderName::from_bytes(k.as_bytes()),
                HeaderValue::from_str(v),
            ) {
                headers.insert(k, v);
            }
        }

        let start = Instant::now();
        let response = self
            .client
            .get(&request.url)
            .headers(headers)
            .send()
            .await?;

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        let body = response.bytes().await?;

        Ok(FetchResponse {
            status_code,
            content_type,
            body,
            response_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// 获取引擎名称
    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
