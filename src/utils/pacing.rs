// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// 停顿时间窗口
///
/// 随机停顿在 `[min, max]` 区间内取值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PauseWindow {
    /// 最短停顿
    pub min: Duration,
    /// 最长停顿
    pub max: Duration,
}

impl PauseWindow {
    /// 以毫秒构建停顿窗口
    pub fn from_millis(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_millis(min),
            max: Duration::from_millis(max),
        }
    }
}

/// 停顿策略特质
///
/// 抓取过程中的随机停顿由策略决定，测试中可替换为零停顿
pub trait DelayStrategy: Send + Sync {
    /// 在窗口内选择本次停顿时长
    fn pick(&self, window: &PauseWindow) -> Duration;
}

/// 随机停顿策略，模拟浏览器访问节奏
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomDelay;

impl DelayStrategy for RandomDelay {
    fn pick(&self, window: &PauseWindow) -> Duration {
        let min = window.min.as_millis() as u64;
        let max = window.max.as_millis() as u64;
        if max <= min {
            return window.min;
        }
        Duration::from_millis(rand::random_range(min..=max))
    }
}

/// 零停顿策略
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

impl DelayStrategy for NoDelay {
    fn pick(&self, _window: &PauseWindow) -> Duration {
        Duration::ZERO
    }
}

/// 按策略执行一次停顿
///
/// # 参数
///
/// * `strategy` - 停顿策略
/// * `window` - 停顿窗口
/// * `reason` - 日志中的停顿原因
pub async fn pause(strategy: &dyn DelayStrategy, window: &PauseWindow, reason: &str) {
    let delay = strategy.pick(window);
    if delay.is_zero() {
        return;
    }
    debug!("Pausing {}ms ({})", delay.as_millis(), reason);
    sleep(delay).await;
}
