// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

use crate::domain::models::catalog::ScrapeResult;

/// 队列生命周期事件
#[derive(Debug, Clone)]
pub enum QueueEvent {
    /// 工作器从空闲转为运行
    WorkerStarted,
    /// 任务进入某个阶段
    JobStarted { identifier: String, status: String },
    /// 任务成功并已持久化
    JobCompleted {
        identifier: String,
        display_name: String,
        component_count: usize,
        status: String,
        result: Arc<ScrapeResult>,
    },
    /// 任务失败，队列继续
    JobFailed { identifier: String, status: String },
    /// 工作器停止（队列为空或已取消）
    ///
    /// 发布时 `is_processing()` 已为 `false`；与停止同时发生的入队
    /// 可能已经启动下一个工作器
    QueueEmptied,
}

impl QueueEvent {
    /// 事件名称，用于日志
    pub fn name(&self) -> &'static str {
        match self {
            QueueEvent::WorkerStarted => "worker_started",
            QueueEvent::JobStarted { .. } => "started",
            QueueEvent::JobCompleted { .. } => "completed",
            QueueEvent::JobFailed { .. } => "failed",
            QueueEvent::QueueEmptied => "queue_emptied",
        }
    }
}

type Listener = Arc<dyn Fn(&QueueEvent) + Send + Sync>;

/// 事件总线
///
/// 监听器在工作器任务中同步调用，需要切换执行上下文时由调用方自行转发
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<Vec<Listener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册回调监听器
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&QueueEvent) + Send + Sync + 'static,
    {
        self.listeners.write().push(Arc::new(listener));
    }

    /// 注册通道监听器
    ///
    /// 接收端被丢弃后发送失败会被忽略
    pub fn subscribe_channel(&self) -> mpsc::UnboundedReceiver<QueueEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribe(move |event| {
            let _ = tx.send(event.clone());
        });
        rx
    }

    /// 发布事件
    ///
    /// 某个监听器 panic 时记录日志，其余监听器照常收到事件
    pub fn publish(&self, event: QueueEvent) {
        // Clone the list so listeners may subscribe without deadlocking
        let listeners: Vec<Listener> = self.listeners.read().clone();
        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(&event))).is_err() {
                warn!("Listener panicked while handling {}", event.name());
            }
        }
    }
}
