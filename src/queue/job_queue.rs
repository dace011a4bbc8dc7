// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::domain::models::job::ScrapeJob;

/// 内存任务队列
///
/// 严格先进先出，可在任意线程入队
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: Mutex<VecDeque<ScrapeJob>>,
}

impl JobQueue {
    /// 创建空队列
    pub fn new() -> Self {
        Self::default()
    }

    /// 入队任务
    ///
    /// # 返回值
    ///
    /// 入队后的队列长度
    pub fn push(&self, job: ScrapeJob) -> usize {
        let mut jobs = self.jobs.lock();
        jobs.push_back(job);
        jobs.len()
    }

    /// 出队最早的任务
    pub fn pop(&self) -> Option<ScrapeJob> {
        self.jobs.lock().pop_front()
    }

    /// 等待中的任务数
    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// 等待中任务的快照，按出队顺序排列
    pub fn snapshot(&self) -> Vec<ScrapeJob> {
        self.jobs.lock().iter().cloned().collect()
    }
}
