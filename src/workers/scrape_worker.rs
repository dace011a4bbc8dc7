// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use futures::FutureExt;
use metrics::counter;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::domain::models::catalog::{Revision, ScrapeResult};
use crate::domain::models::job::ScrapeJob;
use crate::domain::repositories::persistence_sink::{PersistenceSink, SinkError};
use crate::domain::services::catalog_scraper::CatalogScraper;
use crate::queue::job_queue::JobQueue;
use crate::utils::errors::JobError;
use crate::workers::events::{EventBus, QueueEvent};

const STATUS_FETCHING: &str = "Fetching catalog data...";
const STATUS_SAVING: &str = "Saving to storage...";

/// 抓取队列
///
/// 单个后台工作器按先进先出顺序逐个处理任务。
/// 空闲时入队会启动工作器，运行中入队只追加任务；
/// 队列为空或收到取消请求后工作器先清除运行标记，再发布 `QueueEmptied`。
/// 任务内的 panic 只会让该任务失败，队列继续处理后续任务。
///
/// 工作器通过 `tokio::spawn` 启动，因此 `enqueue` 必须在 Tokio 运行时内调用
#[derive(Clone)]
pub struct ScrapeQueue {
    inner: Arc<Inner>,
}

struct Inner {
    jobs: JobQueue,
    scraper: Arc<CatalogScraper>,
    sink: Arc<dyn PersistenceSink>,
    events: EventBus,
    running: AtomicBool,
    cancel: AtomicBool,
}

impl ScrapeQueue {
    /// 创建新的抓取队列
    ///
    /// # 参数
    ///
    /// * `scraper` - 目录抓取器
    /// * `sink` - 每个成功结果的持久化目标
    pub fn new(scraper: Arc<CatalogScraper>, sink: Arc<dyn PersistenceSink>) -> Self {
        Self {
            inner: Arc::new(Inner {
                jobs: JobQueue::new(),
                scraper,
                sink,
                events: EventBus::new(),
                running: AtomicBool::new(false),
                cancel: AtomicBool::new(false),
            }),
        }
    }

    /// 事件总线，用于订阅队列通知
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// 入队抓取请求
    ///
    /// # 参数
    ///
    /// * `identifier` - 套装编号
    /// * `quantity` - 拥有数量，小于1时按1处理
    /// * `revision` - 清单版本
    pub fn enqueue(&self, identifier: &str, quantity: u32, revision: Revision) {
        self.enqueue_job(ScrapeJob::new(identifier, quantity, revision));
    }

    /// 入队已构建的任务
    pub fn enqueue_job(&self, job: ScrapeJob) {
        info!(
            "Queued {} (qty {}, {}) as job {}",
            job.identifier, job.quantity, job.revision, job.id
        );
        self.inner.jobs.push(job);

        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.inner.cancel.store(false, Ordering::SeqCst);
            self.inner.events.publish(QueueEvent::WorkerStarted);
            tokio::spawn(self.inner.clone().drain());
        }
    }

    /// 请求取消
    ///
    /// 当前任务会执行完毕，之后工作器停止，剩余任务保留在队列中，
    /// 直到下一次入队重新启动工作器
    pub fn cancel(&self) {
        info!("Cancellation requested");
        self.inner.cancel.store(true, Ordering::SeqCst);
    }

    /// 等待中的任务数（不含正在处理的任务）
    pub fn len(&self) -> usize {
        self.inner.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.jobs.is_empty()
    }

    /// 工作器是否在运行
    pub fn is_processing(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }
}

impl Inner {
    async fn drain(self: Arc<Self>) {
        info!("Queue worker started");

        loop {
            while !self.cancel.load(Ordering::SeqCst) {
                let Some(job) = self.jobs.pop() else { break };
                self.process(job).await;
            }

            self.running.store(false, Ordering::SeqCst);

            // A job pushed after the last pop may have missed the running flag
            let reclaimed = !self.cancel.load(Ordering::SeqCst)
                && !self.jobs.is_empty()
                && self
                    .running
                    .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok();
            if !reclaimed {
                break;
            }
        }

        info!("Queue worker stopping ({} jobs left)", self.jobs.len());
        self.events.publish(QueueEvent::QueueEmptied);
    }

    #[instrument(skip(self, job), fields(job_id = %job.id, identifier = %job.identifier))]
    async fn process(&self, job: ScrapeJob) {
        self.events.publish(QueueEvent::JobStarted {
            identifier: job.identifier.clone(),
            status: STATUS_FETCHING.to_string(),
        });

        // A panic in the scraper or the sink fails this job only
        let outcome = AssertUnwindSafe(self.run(&job))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(JobError::Panicked));

        match outcome {
            Ok(result) => {
                let component_count = result.lines.len();
                info!(
                    "Completed {} ({}) with {} parts",
                    job.identifier, result.entity.display_name, component_count
                );
                counter!("jobs_completed_total").increment(1);
                self.events.publish(QueueEvent::JobCompleted {
                    identifier: job.identifier.clone(),
                    display_name: result.entity.display_name.clone(),
                    component_count,
                    status: format!("Successfully added {} parts", component_count),
                    result: Arc::new(result),
                });
            }
            Err(e) => {
                error!("Job for {} failed: {}", job.identifier, e);
                counter!("jobs_failed_total").increment(1);
                self.events.publish(QueueEvent::JobFailed {
                    identifier: job.identifier.clone(),
                    status: format!("Error: {}", e),
                });
            }
        }
    }

    async fn run(&self, job: &ScrapeJob) -> Result<ScrapeResult, JobError> {
        let mut result = self.scraper.scrape(&job.identifier, job.revision).await?;
        result.entity.stamp(job.quantity, job.revision);

        self.events.publish(QueueEvent::JobStarted {
            identifier: job.identifier.clone(),
            status: STATUS_SAVING.to_string(),
        });
        self.persist(&result).await?;

        Ok(result)
    }

    async fn persist(&self, result: &ScrapeResult) -> Result<(), SinkError> {
        let entity = &result.entity;
        self.sink.put_entity(entity).await?;
        for line in &result.lines {
            self.sink.put_component(line).await?;
            self.sink
                .put_inventory_link(
                    &entity.identifier,
                    &line.part_number,
                    line.color_id,
                    line.quantity,
                )
                .await?;
        }
        Ok(())
    }
}
