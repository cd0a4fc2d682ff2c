//! 可取消的后台任务
//!
//! 每次运行分配一个全局递增的 `run_id`，事件在运行内按 `seq` 递增编号。
//! 新一轮运行开始前总会先阻塞等待上一轮结束，所以上一轮的 `Finished`
//! 一定先于下一轮的 `Started` 送达订阅者。

use crate::kernel::services::ports::search::{FinishReason, JobEvent, JobEventKind, JobKind};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

static RUN_ID: AtomicU64 = AtomicU64::new(1);

fn next_run_id() -> u64 {
    RUN_ID.fetch_add(1, Ordering::Relaxed)
}

type Subscribers = Arc<Mutex<Vec<Sender<JobEvent>>>>;

fn lock_subscribers(subscribers: &Mutex<Vec<Sender<JobEvent>>>) -> MutexGuard<'_, Vec<Sender<JobEvent>>> {
    subscribers
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 传给任务体的运行上下文
pub struct RunContext {
    job: JobKind,
    run_id: u64,
    seq: AtomicU64,
    cancelled: Arc<AtomicBool>,
    subscribers: Subscribers,
}

impl RunContext {
    pub fn job(&self) -> JobKind {
        self.job
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn emit(&self, kind: JobEventKind) {
        let mut subscribers = lock_subscribers(&self.subscribers);
        // 持锁分配序号，保证送达顺序与编号一致
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let event = JobEvent {
            job: self.job,
            run_id: self.run_id,
            seq,
            kind,
        };
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

struct ActiveRun {
    run_id: u64,
    cancelled: Arc<AtomicBool>,
    handle: tokio::task::JoinHandle<()>,
}

pub struct JobRunner {
    kind: JobKind,
    runtime: tokio::runtime::Handle,
    subscribers: Subscribers,
    active: Option<ActiveRun>,
}

impl JobRunner {
    pub fn new(kind: JobKind, runtime: tokio::runtime::Handle) -> Self {
        Self {
            kind,
            runtime,
            subscribers: Arc::new(Mutex::new(Vec::new())),
            active: None,
        }
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn subscribe(&self) -> Receiver<JobEvent> {
        let (tx, rx) = mpsc::channel();
        lock_subscribers(&self.subscribers).push(tx);
        rx
    }

    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }

    pub fn active_run_id(&self) -> Option<u64> {
        self.active.as_ref().map(|active| active.run_id)
    }

    /// 停掉上一轮后在阻塞线程池上运行 `work`，返回新的 `run_id`
    pub fn spawn<F>(&mut self, work: F) -> u64
    where
        F: FnOnce(&RunContext) -> FinishReason + Send + 'static,
    {
        self.stop();

        let run_id = next_run_id();
        let cancelled = Arc::new(AtomicBool::new(false));
        let ctx = RunContext {
            job: self.kind,
            run_id,
            seq: AtomicU64::new(0),
            cancelled: cancelled.clone(),
            subscribers: self.subscribers.clone(),
        };
        ctx.emit(JobEventKind::Started);

        let handle = self.runtime.spawn_blocking(move || {
            let reason = match catch_unwind(AssertUnwindSafe(|| work(&ctx))) {
                Ok(reason) => reason,
                Err(_) => {
                    tracing::error!(job = ?ctx.job, run_id, "background job panicked");
                    ctx.emit(JobEventKind::Error {
                        path: None,
                        message: format!("{:?} job failed unexpectedly", ctx.job),
                    });
                    FinishReason::Failed
                }
            };
            tracing::debug!(job = ?ctx.job, run_id, ?reason, "background job finished");
            ctx.emit(JobEventKind::Finished(reason));
        });

        self.active = Some(ActiveRun {
            run_id,
            cancelled,
            handle,
        });
        run_id
    }

    /// 请求取消并阻塞等待任务退出；空闲时什么也不做
    ///
    /// 不能在 runtime 的异步上下文中调用。
    pub fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        active.cancelled.store(true, Ordering::Relaxed);
        if let Err(e) = self.runtime.block_on(active.handle) {
            tracing::warn!(
                job = ?self.kind,
                run_id = active.run_id,
                error = %e,
                "background job did not exit cleanly"
            );
        }
    }
}

impl Drop for JobRunner {
    fn drop(&mut self) {
        if let Some(active) = &self.active {
            active.cancelled.store(true, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/search/task.rs"]
mod tests;
