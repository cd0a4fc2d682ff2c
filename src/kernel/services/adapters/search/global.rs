//! 全局搜索任务
//!
//! 先完整枚举候选文件（总数稳定后再报告进度），再按发现顺序逐个扫描。
//! 已打开的文件从快照读取，不访问磁盘。

use super::engine::MatchEngine;
use super::task::{JobRunner, RunContext};
use super::{load_text, Loaded};
use crate::core::Service;
use crate::kernel::services::ports::config::SearchSettings;
use crate::kernel::services::ports::file::{FileEnumerator, FileProvider};
use crate::kernel::services::ports::mode::Scope;
use crate::kernel::services::ports::search::{
    FileMatches, FileOutcome, FinishReason, JobEvent, JobEventKind, JobKind, JobProgress, Result,
    SearchContext, SearchError,
};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard};

type SharedResults = Arc<Mutex<Vec<FileMatches>>>;

fn lock_results(results: &Mutex<Vec<FileMatches>>) -> MutexGuard<'_, Vec<FileMatches>> {
    results.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Clone, Copy)]
struct ScanOptions {
    progress_step: usize,
    skip_binary: bool,
}

pub struct SearchJob {
    runner: JobRunner,
    files: Arc<dyn FileProvider>,
    enumerator: Arc<dyn FileEnumerator>,
    options: ScanOptions,
    results: SharedResults,
}

impl SearchJob {
    pub fn new(
        runtime: tokio::runtime::Handle,
        files: Arc<dyn FileProvider>,
        enumerator: Arc<dyn FileEnumerator>,
        settings: &SearchSettings,
    ) -> Self {
        Self {
            runner: JobRunner::new(JobKind::Search, runtime),
            files,
            enumerator,
            options: ScanOptions {
                progress_step: settings.progress_step(),
                skip_binary: settings.skip_binary,
            },
            results: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn subscribe(&self) -> Receiver<JobEvent> {
        self.runner.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.runner.is_running()
    }

    pub fn active_run_id(&self) -> Option<u64> {
        self.runner.active_run_id()
    }

    /// 停掉上一轮并开始新的搜索，返回 `run_id`
    pub fn start(&mut self, context: Arc<SearchContext>) -> u64 {
        self.runner.stop();
        lock_results(&self.results).clear();

        let files = self.files.clone();
        let enumerator = self.enumerator.clone();
        let results = self.results.clone();
        let options = self.options;
        let run_id = self.runner.spawn(move |ctx| {
            run_search(ctx, &context, files.as_ref(), enumerator.as_ref(), options, &results)
        });
        tracing::debug!(service = self.name(), run_id, "search started");
        run_id
    }

    pub fn stop(&mut self) {
        self.runner.stop();
    }

    /// 丢弃上一轮保留的结果；运行中拒绝
    pub fn clear(&mut self) -> Result<()> {
        if self.runner.is_running() {
            return Err(SearchError::JobRunning);
        }
        lock_results(&self.results).clear();
        Ok(())
    }

    pub fn results(&self) -> Vec<FileMatches> {
        lock_results(&self.results).clone()
    }
}

impl Service for SearchJob {
    fn name(&self) -> &'static str {
        "SearchJob"
    }
}

fn run_search(
    ctx: &RunContext,
    context: &SearchContext,
    files: &dyn FileProvider,
    enumerator: &dyn FileEnumerator,
    options: ScanOptions,
    results: &Mutex<Vec<FileMatches>>,
) -> FinishReason {
    if context.pattern().is_empty() {
        return FinishReason::Completed;
    }

    let masks = context.file_masks();
    let candidates: Vec<PathBuf> = match context.scope() {
        Some(Scope::OpenedFiles) => context
            .opened_files()
            .keys()
            .filter(|path| masks.matches(path))
            .cloned()
            .collect(),
        Some(Scope::Directory) => {
            let mut found = Vec::new();
            for path in enumerator.candidates(context.search_path(), masks) {
                if ctx.is_cancelled() {
                    return FinishReason::Cancelled;
                }
                found.push(path);
            }
            found
        }
        scope => {
            let message = match scope {
                Some(scope) => format!("{scope:?} scope is not searched in the background"),
                None => "no search scope selected".to_string(),
            };
            ctx.emit(JobEventKind::Error { path: None, message });
            return FinishReason::Failed;
        }
    };

    let total = candidates.len();
    let engine = MatchEngine::new(context.pattern());
    let mut matched_files = 0usize;
    let mut total_matches = 0usize;

    if total == 0 {
        ctx.emit(JobEventKind::Progress(JobProgress { completed: 0, total }));
    }

    for (index, path) in candidates.into_iter().enumerate() {
        if ctx.is_cancelled() {
            tracing::info!(run_id = ctx.run_id(), searched = index, total, "search cancelled");
            return FinishReason::Cancelled;
        }

        match load_text(context, files, &path, options.skip_binary) {
            Ok(Loaded::Text(text)) => {
                let matches = engine.find_all(&text);
                if !matches.is_empty() {
                    matched_files += 1;
                    total_matches += matches.len();
                    let file_matches = FileMatches { path, matches };
                    lock_results(results).push(file_matches.clone());
                    ctx.emit(JobEventKind::FileMatches(file_matches));
                }
            }
            Ok(Loaded::Binary) => {
                ctx.emit(JobEventKind::FileOutcome(FileOutcome::skipped(
                    path,
                    "binary file",
                )));
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read file for search");
                let message = e.to_string();
                ctx.emit(JobEventKind::FileOutcome(FileOutcome::error(path, message)));
            }
        }

        let completed = index + 1;
        if completed % options.progress_step == 0 || completed == total {
            ctx.emit(JobEventKind::Progress(JobProgress { completed, total }));
        }
    }

    tracing::info!(
        run_id = ctx.run_id(),
        files = total,
        matched_files,
        total_matches,
        "search finished"
    );
    FinishReason::Completed
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/search/global.rs"]
mod tests;
