//! 后台多文件替换
//!
//! 只处理用户勾选的匹配。已打开的文件不写盘，替换后的内容通过
//! `OpenedFileHandled` 交还给前台；其余文件直接写回磁盘。

use super::engine::MatchEngine;
use super::task::{JobRunner, RunContext};
use super::{load_text, Loaded};
use crate::core::Service;
use crate::kernel::services::ports::config::SearchSettings;
use crate::kernel::services::ports::file::FileProvider;
use crate::kernel::services::ports::search::{
    FileOutcome, FinishReason, JobEvent, JobEventKind, JobKind, JobProgress, ReplaceTarget,
    SearchContext,
};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

pub struct ReplaceJob {
    runner: JobRunner,
    files: Arc<dyn FileProvider>,
    progress_step: usize,
    skip_binary: bool,
}

impl ReplaceJob {
    pub fn new(
        runtime: tokio::runtime::Handle,
        files: Arc<dyn FileProvider>,
        settings: &SearchSettings,
    ) -> Self {
        Self {
            runner: JobRunner::new(JobKind::Replace, runtime),
            files,
            progress_step: settings.progress_step(),
            skip_binary: settings.skip_binary,
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

    pub fn replace(&mut self, context: Arc<SearchContext>, targets: Vec<ReplaceTarget>) -> u64 {
        let files = self.files.clone();
        let progress_step = self.progress_step;
        let skip_binary = self.skip_binary;
        let run_id = self.runner.spawn(move |ctx| {
            run_replace(
                ctx,
                &context,
                files.as_ref(),
                targets,
                progress_step,
                skip_binary,
            )
        });
        tracing::debug!(service = self.name(), run_id, "replace started");
        run_id
    }

    pub fn stop(&mut self) {
        self.runner.stop();
    }
}

impl Service for ReplaceJob {
    fn name(&self) -> &'static str {
        "ReplaceJob"
    }
}

fn run_replace(
    ctx: &RunContext,
    context: &SearchContext,
    files: &dyn FileProvider,
    targets: Vec<ReplaceTarget>,
    progress_step: usize,
    skip_binary: bool,
) -> FinishReason {
    let total = targets.len();
    let mut outcomes = Vec::with_capacity(total);
    let mut reason = FinishReason::Completed;

    for (index, target) in targets.into_iter().enumerate() {
        if ctx.is_cancelled() {
            reason = FinishReason::Cancelled;
            break;
        }

        outcomes.push(replace_file(ctx, context, files, target, skip_binary));

        let completed = index + 1;
        if completed % progress_step == 0 || completed == total {
            ctx.emit(JobEventKind::Progress(JobProgress { completed, total }));
        }
    }

    let replaced: usize = outcomes.iter().map(|o| o.replacements).sum();
    tracing::info!(
        run_id = ctx.run_id(),
        files = outcomes.len(),
        replaced,
        ?reason,
        "replace finished"
    );
    ctx.emit(JobEventKind::ResultsHandled(outcomes));
    reason
}

fn replace_file(
    ctx: &RunContext,
    context: &SearchContext,
    files: &dyn FileProvider,
    target: ReplaceTarget,
    skip_binary: bool,
) -> FileOutcome {
    let ReplaceTarget { path, matches } = target;
    let opened = context.opened_file(&path).is_some();

    let fail = |path: PathBuf, message: String| {
        tracing::warn!(path = %path.display(), error = %message, "replace failed");
        ctx.emit(JobEventKind::Error {
            path: Some(path.clone()),
            message: message.clone(),
        });
        FileOutcome::error(path, message)
    };

    let text = match load_text(context, files, &path, skip_binary) {
        Ok(Loaded::Text(text)) => text,
        Ok(Loaded::Binary) => return FileOutcome::skipped(path, "binary file"),
        Err(e) => return fail(path, e.to_string()),
    };

    let engine = MatchEngine::new(context.pattern());
    let (new_text, count) = match engine.replace_selected(&text, context.replacement(), &matches) {
        Ok(result) => result,
        Err(e) => return fail(path, e.to_string()),
    };
    if count == 0 {
        return FileOutcome::skipped(path, "no checked matches left");
    }

    if opened {
        ctx.emit(JobEventKind::OpenedFileHandled {
            path: path.clone(),
            content: new_text.clone(),
        });
        return FileOutcome::replaced(path, count, Some(new_text));
    }

    match files.write_file(&path, &new_text) {
        Ok(()) => FileOutcome::replaced(path, count, None),
        Err(e) => fail(path, e.to_string()),
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/search/replace.rs"]
mod tests;
