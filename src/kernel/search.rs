//! 搜索/替换控制器
//!
//! 前台唯一的状态持有者：模式、用户输入、两个后台任务，以及注入的视图、
//! 结果列表和状态栏。后台任务只通过事件通道回报，由 `pump_events` 在前台
//! 消费，所以结果列表和文档只在前台被修改。

use crate::kernel::services::adapters::file::{LocalFileProvider, WalkEnumerator};
use crate::kernel::services::adapters::search::{
    MatchEngine, ReplaceJob, ReplacementTemplate, SearchJob,
};
use crate::kernel::services::ports::config::SearchSettings;
use crate::kernel::services::ports::document::{Document, UndoGroup, Workspace};
use crate::kernel::services::ports::mode::{Mode, Operation, Scope};
use crate::kernel::services::ports::search::{
    FileMasks, FileStatus, FinishReason, JobEvent, JobEventKind, JobKind, JobProgress, Match,
    PatternFlags, Result, SearchContext, SearchError, SearchPattern,
};
use crate::kernel::services::ports::view::{
    ActionsState, ResultsSink, SearchView, StatusSink, VisualState,
};
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

/// 去重的输入历史，最新的在最前
#[derive(Debug, Clone)]
pub struct InputHistory {
    entries: VecDeque<String>,
    limit: usize,
}

impl InputHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
        }
    }

    pub fn remember(&mut self, text: &str) {
        if text.is_empty() || self.limit == 0 {
            return;
        }
        self.entries.retain(|entry| entry != text);
        self.entries.push_front(text.to_string());
        self.entries.truncate(self.limit);
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.front().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchInputs {
    pub search_text: String,
    pub replace_text: String,
    pub search_path: PathBuf,
    pub mask_text: String,
    pub regex: bool,
    pub case_sensitive: bool,
}

impl SearchInputs {
    pub fn flags(&self) -> PatternFlags {
        PatternFlags {
            regex: self.regex,
            case_sensitive: self.case_sensitive,
        }
    }
}

enum DocumentOutcome {
    NoDocument,
    Found,
    NotFound,
    Failed(SearchError),
}

pub struct SearchController<W: Workspace> {
    workspace: W,
    view: Rc<dyn SearchView>,
    results: Rc<dyn ResultsSink>,
    status: Rc<dyn StatusSink>,
    search_job: SearchJob,
    replace_job: ReplaceJob,
    search_events: Receiver<JobEvent>,
    replace_events: Receiver<JobEvent>,
    settings: SearchSettings,
    mode: Mode,
    inputs: SearchInputs,
    search_history: InputHistory,
    replace_history: InputHistory,
    mask_history: InputHistory,
    visual_state: VisualState,
    search_run: Option<u64>,
    replace_run: Option<u64>,
}

impl<W: Workspace> SearchController<W> {
    pub fn new(
        workspace: W,
        view: Rc<dyn SearchView>,
        results: Rc<dyn ResultsSink>,
        status: Rc<dyn StatusSink>,
        search_job: SearchJob,
        replace_job: ReplaceJob,
        settings: SearchSettings,
    ) -> Self {
        let search_events = search_job.subscribe();
        let replace_events = replace_job.subscribe();
        let inputs = SearchInputs {
            mask_text: settings.default_masks.join(" "),
            ..SearchInputs::default()
        };
        let limit = settings.history_limit;
        Self {
            workspace,
            view,
            results,
            status,
            search_job,
            replace_job,
            search_events,
            replace_events,
            settings,
            mode: Mode::Hidden,
            inputs,
            search_history: InputHistory::new(limit),
            replace_history: InputHistory::new(limit),
            mask_history: InputHistory::new(limit),
            visual_state: VisualState::Normal,
            search_run: None,
            replace_run: None,
        }
    }

    /// 使用本地文件系统构造两个后台任务
    pub fn with_runtime(
        workspace: W,
        view: Rc<dyn SearchView>,
        results: Rc<dyn ResultsSink>,
        status: Rc<dyn StatusSink>,
        runtime: tokio::runtime::Handle,
        settings: SearchSettings,
    ) -> Self {
        let files = Arc::new(LocalFileProvider::new());
        let enumerator = Arc::new(WalkEnumerator::new(&settings));
        let search_job = SearchJob::new(runtime.clone(), files.clone(), enumerator, &settings);
        let replace_job = ReplaceJob::new(runtime, files, &settings);
        Self::new(
            workspace,
            view,
            results,
            status,
            search_job,
            replace_job,
            settings,
        )
    }

    pub fn workspace(&self) -> &W {
        &self.workspace
    }

    pub fn workspace_mut(&mut self) -> &mut W {
        &mut self.workspace
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn inputs(&self) -> &SearchInputs {
        &self.inputs
    }

    pub fn visual_state(&self) -> VisualState {
        self.visual_state
    }

    pub fn search_history(&self) -> &InputHistory {
        &self.search_history
    }

    pub fn replace_history(&self) -> &InputHistory {
        &self.replace_history
    }

    pub fn mask_history(&self) -> &InputHistory {
        &self.mask_history
    }

    pub fn is_searching(&self) -> bool {
        self.search_job.is_running()
    }

    pub fn is_replacing(&self) -> bool {
        self.replace_job.is_running()
    }

    // ---- inputs ----

    pub fn set_search_text(&mut self, text: &str) {
        self.inputs.search_text = text.to_string();
        self.on_pattern_changed();
    }

    pub fn set_replace_text(&mut self, text: &str) {
        self.inputs.replace_text = text.to_string();
    }

    pub fn set_search_path(&mut self, path: impl Into<PathBuf>) {
        self.inputs.search_path = path.into();
    }

    pub fn set_mask_text(&mut self, text: &str) {
        self.inputs.mask_text = text.to_string();
    }

    pub fn set_regex(&mut self, regex: bool) {
        self.inputs.regex = regex;
        self.on_pattern_changed();
    }

    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        self.inputs.case_sensitive = case_sensitive;
        self.on_pattern_changed();
    }

    /// 用当前选项编译搜索框中的文本
    pub fn validate_pattern(&self) -> Result<SearchPattern> {
        SearchPattern::compile(&self.inputs.search_text, self.inputs.flags())
    }

    fn on_pattern_changed(&mut self) {
        match self.validate_pattern() {
            Ok(pattern) => {
                if self.visual_state == VisualState::Incorrect {
                    self.status.clear_message();
                }
                self.update_actions(!pattern.is_empty());
                if pattern.is_empty() {
                    self.set_visual_state(VisualState::Normal);
                } else if self.mode.is_current_file() && self.has_document() {
                    self.search_with(&pattern, true, true);
                } else {
                    self.set_visual_state(VisualState::Normal);
                }
            }
            Err(e) => self.report_invalid_pattern(&e),
        }
    }

    // ---- mode ----

    pub fn set_mode(&mut self, mode: Mode) {
        if mode == self.mode && self.view.is_visible() && !self.document_has_focus() {
            self.view.focus_search_input();
            return;
        }
        if !mode.is_visible() {
            self.hide();
            return;
        }

        let old = self.mode;
        tracing::debug!(?old, new = ?mode, "search mode changed");
        self.stop_jobs();
        if old.is_multi_file() || mode.is_multi_file() {
            self.clear_results();
        }
        self.mode = mode;

        if let Some(selected) = self
            .workspace
            .current_document()
            .map(|doc| doc.selected_text())
            .filter(|text| !text.is_empty())
        {
            self.inputs.search_text = selected.clone();
            self.inputs.replace_text = selected;
            self.view.set_search_text(&self.inputs.search_text);
            self.view.set_replace_text(&self.inputs.replace_text);
        }

        if mode.scope() == Some(Scope::Directory) {
            match current_dir() {
                Ok(dir) => {
                    self.inputs.search_path = dir;
                    self.view.set_search_path(&self.inputs.search_path);
                }
                Err(e) => tracing::debug!(error = %e, "keeping previous search path"),
            }
        }

        self.view.show_controls(mode.visible_controls());
        self.view.set_visible(true);
        self.view.focus_search_input();
        self.refresh_actions();
    }

    /// Escape
    pub fn hide(&mut self) {
        self.stop_jobs();
        self.mode = Mode::Hidden;
        self.view.set_visible(false);
        self.set_visual_state(VisualState::Normal);
    }

    /// Enter：执行当前模式的主操作
    pub fn activate(&mut self) {
        match self.mode {
            Mode::Hidden => {}
            Mode::Active(Operation::Search, Scope::CurrentFile) => {
                self.search_next();
            }
            Mode::Active(Operation::Replace, Scope::CurrentFile) => {
                self.replace_current();
            }
            Mode::Active(_, _) => {
                if self.search_job.is_running() {
                    self.stop_search();
                } else {
                    self.start_search();
                }
            }
        }
    }

    /// 搜索路径改为父目录
    pub fn cd_up(&mut self) {
        let Some(parent) = self.inputs.search_path.parent() else {
            return;
        };
        if !parent.as_os_str().is_empty() && parent.exists() {
            self.inputs.search_path = parent.to_path_buf();
            self.view.set_search_path(&self.inputs.search_path);
        }
    }

    // ---- current document ----

    pub fn search_next(&mut self) -> bool {
        self.remember_inputs();
        self.search_in_document(true, false)
    }

    pub fn search_previous(&mut self) -> bool {
        self.remember_inputs();
        self.search_in_document(false, false)
    }

    /// 在当前文档中查找并选中匹配
    ///
    /// 向前查找时增量模式从选区起点开始，否则从选区终点开始；向后查找取
    /// 选区起点之前的最后一个匹配。两个方向都会回绕。
    pub fn search_in_document(&mut self, forward: bool, incremental: bool) -> bool {
        let pattern = match self.validate_pattern() {
            Ok(pattern) => pattern,
            Err(e) => {
                self.report_invalid_pattern(&e);
                return false;
            }
        };
        if pattern.is_empty() {
            return false;
        }
        self.search_with(&pattern, forward, incremental)
    }

    fn search_with(&mut self, pattern: &SearchPattern, forward: bool, incremental: bool) -> bool {
        let Some(doc) = self.workspace.current_document_mut() else {
            return false;
        };
        let text = doc.text();
        let (start, end) = selection_of(doc.abs_selection(), doc.abs_cursor_position());
        let engine = MatchEngine::new(pattern);

        let found = if forward {
            let from = if incremental { start } else { end };
            match engine.find_next(&text, from, true) {
                // 显式查找不能停在上一次的空匹配上
                Some(m) if !incremental && m.is_empty() && m.start == from => {
                    engine.find_next(&text, from + 1, true)
                }
                other => other,
            }
        } else {
            engine.find_previous(&text, start, true)
        };

        let outcome = match found {
            Some(m) => {
                doc.go_to(m.start, m.len());
                DocumentOutcome::Found
            }
            None => DocumentOutcome::NotFound,
        };
        self.apply_outcome(outcome)
    }

    /// 替换选区起点处（或之后、回绕后）的匹配，然后选中下一个匹配
    pub fn replace_current(&mut self) -> bool {
        self.remember_inputs();
        let pattern = match self.validate_pattern() {
            Ok(pattern) => pattern,
            Err(e) => {
                self.report_invalid_pattern(&e);
                return false;
            }
        };
        if pattern.is_empty() {
            return false;
        }

        let template = self.inputs.replace_text.clone();
        let outcome = match self.workspace.current_document_mut() {
            None => DocumentOutcome::NoDocument,
            Some(doc) => {
                let text = doc.text();
                let (start, _) = selection_of(doc.abs_selection(), doc.abs_cursor_position());
                let engine = MatchEngine::new(&pattern);
                match engine.replace_one(&text, start, &template) {
                    Ok(Some((found, replacement))) => {
                        replace_match(doc, &found, &replacement);
                        let after = found.start + replacement.len();
                        let text = doc.text();
                        match engine.find_next(&text, after, true) {
                            Some(next) => {
                                doc.go_to(next.start, next.len());
                                DocumentOutcome::Found
                            }
                            None => DocumentOutcome::NotFound,
                        }
                    }
                    Ok(None) => DocumentOutcome::NotFound,
                    Err(e) => DocumentOutcome::Failed(e),
                }
            }
        };
        self.apply_outcome(outcome)
    }

    /// 在一个撤销分组内替换当前文档的全部匹配，恢复光标，返回替换次数
    pub fn replace_all_in_document(&mut self) -> usize {
        self.remember_inputs();
        let pattern = match self.validate_pattern() {
            Ok(pattern) => pattern,
            Err(e) => {
                self.report_invalid_pattern(&e);
                return 0;
            }
        };
        if pattern.is_empty() {
            return 0;
        }

        let template = self.inputs.replace_text.clone();
        let Some(doc) = self.workspace.current_document_mut() else {
            return 0;
        };
        let text = doc.text();
        let (new_text, count) = match MatchEngine::new(&pattern).replace_all(&text, &template) {
            Ok(result) => result,
            Err(e) => {
                self.report_error(&e);
                return 0;
            }
        };

        if count > 0 {
            let cursor = doc.abs_cursor_position().unwrap_or(0);
            let mut group = UndoGroup::begin(doc);
            group.document().replace_text(&new_text);
            group.document().set_cursor_position(cursor.min(new_text.len()));
        }

        tracing::info!(count, "replaced in document");
        self.status.show_message(
            &format!("{count} occurrence(s) replaced."),
            self.settings.status_timeout(),
        );
        count
    }

    // ---- background jobs ----

    /// 用当前输入开始多文件搜索，返回 `run_id`
    pub fn start_search(&mut self) -> Option<u64> {
        self.remember_inputs();
        if !self.mode.is_multi_file() {
            return None;
        }
        let context = match self.build_context() {
            Ok(context) => context,
            Err(e) => {
                self.report_error(&e);
                return None;
            }
        };

        self.results.clear();
        let run_id = self.search_job.start(Arc::new(context));
        self.search_run = Some(run_id);
        self.view.set_job_running(JobKind::Search, true);
        Some(run_id)
    }

    pub fn stop_search(&mut self) {
        self.search_job.stop();
        self.pump_events();
    }

    /// 替换结果列表中勾选的匹配，返回 `run_id`
    pub fn replace_checked(&mut self) -> Option<u64> {
        self.remember_inputs();
        if self.mode.operation() != Some(Operation::Replace) || !self.mode.is_multi_file() {
            return None;
        }
        let context = match self.build_context() {
            Ok(context) => context,
            Err(e) => {
                self.report_error(&e);
                return None;
            }
        };
        if let Err(e) = ReplacementTemplate::parse(context.replacement(), context.pattern().regex())
        {
            self.report_error(&e);
            return None;
        }

        let targets = self.results.checked_items();
        if targets.is_empty() {
            self.status
                .show_message("Nothing checked to replace", self.settings.error_timeout());
            return None;
        }

        self.stop_search();
        let run_id = self.replace_job.replace(Arc::new(context), targets);
        self.replace_run = Some(run_id);
        self.view.set_job_running(JobKind::Replace, true);
        Some(run_id)
    }

    pub fn stop_replace(&mut self) {
        self.replace_job.stop();
        self.pump_events();
    }

    fn stop_jobs(&mut self) {
        self.search_job.stop();
        self.replace_job.stop();
        self.pump_events();
    }

    fn clear_results(&mut self) {
        if let Err(e) = self.search_job.clear() {
            tracing::warn!(error = %e, "failed to clear search results");
        }
        self.results.clear();
    }

    fn build_context(&self) -> Result<SearchContext> {
        let pattern = self.validate_pattern()?;
        if self.mode.scope() == Some(Scope::ProjectFiles) {
            return Err(SearchError::Unsupported(
                "Searching project files is not supported".to_string(),
            ));
        }
        let masks = FileMasks::parse(&self.inputs.mask_text)?;

        let mut context = SearchContext::new(pattern, self.mode)
            .with_replacement(self.inputs.replace_text.clone())
            .with_file_masks(masks)
            .with_opened_files(self.workspace.opened_documents());

        if self.mode.scope() == Some(Scope::Directory) {
            let path = absolute(&self.inputs.search_path)?;
            if !path.is_dir() {
                return Err(SearchError::PathAccess {
                    path,
                    source: io::Error::new(io::ErrorKind::NotFound, "not a directory"),
                });
            }
            context = context.with_search_path(path);
        }
        Ok(context)
    }

    /// 取出两个任务通道里的全部事件并处理，返回处理的事件数
    pub fn pump_events(&mut self) -> usize {
        let mut events: Vec<JobEvent> = self.search_events.try_iter().collect();
        events.extend(self.replace_events.try_iter());
        let count = events.len();
        for event in events {
            self.handle_event(event);
        }
        count
    }

    fn handle_event(&mut self, event: JobEvent) {
        let current = match event.job {
            JobKind::Search => self.search_run,
            JobKind::Replace => self.replace_run,
        };
        if current != Some(event.run_id) {
            tracing::trace!(job = ?event.job, run_id = event.run_id, "dropping stale job event");
            return;
        }

        match event.kind {
            JobEventKind::Started => {
                self.view.set_job_running(event.job, true);
                self.view.set_progress(Some(JobProgress::default()));
            }
            JobEventKind::Progress(progress) => self.view.set_progress(Some(progress)),
            JobEventKind::FileMatches(file_matches) => self.results.append(file_matches),
            JobEventKind::FileOutcome(outcome) => match outcome.status {
                FileStatus::Error => {
                    let message = outcome.error.unwrap_or_default();
                    self.status
                        .append_error(&format!("{}: {}", outcome.path.display(), message));
                }
                _ => {
                    tracing::debug!(path = %outcome.path.display(), status = ?outcome.status, "file outcome");
                }
            },
            JobEventKind::OpenedFileHandled { path, content } => {
                self.apply_opened_file(&path, &content);
            }
            JobEventKind::Error { path, message } => {
                let message = match path {
                    Some(path) => format!("{}: {}", path.display(), message),
                    None => message,
                };
                self.status.append_error(&message);
            }
            JobEventKind::ResultsHandled(outcomes) => self.results.results_handled(outcomes),
            JobEventKind::Finished(reason) => {
                self.view.set_job_running(event.job, false);
                self.view.set_progress(None);
                if reason == FinishReason::Failed {
                    tracing::warn!(job = ?event.job, run_id = event.run_id, "job failed");
                }
            }
        }
    }

    fn apply_opened_file(&mut self, path: &Path, content: &str) {
        match self.workspace.open_file(path) {
            Some(doc) => {
                let mut group = UndoGroup::begin(doc);
                group.document().replace_text(content);
            }
            None => {
                tracing::warn!(path = %path.display(), "replaced file is no longer open");
                self.status
                    .append_error(&format!("{}: cannot apply replacement", path.display()));
            }
        }
    }

    // ---- helpers ----

    fn has_document(&self) -> bool {
        self.workspace.current_document().is_some()
    }

    fn document_has_focus(&self) -> bool {
        self.workspace
            .current_document()
            .is_some_and(|doc| doc.has_focus())
    }

    fn remember_inputs(&mut self) {
        self.search_history.remember(&self.inputs.search_text);
        self.replace_history.remember(&self.inputs.replace_text);
        self.mask_history.remember(&self.inputs.mask_text);
    }

    fn refresh_actions(&mut self) {
        let valid = self
            .validate_pattern()
            .map(|pattern| !pattern.is_empty())
            .unwrap_or(false);
        self.update_actions(valid);
    }

    fn update_actions(&self, valid: bool) {
        self.view
            .set_actions_state(ActionsState::compute(valid, self.has_document()));
    }

    fn set_visual_state(&mut self, state: VisualState) {
        self.visual_state = state;
        self.view.set_visual_state(state);
    }

    fn apply_outcome(&mut self, outcome: DocumentOutcome) -> bool {
        match outcome {
            DocumentOutcome::NoDocument => false,
            DocumentOutcome::Found => {
                self.set_visual_state(VisualState::Good);
                true
            }
            DocumentOutcome::NotFound => {
                self.set_visual_state(VisualState::Bad);
                false
            }
            DocumentOutcome::Failed(e) => {
                self.report_error(&e);
                false
            }
        }
    }

    fn report_invalid_pattern(&mut self, error: &SearchError) {
        self.report_error(error);
        self.set_visual_state(VisualState::Incorrect);
        self.update_actions(false);
    }

    fn report_error(&self, error: &SearchError) {
        self.status
            .show_message(&error.to_string(), self.settings.error_timeout());
    }
}

fn selection_of(selection: Option<(usize, usize)>, cursor: Option<usize>) -> (usize, usize) {
    selection
        .or_else(|| cursor.map(|pos| (pos, pos)))
        .unwrap_or((0, 0))
}

fn replace_match(doc: &mut dyn Document, found: &Match, replacement: &str) {
    doc.go_to(found.start, found.len());
    doc.replace_selected_text(replacement);
    doc.go_to(found.start + replacement.len(), 0);
}

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(|source| SearchError::PathAccess {
        path: PathBuf::from("."),
        source,
    })
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(current_dir()?.join(path))
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/search.rs"]
mod tests;
