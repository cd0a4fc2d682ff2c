//! Foreground collaborators the controller reports to.
//!
//! Methods take `&self`; implementations own their interior state.

use super::mode::ControlSet;
use super::search::{FileMatches, FileOutcome, JobKind, JobProgress, ReplaceTarget};
use std::path::Path;
use std::time::Duration;

/// 搜索框的颜色状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VisualState {
    #[default]
    Normal,
    Good,
    Bad,
    Incorrect,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionsState {
    pub search_available: bool,
    pub in_document_available: bool,
}

impl ActionsState {
    pub fn compute(pattern_valid: bool, has_document: bool) -> Self {
        Self {
            search_available: pattern_valid,
            in_document_available: pattern_valid && has_document,
        }
    }
}

pub trait SearchView {
    fn is_visible(&self) -> bool;

    fn set_visible(&self, visible: bool);

    fn show_controls(&self, controls: ControlSet);

    fn set_search_text(&self, text: &str);

    fn set_replace_text(&self, text: &str);

    fn set_search_path(&self, path: &Path);

    /// 聚焦搜索输入框并全选
    fn focus_search_input(&self);

    fn set_visual_state(&self, state: VisualState);

    fn set_actions_state(&self, actions: ActionsState);

    /// `None` 隐藏进度条
    fn set_progress(&self, progress: Option<JobProgress>);

    fn set_job_running(&self, job: JobKind, running: bool);
}

pub trait ResultsSink {
    fn clear(&self);

    fn append(&self, file_matches: FileMatches);

    /// 用户勾选、准备替换的条目
    fn checked_items(&self) -> Vec<ReplaceTarget>;

    fn results_handled(&self, outcomes: Vec<FileOutcome>);
}

pub trait StatusSink {
    fn show_message(&self, message: &str, timeout: Duration);

    fn clear_message(&self);

    fn append_error(&self, message: &str);
}
