//! Service ports: traits + data contracts.

pub mod config;
pub mod document;
pub mod file;
pub mod mode;
pub mod search;
pub mod view;

pub use config::SearchSettings;
pub use document::{Document, UndoGroup, Workspace};
pub use file::{FileEnumerator, FileError, FileProvider, Result as FileResult};
pub use mode::{ControlSet, Mode, Operation, Scope};
pub use search::{
    FileMasks, FileMatches, FileOutcome, FileStatus, FinishReason, JobEvent, JobEventKind,
    JobKind, JobProgress, Match, PatternFlags, ReplaceTarget, Result as SearchResult,
    SearchContext, SearchError, SearchPattern,
};
pub use view::{ActionsState, ResultsSink, SearchView, StatusSink, VisualState};
