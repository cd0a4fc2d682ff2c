use super::file::FileError;
use super::mode::{Mode, Scope};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    InvalidPattern(String),
    #[error("{0}")]
    InvalidReplacementTemplate(String),
    #[error("invalid file mask '{mask}': {message}")]
    InvalidMask { mask: String, message: String },
    #[error("{}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: FileError,
    },
    #[error("search path {} is not accessible: {source}", .path.display())]
    PathAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("job is still running")]
    JobRunning,
    #[error("{0}")]
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternFlags {
    pub regex: bool,
    pub case_sensitive: bool,
}

/// 编译好的搜索模式
///
/// Literal 模式先转义所有元字符再编译，因此下游只面对一个 `Regex`。
#[derive(Debug, Clone)]
pub struct SearchPattern {
    source: String,
    flags: PatternFlags,
    regex: Regex,
}

impl SearchPattern {
    pub fn compile(source: &str, flags: PatternFlags) -> Result<Self> {
        let translated = if flags.regex {
            Cow::Borrowed(source)
        } else {
            Cow::Owned(regex::escape(source))
        };
        let regex = RegexBuilder::new(&translated)
            .case_insensitive(!flags.case_sensitive)
            .build()
            .map_err(|e| SearchError::InvalidPattern(e.to_string()))?;
        Ok(Self {
            source: source.to_string(),
            flags,
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> PatternFlags {
        self.flags
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub col: usize,
    pub text: String,
    pub replacement: Option<String>,
}

impl Match {
    pub fn new(start: usize, end: usize, line: usize, col: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            line,
            col,
            text: text.into(),
            replacement: None,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = Some(replacement.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMatches {
    pub path: PathBuf,
    pub matches: Vec<Match>,
}

/// 空格分隔的通配符列表，例如 `*.h *.cpp file???.txt`
#[derive(Debug, Clone, Default)]
pub struct FileMasks {
    patterns: Vec<String>,
    set: Option<GlobSet>,
}

impl FileMasks {
    pub fn parse(input: &str) -> Result<Self> {
        Self::from_patterns(input.split(' '))
    }

    pub fn from_patterns<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if patterns.is_empty() {
            return Ok(Self::default());
        }

        let mut builder = GlobSetBuilder::new();
        for mask in &patterns {
            let glob = Glob::new(mask).map_err(|e| SearchError::InvalidMask {
                mask: mask.clone(),
                message: e.kind().to_string(),
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|e| SearchError::InvalidMask {
            mask: patterns.join(" "),
            message: e.to_string(),
        })?;

        Ok(Self {
            patterns,
            set: Some(set),
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// 空列表接受所有文件；否则只按文件名匹配，目录名不参与
    pub fn matches(&self, path: &Path) -> bool {
        let Some(set) = &self.set else {
            return true;
        };
        path.file_name()
            .is_some_and(|name| set.is_match(Path::new(name)))
    }
}

/// 一次搜索/替换请求的全部参数
///
/// 通过消费式 builder 构造，交给后台任务时包进 `Arc`，之后只读。
#[derive(Debug, Clone)]
pub struct SearchContext {
    pattern: SearchPattern,
    replacement: String,
    search_path: PathBuf,
    file_masks: FileMasks,
    opened_files: BTreeMap<PathBuf, String>,
    mode: Mode,
}

impl SearchContext {
    pub fn new(pattern: SearchPattern, mode: Mode) -> Self {
        Self {
            pattern,
            replacement: String::new(),
            search_path: PathBuf::new(),
            file_masks: FileMasks::default(),
            opened_files: BTreeMap::new(),
            mode,
        }
    }

    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = replacement.into();
        self
    }

    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_path = path.into();
        self
    }

    pub fn with_file_masks(mut self, masks: FileMasks) -> Self {
        self.file_masks = masks;
        self
    }

    pub fn with_opened_files<I>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = (PathBuf, String)>,
    {
        self.opened_files = files.into_iter().collect();
        self
    }

    pub fn pattern(&self) -> &SearchPattern {
        &self.pattern
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn search_path(&self) -> &Path {
        &self.search_path
    }

    pub fn file_masks(&self) -> &FileMasks {
        &self.file_masks
    }

    pub fn opened_files(&self) -> &BTreeMap<PathBuf, String> {
        &self.opened_files
    }

    pub fn opened_file(&self, path: &Path) -> Option<&str> {
        self.opened_files.get(path).map(String::as_str)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn scope(&self) -> Option<Scope> {
        self.mode.scope()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Search,
    Replace,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobProgress {
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Matched,
    Replaced,
    Skipped,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub status: FileStatus,
    pub error: Option<String>,
    /// 仅当文件已在编辑器中打开时携带替换后的完整内容
    pub new_content: Option<String>,
    pub replacements: usize,
}

impl FileOutcome {
    pub fn matched(path: PathBuf, matches: usize) -> Self {
        Self {
            path,
            status: FileStatus::Matched,
            error: None,
            new_content: None,
            replacements: matches,
        }
    }

    pub fn replaced(path: PathBuf, replacements: usize, new_content: Option<String>) -> Self {
        Self {
            path,
            status: FileStatus::Replaced,
            error: None,
            new_content,
            replacements,
        }
    }

    pub fn skipped(path: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            path,
            status: FileStatus::Skipped,
            error: Some(reason.into()),
            new_content: None,
            replacements: 0,
        }
    }

    pub fn error(path: PathBuf, message: impl Into<String>) -> Self {
        Self {
            path,
            status: FileStatus::Error,
            error: Some(message.into()),
            new_content: None,
            replacements: 0,
        }
    }
}

/// 替换任务的目标：用户在结果列表中勾选的文件及其匹配
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceTarget {
    pub path: PathBuf,
    pub matches: Vec<Match>,
}

impl From<FileMatches> for ReplaceTarget {
    fn from(file_matches: FileMatches) -> Self {
        Self {
            path: file_matches.path,
            matches: file_matches.matches,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Completed,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEventKind {
    Started,
    Progress(JobProgress),
    FileMatches(FileMatches),
    FileOutcome(FileOutcome),
    OpenedFileHandled { path: PathBuf, content: String },
    Error { path: Option<PathBuf>, message: String },
    ResultsHandled(Vec<FileOutcome>),
    Finished(FinishReason),
}

/// 后台任务事件；`seq` 在同一个 `run_id` 内严格递增
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEvent {
    pub job: JobKind,
    pub run_id: u64,
    pub seq: u64,
    pub kind: JobEventKind,
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/ports/search.rs"]
mod tests;
