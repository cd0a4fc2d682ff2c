//! 搜索服务模块
//!
//! - MatchEngine: 文档内查找/替换
//! - SearchJob: 后台多文件搜索
//! - ReplaceJob: 后台多文件替换

mod engine;
mod global;
mod replace;
mod task;
mod template;

use crate::kernel::services::ports::file::{FileError, FileProvider};
use crate::kernel::services::ports::search::SearchContext;
use std::borrow::Cow;
use std::path::Path;

pub use engine::MatchEngine;
pub use global::SearchJob;
pub use replace::ReplaceJob;
pub use task::{JobRunner, RunContext};
pub use template::ReplacementTemplate;

const BINARY_PREVIEW_LEN: usize = 8192;

fn is_likely_binary(content: &[u8]) -> bool {
    let preview = &content[..content.len().min(BINARY_PREVIEW_LEN)];
    memchr::memchr(0, preview).is_some()
}

enum Loaded<'a> {
    Text(Cow<'a, str>),
    Binary,
}

/// 已打开的文件读快照，其余读磁盘
fn load_text<'a>(
    context: &'a SearchContext,
    files: &dyn FileProvider,
    path: &Path,
    skip_binary: bool,
) -> Result<Loaded<'a>, FileError> {
    if let Some(text) = context.opened_file(path) {
        return Ok(Loaded::Text(Cow::Borrowed(text)));
    }

    let bytes = files.read_file_bytes(path)?;
    if skip_binary && is_likely_binary(&bytes) {
        return Ok(Loaded::Binary);
    }
    String::from_utf8(bytes)
        .map(|text| Loaded::Text(Cow::Owned(text)))
        .map_err(|_| FileError::InvalidEncoding(path.to_path_buf()))
}
