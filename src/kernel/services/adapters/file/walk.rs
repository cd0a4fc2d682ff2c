//! 基于 ignore crate 的候选文件枚举
//!
//! 串行遍历并按路径排序，保证同一棵目录树上的发现顺序稳定。

use crate::kernel::services::ports::config::SearchSettings;
use crate::kernel::services::ports::file::FileEnumerator;
use crate::kernel::services::ports::search::FileMasks;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct WalkEnumerator {
    respect_gitignore: bool,
    include_hidden: bool,
    follow_links: bool,
}

impl WalkEnumerator {
    pub fn new(settings: &SearchSettings) -> Self {
        Self {
            respect_gitignore: settings.respect_gitignore,
            include_hidden: settings.include_hidden,
            follow_links: settings.follow_links,
        }
    }
}

impl Default for WalkEnumerator {
    fn default() -> Self {
        Self::new(&SearchSettings::default())
    }
}

impl FileEnumerator for WalkEnumerator {
    fn candidates<'a>(
        &'a self,
        root: &Path,
        masks: &'a FileMasks,
    ) -> Box<dyn Iterator<Item = PathBuf> + 'a> {
        let walker = WalkBuilder::new(root)
            .hidden(!self.include_hidden)
            .parents(self.respect_gitignore)
            .ignore(self.respect_gitignore)
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .require_git(false)
            .follow_links(self.follow_links)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build();

        Box::new(walker.filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry");
                    return None;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                return None;
            }
            let path = entry.into_path();
            masks.matches(&path).then_some(path)
        }))
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/file/walk.rs"]
mod tests;
