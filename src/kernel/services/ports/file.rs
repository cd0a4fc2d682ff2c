//! File system ports used by the background jobs.

use super::search::FileMasks;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FileError>;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("Not a file: {}", .0.display())]
    NotAFile(PathBuf),
    #[error("Not valid UTF-8: {}", .0.display())]
    InvalidEncoding(PathBuf),
}

impl FileError {
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => FileError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => FileError::PermissionDenied(path.to_path_buf()),
            _ => FileError::Io(err),
        }
    }
}

/// 文件读写抽象
pub trait FileProvider: Send + Sync {
    fn read_file_bytes(&self, path: &Path) -> Result<Vec<u8>>;

    fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    fn read_file(&self, path: &Path) -> Result<String> {
        let bytes = self.read_file_bytes(path)?;
        String::from_utf8(bytes).map_err(|_| FileError::InvalidEncoding(path.to_path_buf()))
    }
}

/// 候选文件枚举：给定根目录和 mask，惰性产出文件路径
///
/// 每次调用重新遍历；同一个文件系统快照下顺序稳定。
pub trait FileEnumerator: Send + Sync {
    fn candidates<'a>(
        &'a self,
        root: &Path,
        masks: &'a FileMasks,
    ) -> Box<dyn Iterator<Item = PathBuf> + 'a>;
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/ports/file.rs"]
mod tests;
