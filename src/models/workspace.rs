//! 打开的文档集合

use super::text_buffer::TextBuffer;
use crate::kernel::services::ports::document::{Document, Workspace};
use crate::kernel::services::ports::file::FileProvider;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct BufferWorkspace {
    files: Arc<dyn FileProvider>,
    documents: Vec<TextBuffer>,
    current: Option<usize>,
}

impl BufferWorkspace {
    pub fn new(files: Arc<dyn FileProvider>) -> Self {
        Self {
            files,
            documents: Vec::new(),
            current: None,
        }
    }

    /// 加入一个缓冲区并设为当前文档，返回其下标
    pub fn open_buffer(&mut self, buffer: TextBuffer) -> usize {
        self.documents.push(buffer);
        let index = self.documents.len() - 1;
        self.current = Some(index);
        index
    }

    pub fn set_current(&mut self, index: usize) {
        if index < self.documents.len() {
            self.current = Some(index);
        }
    }

    pub fn documents(&self) -> &[TextBuffer] {
        &self.documents
    }

    pub fn document(&self, path: &Path) -> Option<&TextBuffer> {
        self.position(path).map(|index| &self.documents[index])
    }

    pub fn current_buffer_mut(&mut self) -> Option<&mut TextBuffer> {
        let index = self.current?;
        self.documents.get_mut(index)
    }

    fn position(&self, path: &Path) -> Option<usize> {
        self.documents
            .iter()
            .position(|doc| doc.file_path() == Some(path))
    }
}

impl Workspace for BufferWorkspace {
    fn current_document(&self) -> Option<&dyn Document> {
        let index = self.current?;
        self.documents.get(index).map(|doc| doc as &dyn Document)
    }

    fn current_document_mut(&mut self) -> Option<&mut dyn Document> {
        let index = self.current?;
        self.documents
            .get_mut(index)
            .map(|doc| doc as &mut dyn Document)
    }

    fn opened_documents(&self) -> Vec<(PathBuf, String)> {
        self.documents
            .iter()
            .filter_map(|doc| doc.file_path().map(|path| (path.to_path_buf(), doc.text())))
            .collect()
    }

    fn open_file(&mut self, path: &Path) -> Option<&mut dyn Document> {
        let index = match self.position(path) {
            Some(index) => index,
            None => {
                let text = match self.files.read_file(path) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "failed to open file");
                        return None;
                    }
                };
                self.documents
                    .push(TextBuffer::from_text(&text).with_path(path));
                self.documents.len() - 1
            }
        };
        self.current = Some(index);
        self.documents
            .get_mut(index)
            .map(|doc| doc as &mut dyn Document)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/workspace.rs"]
mod tests;
