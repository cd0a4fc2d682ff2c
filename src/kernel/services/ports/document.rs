//! Editor-side collaborators: documents and the workspace holding them.

use std::path::{Path, PathBuf};

/// 编辑器文档。所有偏移都是 UTF-8 字节偏移。
pub trait Document {
    fn text(&self) -> String;

    /// 当前选区 `(start, end)`，`start <= end`；无选区也无光标时为 `None`
    fn abs_selection(&self) -> Option<(usize, usize)>;

    fn abs_cursor_position(&self) -> Option<usize>;

    fn set_cursor_position(&mut self, pos: usize);

    /// 移动到 `pos` 并选中其后 `selection_len` 字节
    fn go_to(&mut self, pos: usize, selection_len: usize);

    fn selected_text(&self) -> String;

    fn replace_selected_text(&mut self, text: &str);

    fn begin_undo_action(&mut self);

    fn end_undo_action(&mut self);

    fn file_path(&self) -> Option<&Path>;

    fn has_focus(&self) -> bool;

    fn replace_text(&mut self, text: &str) {
        let len = self.text().len();
        self.go_to(0, len);
        self.replace_selected_text(text);
    }
}

/// Groups every edit made through it into one undo step; the group is closed
/// on drop, whichever way the caller leaves the scope.
pub struct UndoGroup<'a> {
    document: &'a mut dyn Document,
}

impl<'a> UndoGroup<'a> {
    pub fn begin(document: &'a mut dyn Document) -> Self {
        document.begin_undo_action();
        Self { document }
    }

    pub fn document(&mut self) -> &mut dyn Document {
        &mut *self.document
    }
}

impl Drop for UndoGroup<'_> {
    fn drop(&mut self) {
        self.document.end_undo_action();
    }
}

pub trait Workspace {
    fn current_document(&self) -> Option<&dyn Document>;

    fn current_document_mut(&mut self) -> Option<&mut dyn Document>;

    /// 所有已打开文档的 `(路径, 文本)`，用于构造快照
    fn opened_documents(&self) -> Vec<(PathBuf, String)>;

    /// 打开（或切换到）指定文件对应的文档
    fn open_file(&mut self, path: &Path) -> Option<&mut dyn Document>;
}
