//! 文本缓冲区模型
//!
//! 职责：
//! - 文本存储（Rope）
//! - 选区（锚点 + 光标，UTF-8 字节偏移）
//! - 快照式撤销，支持嵌套的撤销分组

use crate::kernel::services::ports::document::Document;
use ropey::Rope;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Clone, Default)]
pub struct TextBuffer {
    rope: Rope,
    path: Option<PathBuf>,
    anchor: usize,
    cursor: usize,
    focused: bool,
    undo_stack: Vec<Rope>,
    group_depth: usize,
    group_snapshot: Option<Rope>,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    /// 流式写入到 Writer，避免大文件 OOM
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for chunk in self.rope.chunks() {
            writer.write_all(chunk.as_bytes())?;
        }
        Ok(())
    }

    pub fn set_focus(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// 撤销最近一步（或一个分组）；没有可撤销内容时返回 false
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo_stack.pop() else {
            return false;
        };
        self.rope = previous;
        let end = self.rope.len_bytes();
        self.anchor = self.anchor.min(end);
        self.cursor = self.cursor.min(end);
        self.anchor = self.snap(self.anchor);
        self.cursor = self.snap(self.cursor);
        true
    }

    /// 对齐到不大于 `byte` 的字符边界
    fn snap(&self, byte: usize) -> usize {
        let byte = byte.min(self.rope.len_bytes());
        self.rope.char_to_byte(self.rope.byte_to_char(byte))
    }

    fn record_undo(&mut self) {
        if self.group_depth == 0 {
            self.undo_stack.push(self.rope.clone());
        }
    }
}

impl Document for TextBuffer {
    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn abs_selection(&self) -> Option<(usize, usize)> {
        Some((self.anchor.min(self.cursor), self.anchor.max(self.cursor)))
    }

    fn abs_cursor_position(&self) -> Option<usize> {
        Some(self.cursor)
    }

    fn set_cursor_position(&mut self, pos: usize) {
        let pos = self.snap(pos);
        self.anchor = pos;
        self.cursor = pos;
    }

    fn go_to(&mut self, pos: usize, selection_len: usize) {
        self.anchor = self.snap(pos);
        self.cursor = self.snap(pos.saturating_add(selection_len));
    }

    fn selected_text(&self) -> String {
        let (start, end) = (self.anchor.min(self.cursor), self.anchor.max(self.cursor));
        self.rope.byte_slice(start..end).to_string()
    }

    fn replace_selected_text(&mut self, text: &str) {
        self.record_undo();
        let (start, end) = (self.anchor.min(self.cursor), self.anchor.max(self.cursor));
        let char_start = self.rope.byte_to_char(start);
        let char_end = self.rope.byte_to_char(end);
        self.rope.remove(char_start..char_end);
        self.rope.insert(char_start, text);
        let pos = start + text.len();
        self.anchor = pos;
        self.cursor = pos;
    }

    fn begin_undo_action(&mut self) {
        if self.group_depth == 0 {
            self.group_snapshot = Some(self.rope.clone());
        }
        self.group_depth += 1;
    }

    fn end_undo_action(&mut self) {
        if self.group_depth == 0 {
            return;
        }
        self.group_depth -= 1;
        if self.group_depth == 0 {
            if let Some(snapshot) = self.group_snapshot.take() {
                if snapshot != self.rope {
                    self.undo_stack.push(snapshot);
                }
            }
        }
    }

    fn file_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn has_focus(&self) -> bool {
        self.focused
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/text_buffer.rs"]
mod tests;
