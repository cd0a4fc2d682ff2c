use super::*;
use crate::kernel::services::ports::document::UndoGroup;

#[test]
fn test_text_buffer_basic() {
    let mut buffer = TextBuffer::from_text("hello\nworld");

    assert_eq!(buffer.text(), "hello\nworld");
    assert_eq!(buffer.abs_selection(), Some((0, 0)));

    buffer.go_to(6, 5);
    assert_eq!(buffer.abs_selection(), Some((6, 11)));
    assert_eq!(buffer.abs_cursor_position(), Some(11));
    assert_eq!(buffer.selected_text(), "world");
}

#[test]
fn test_offsets_snap_to_char_boundaries() {
    let mut buffer = TextBuffer::from_text("héllo");

    // 偏移 2 在 "é" 中间
    buffer.set_cursor_position(2);
    assert_eq!(buffer.abs_cursor_position(), Some(1));

    buffer.go_to(0, 100);
    assert_eq!(buffer.abs_selection(), Some((0, 6)));
}

#[test]
fn test_replace_selected_text_moves_cursor_after_insert() {
    let mut buffer = TextBuffer::from_text("cat dog cat");
    buffer.go_to(4, 3);
    buffer.replace_selected_text("bird");

    assert_eq!(buffer.text(), "cat bird cat");
    assert_eq!(buffer.abs_selection(), Some((8, 8)));
    assert!(buffer.can_undo());

    assert!(buffer.undo());
    assert_eq!(buffer.text(), "cat dog cat");
    assert!(!buffer.undo());
}

#[test]
fn test_undo_group_is_one_step() {
    let mut buffer = TextBuffer::from_text("a a a");
    {
        let mut group = UndoGroup::begin(&mut buffer);
        for pos in [0, 2, 4] {
            group.document().go_to(pos, 1);
            group.document().replace_selected_text("b");
        }
    }

    assert_eq!(buffer.text(), "b b b");
    assert!(buffer.undo());
    assert_eq!(buffer.text(), "a a a");
    assert!(!buffer.can_undo());
}

#[test]
fn test_empty_undo_group_records_nothing() {
    let mut buffer = TextBuffer::from_text("same");
    buffer.begin_undo_action();
    buffer.end_undo_action();
    buffer.end_undo_action();
    assert!(!buffer.can_undo());
}

#[test]
fn test_replace_text_and_write_to() {
    let mut buffer = TextBuffer::from_text("old").with_path("/tmp/x.txt");
    buffer.replace_text("new content");

    let mut out = Vec::new();
    buffer.write_to(&mut out).unwrap();
    assert_eq!(out, b"new content");
    assert_eq!(buffer.file_path(), Some(Path::new("/tmp/x.txt")));
    assert!(!buffer.has_focus());
    buffer.set_focus(true);
    assert!(buffer.has_focus());
}
