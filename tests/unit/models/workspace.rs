use super::*;
use crate::kernel::services::adapters::file::LocalFileProvider;
use std::fs;
use tempfile::tempdir;

fn workspace() -> BufferWorkspace {
    BufferWorkspace::new(Arc::new(LocalFileProvider::new()))
}

#[test]
fn test_open_buffer_becomes_current() {
    let mut ws = workspace();
    assert!(ws.current_document().is_none());

    ws.open_buffer(TextBuffer::from_text("first"));
    let index = ws.open_buffer(TextBuffer::from_text("second"));
    assert_eq!(index, 1);
    assert_eq!(ws.current_document().unwrap().text(), "second");

    ws.set_current(0);
    assert_eq!(ws.current_document().unwrap().text(), "first");
}

#[test]
fn test_opened_documents_skip_untitled_buffers() {
    let mut ws = workspace();
    ws.open_buffer(TextBuffer::from_text("untitled"));
    ws.open_buffer(TextBuffer::from_text("saved").with_path("/w/a.txt"));

    assert_eq!(
        ws.opened_documents(),
        vec![(PathBuf::from("/w/a.txt"), "saved".to_string())]
    );
}

#[test]
fn test_open_file_reuses_or_loads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("disk.txt");
    fs::write(&path, "from disk").unwrap();

    let mut ws = workspace();
    ws.open_buffer(TextBuffer::from_text("edited").with_path(&path));
    ws.open_buffer(TextBuffer::from_text("other"));

    let doc = ws.open_file(&path).unwrap();
    assert_eq!(doc.text(), "edited");
    assert_eq!(ws.documents().len(), 2);

    let other = dir.path().join("other.txt");
    fs::write(&other, "loaded").unwrap();
    assert_eq!(ws.open_file(&other).unwrap().text(), "loaded");
    assert_eq!(ws.documents().len(), 3);
    assert_eq!(ws.document(&other).unwrap().text(), "loaded");

    assert!(ws.open_file(&dir.path().join("missing.txt")).is_none());
}
