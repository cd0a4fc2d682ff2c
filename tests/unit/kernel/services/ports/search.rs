use super::*;
use crate::kernel::services::ports::mode::Operation;

#[test]
fn test_literal_pattern_escapes_metacharacters() {
    let pattern = SearchPattern::compile("a+b", PatternFlags::default()).unwrap();
    assert!(pattern.regex().is_match("xa+by"));
    assert!(!pattern.regex().is_match("aab"));
    assert_eq!(pattern.source(), "a+b");
}

#[test]
fn test_case_flag_is_a_compile_flag() {
    let insensitive = SearchPattern::compile("Cat", PatternFlags::default()).unwrap();
    assert!(insensitive.regex().is_match("a CAT"));

    let sensitive = SearchPattern::compile(
        "Cat",
        PatternFlags {
            regex: false,
            case_sensitive: true,
        },
    )
    .unwrap();
    assert!(!sensitive.regex().is_match("a CAT"));
}

#[test]
fn test_invalid_regex_reports_compiler_message() {
    let err = SearchPattern::compile(
        "(unclosed",
        PatternFlags {
            regex: true,
            case_sensitive: false,
        },
    )
    .unwrap_err();
    match err {
        SearchError::InvalidPattern(message) => assert!(!message.is_empty()),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_masks_split_on_spaces_and_drop_empties() {
    let masks = FileMasks::parse("  *.h   *.cpp file???.txt ").unwrap();
    assert_eq!(masks.patterns(), ["*.h", "*.cpp", "file???.txt"]);

    assert!(masks.matches(Path::new("/src/main.cpp")));
    assert!(masks.matches(Path::new("file001.txt")));
    assert!(!masks.matches(Path::new("/src/main.rs")));
    assert!(!masks.matches(Path::new("file1.txt")));
}

#[test]
fn test_masks_ignore_directory_names() {
    let masks = FileMasks::parse("*test*").unwrap();
    assert!(!masks.matches(Path::new("/home/u/tests/readme.md")));
    assert!(masks.matches(Path::new("/home/u/src/test_util.rs")));

    let masks = FileMasks::parse("*.c*").unwrap();
    assert!(!masks.matches(Path::new("/p/build.cache/notes.txt")));
    assert!(masks.matches(Path::new("/p/main.c")));
}

#[test]
fn test_empty_masks_accept_all() {
    let masks = FileMasks::parse("   ").unwrap();
    assert!(masks.is_empty());
    assert!(masks.matches(Path::new("anything.bin")));
}

#[test]
fn test_invalid_mask_is_reported() {
    let err = FileMasks::parse("*.rs [z-a]").unwrap_err();
    match err {
        SearchError::InvalidMask { mask, .. } => assert_eq!(mask, "[z-a]"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_context_builder_and_snapshot_lookup() {
    let pattern = SearchPattern::compile("x", PatternFlags::default()).unwrap();
    let context = SearchContext::new(pattern, Mode::replace(Scope::OpenedFiles))
        .with_replacement("y")
        .with_search_path("/work")
        .with_opened_files([(PathBuf::from("/work/a.txt"), "x x".to_string())]);

    assert_eq!(context.replacement(), "y");
    assert_eq!(context.search_path(), Path::new("/work"));
    assert_eq!(context.opened_file(Path::new("/work/a.txt")), Some("x x"));
    assert_eq!(context.opened_file(Path::new("/work/b.txt")), None);
    assert_eq!(context.scope(), Some(Scope::OpenedFiles));
    assert_eq!(context.mode().operation(), Some(Operation::Replace));
}

#[test]
fn test_replace_target_from_file_matches() {
    let fm = FileMatches {
        path: PathBuf::from("a.txt"),
        matches: vec![Match::new(0, 3, 0, 0, "cat")],
    };
    let target = ReplaceTarget::from(fm.clone());
    assert_eq!(target.path, fm.path);
    assert_eq!(target.matches[0].len(), 3);
    assert!(target.matches[0].replacement.is_none());
    assert_eq!(
        target.matches[0].clone().with_replacement("dog").replacement.as_deref(),
        Some("dog")
    );
}
