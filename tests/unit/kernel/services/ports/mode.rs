use super::*;
use std::collections::HashSet;

#[test]
fn test_all_modes_are_distinct() {
    let unique: HashSet<Mode> = Mode::ALL.iter().copied().collect();
    assert_eq!(unique.len(), 9);
    assert!(Mode::ALL.contains(&Mode::Hidden));
}

#[test]
fn test_every_visible_mode_has_controls() {
    for mode in Mode::ALL {
        assert_eq!(mode.is_visible(), mode.visible_controls().any(), "{mode:?}");
        if mode.is_visible() {
            assert!(mode.visible_controls().search_input);
            assert!(mode.visible_controls().options);
        }
    }
}

#[test]
fn test_mode_axes() {
    let mode = Mode::replace(Scope::Directory);
    assert_eq!(mode.operation(), Some(Operation::Replace));
    assert_eq!(mode.scope(), Some(Scope::Directory));
    assert!(mode.is_multi_file());
    assert!(!mode.is_current_file());

    assert!(Mode::search(Scope::CurrentFile).is_current_file());
    assert_eq!(Mode::Hidden.scope(), None);
    assert!(!Mode::Hidden.is_multi_file());
}

#[test]
fn test_current_file_modes() {
    let search = Mode::search(Scope::CurrentFile).visible_controls();
    assert!(search.previous && search.next);
    assert!(!search.replace_input && !search.replace_all && !search.path);

    let replace = Mode::replace(Scope::CurrentFile).visible_controls();
    assert!(replace.replace_input && replace.replace && replace.replace_all);
    assert!(!replace.search && !replace.replace_checked);
}

#[test]
fn test_multi_file_modes() {
    let dir = Mode::replace(Scope::Directory).visible_controls();
    assert!(dir.search && dir.path && dir.mask && dir.replace_checked && dir.encoding);
    assert!(!dir.next && !dir.replace);

    let opened = Mode::search(Scope::OpenedFiles).visible_controls();
    assert!(opened.search && opened.mask && !opened.path && !opened.encoding);

    let project = Mode::search(Scope::ProjectFiles).visible_controls();
    assert!(project.mask && !project.path);
}
