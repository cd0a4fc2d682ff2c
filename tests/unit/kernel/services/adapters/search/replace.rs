use super::*;
use crate::kernel::services::adapters::file::LocalFileProvider;
use crate::kernel::services::adapters::search::MatchEngine;
use crate::kernel::services::ports::mode::{Mode, Scope};
use crate::kernel::services::ports::search::{FileStatus, PatternFlags, SearchPattern};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;

fn create_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap()
}

fn create_job(rt: &tokio::runtime::Runtime) -> ReplaceJob {
    ReplaceJob::new(
        rt.handle().clone(),
        Arc::new(LocalFileProvider::new()),
        &SearchSettings::default(),
    )
}

fn regex_pattern(source: &str) -> SearchPattern {
    SearchPattern::compile(
        source,
        PatternFlags {
            regex: true,
            case_sensitive: true,
        },
    )
    .unwrap()
}

fn target_for(pattern: &SearchPattern, path: &Path, text: &str) -> ReplaceTarget {
    ReplaceTarget {
        path: path.to_path_buf(),
        matches: MatchEngine::new(pattern).find_all(text),
    }
}

fn collect_run(rx: &Receiver<JobEvent>, run_id: u64) -> Vec<JobEventKind> {
    let mut events = Vec::new();
    loop {
        let event = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("Timeout");
        if event.run_id != run_id {
            continue;
        }
        let done = matches!(event.kind, JobEventKind::Finished(_));
        events.push(event.kind);
        if done {
            return events;
        }
    }
}

fn handled(events: &[JobEventKind]) -> Vec<FileOutcome> {
    events
        .iter()
        .find_map(|e| match e {
            JobEventKind::ResultsHandled(outcomes) => Some(outcomes.clone()),
            _ => None,
        })
        .expect("no ResultsHandled event")
}

#[test]
fn test_closed_file_is_written_to_disk() {
    let rt = create_runtime();
    let mut job = create_job(&rt);
    let rx = job.subscribe();

    let dir = tempdir().unwrap();
    let path = dir.path().join("a.txt");
    fs::write(&path, "cat dog cat").unwrap();

    let pattern = regex_pattern("cat");
    let target = target_for(&pattern, &path, "cat dog cat");
    let context = Arc::new(
        SearchContext::new(pattern, Mode::replace(Scope::Directory)).with_replacement("bird"),
    );

    let run_id = job.replace(context, vec![target]);
    let events = collect_run(&rx, run_id);

    assert_eq!(fs::read_to_string(&path).unwrap(), "bird dog bird");
    let outcomes = handled(&events);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status, FileStatus::Replaced);
    assert_eq!(outcomes[0].replacements, 2);
    assert_eq!(outcomes[0].new_content, None);
    assert_eq!(
        events.last(),
        Some(&JobEventKind::Finished(FinishReason::Completed))
    );
}

#[test]
fn test_open_file_is_handed_back_not_written() {
    let rt = create_runtime();
    let mut job = create_job(&rt);
    let rx = job.subscribe();

    let dir = tempdir().unwrap();
    let path = dir.path().join("open.txt");
    fs::write(&path, "on disk").unwrap();

    let pattern = regex_pattern(r"(\w+)@(\w+)");
    let buffer = "mail ann@home now";
    let target = target_for(&pattern, &path, buffer);
    let context = Arc::new(
        SearchContext::new(pattern, Mode::replace(Scope::OpenedFiles))
            .with_replacement(r"\2/\1")
            .with_opened_files([(path.clone(), buffer.to_string())]),
    );

    let run_id = job.replace(context, vec![target]);
    let events = collect_run(&rx, run_id);

    assert!(events.contains(&JobEventKind::OpenedFileHandled {
        path: path.clone(),
        content: "mail home/ann now".to_string(),
    }));
    assert_eq!(fs::read_to_string(&path).unwrap(), "on disk");
    let outcomes = handled(&events);
    assert_eq!(
        outcomes[0].new_content.as_deref(),
        Some("mail home/ann now")
    );
}

#[test]
fn test_only_checked_matches_are_replaced() {
    let rt = create_runtime();
    let mut job = create_job(&rt);
    let rx = job.subscribe();

    let dir = tempdir().unwrap();
    let path = dir.path().join("a.txt");
    fs::write(&path, "x x x").unwrap();

    let pattern = regex_pattern("x");
    let mut target = target_for(&pattern, &path, "x x x");
    target.matches.remove(1);
    let context = Arc::new(
        SearchContext::new(pattern, Mode::replace(Scope::Directory)).with_replacement("y"),
    );

    let run_id = job.replace(context, vec![target]);
    collect_run(&rx, run_id);
    assert_eq!(fs::read_to_string(&path).unwrap(), "y x y");
}

#[test]
fn test_stale_checked_matches_are_skipped() {
    let rt = create_runtime();
    let mut job = create_job(&rt);
    let rx = job.subscribe();

    let dir = tempdir().unwrap();
    let path = dir.path().join("a.txt");
    let pattern = regex_pattern("cat");
    let target = target_for(&pattern, &path, "zz cat");
    // 勾选之后文件被改动，原来的匹配位置不再命中
    fs::write(&path, "cat zz").unwrap();
    let context = Arc::new(
        SearchContext::new(pattern, Mode::replace(Scope::Directory)).with_replacement("dog"),
    );

    let run_id = job.replace(context, vec![target]);
    let outcomes = handled(&collect_run(&rx, run_id));

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status, FileStatus::Skipped);
    assert_eq!(outcomes[0].replacements, 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), "cat zz");
}

#[test]
fn test_template_error_aborts_only_that_file() {
    let rt = create_runtime();
    let mut job = create_job(&rt);
    let rx = job.subscribe();

    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.txt");
    let good = dir.path().join("good.txt");
    fs::write(&good, "abc").unwrap();

    let pattern = regex_pattern("b");
    let targets = vec![
        target_for(&pattern, &missing, "abc"),
        target_for(&pattern, &good, "abc"),
    ];
    let context = Arc::new(
        SearchContext::new(pattern, Mode::replace(Scope::Directory)).with_replacement(r"\1"),
    );

    let run_id = job.replace(context, targets);
    let events = collect_run(&rx, run_id);

    let errors: Vec<&Option<PathBuf>> = events
        .iter()
        .filter_map(|e| match e {
            JobEventKind::Error { path, .. } => Some(path),
            _ => None,
        })
        .collect();
    assert_eq!(errors, vec![&Some(missing.clone()), &Some(good.clone())]);
    assert_eq!(fs::read_to_string(&good).unwrap(), "abc");

    let outcomes = handled(&events);
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.status == FileStatus::Error));
    assert!(outcomes[1]
        .error
        .as_deref()
        .unwrap()
        .contains("invalid group reference"));
    assert_eq!(
        events.last(),
        Some(&JobEventKind::Finished(FinishReason::Completed))
    );
}

#[test]
fn test_progress_covers_every_target() {
    let rt = create_runtime();
    let mut job = create_job(&rt);
    let rx = job.subscribe();

    let dir = tempdir().unwrap();
    let pattern = regex_pattern("a");
    let mut targets = Vec::new();
    for i in 0..3 {
        let path = dir.path().join(format!("{i}.txt"));
        fs::write(&path, "a").unwrap();
        targets.push(target_for(&pattern, &path, "a"));
    }
    let context = Arc::new(
        SearchContext::new(pattern, Mode::replace(Scope::Directory)).with_replacement("b"),
    );

    let run_id = job.replace(context, targets);
    let events = collect_run(&rx, run_id);

    let progress: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            JobEventKind::Progress(p) => Some(p.completed),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![1, 2, 3]);
}
