//! zsearch 命令行：在目录中搜索，可选地替换所有匹配

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use clap::Parser;
use thiserror::Error;
use zsearch::kernel::services::adapters::{
    load_settings_or_default, AsyncRuntime, LocalFileProvider, ReplaceJob, ReplacementTemplate,
    SearchJob, WalkEnumerator,
};
use zsearch::kernel::services::ports::{
    FileMasks, FileStatus, FinishReason, JobEvent, JobEventKind, Mode, PatternFlags,
    ReplaceTarget, Scope, SearchContext, SearchError, SearchPattern,
};

mod logging;

#[derive(Parser)]
#[command(name = "zsearch", about = "Search (and optionally replace) text across files", version)]
struct Cli {
    /// Text to search for; a regular expression with --regex
    pattern: String,

    /// Directory to search in
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Treat the pattern as a regular expression
    #[arg(short = 'e', long)]
    regex: bool,

    #[arg(short = 's', long)]
    case_sensitive: bool,

    /// Space separated file masks, e.g. "*.rs *.toml"
    #[arg(short, long, value_name = "MASKS")]
    mask: Option<String>,

    /// Replace every match; supports \1, \g<1> and \g<name>
    #[arg(short, long, value_name = "TEMPLATE")]
    replace: Option<String>,

    /// Settings file (JSON)
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("{0} did not complete")]
    Interrupted(&'static str),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _logging = logging::init(cli.log_dir.as_deref());

    match run(&cli) {
        Ok(0) => ExitCode::from(1),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "zsearch failed");
            eprintln!("zsearch: {e}");
            ExitCode::from(2)
        }
    }
}

/// 返回匹配数
fn run(cli: &Cli) -> Result<usize, CliError> {
    let settings = load_settings_or_default(cli.settings.as_deref());

    let flags = PatternFlags {
        regex: cli.regex,
        case_sensitive: cli.case_sensitive,
    };
    let pattern = SearchPattern::compile(&cli.pattern, flags)?;
    let mask_text = cli
        .mask
        .clone()
        .unwrap_or_else(|| settings.default_masks.join(" "));
    let masks = FileMasks::parse(&mask_text)?;

    let root = if cli.path.is_absolute() {
        cli.path.clone()
    } else {
        std::env::current_dir()?.join(&cli.path)
    };
    if !root.is_dir() {
        return Err(CliError::NotADirectory(root));
    }

    let mode = match cli.replace {
        Some(_) => Mode::replace(Scope::Directory),
        None => Mode::search(Scope::Directory),
    };
    let context = Arc::new(
        SearchContext::new(pattern, mode)
            .with_replacement(cli.replace.clone().unwrap_or_default())
            .with_file_masks(masks)
            .with_search_path(root),
    );
    if cli.replace.is_some() {
        ReplacementTemplate::parse(context.replacement(), context.pattern().regex())?;
    }

    let runtime = AsyncRuntime::new()?;
    let files = Arc::new(LocalFileProvider::new());
    let enumerator = Arc::new(WalkEnumerator::new(&settings));

    let mut search = SearchJob::new(runtime.tokio_handle(), files.clone(), enumerator, &settings);
    let events = search.subscribe();
    let run_id = search.start(context.clone());

    let mut found = Vec::new();
    let reason = wait_for(&events, run_id, |kind| match kind {
        JobEventKind::FileMatches(file_matches) => {
            for m in &file_matches.matches {
                println!(
                    "{}:{}:{}: {}",
                    file_matches.path.display(),
                    m.line + 1,
                    m.col + 1,
                    m.text.escape_debug()
                );
            }
            found.push(file_matches);
        }
        JobEventKind::FileOutcome(outcome) if outcome.status == FileStatus::Error => {
            eprintln!(
                "{}: {}",
                outcome.path.display(),
                outcome.error.unwrap_or_default()
            );
        }
        JobEventKind::Error { message, .. } => eprintln!("{message}"),
        _ => {}
    });
    if reason != FinishReason::Completed {
        return Err(CliError::Interrupted("search"));
    }

    let total: usize = found.iter().map(|f| f.matches.len()).sum();
    println!("{total} match(es) in {} file(s)", found.len());

    if cli.replace.is_none() || found.is_empty() {
        return Ok(total);
    }

    let mut replace = ReplaceJob::new(runtime.tokio_handle(), files, &settings);
    let events = replace.subscribe();
    let targets: Vec<ReplaceTarget> = found.into_iter().map(ReplaceTarget::from).collect();
    let run_id = replace.replace(context, targets);

    let mut replaced = 0;
    let reason = wait_for(&events, run_id, |kind| match kind {
        JobEventKind::ResultsHandled(outcomes) => {
            for outcome in outcomes {
                match outcome.status {
                    FileStatus::Replaced => replaced += outcome.replacements,
                    FileStatus::Error => eprintln!(
                        "{}: {}",
                        outcome.path.display(),
                        outcome.error.unwrap_or_default()
                    ),
                    _ => {}
                }
            }
        }
        JobEventKind::Error { path: None, message } => eprintln!("{message}"),
        _ => {}
    });
    if reason != FinishReason::Completed {
        return Err(CliError::Interrupted("replace"));
    }
    println!("{replaced} occurrence(s) replaced.");

    Ok(total)
}

/// 阻塞消费一次运行的事件，直到 `Finished`
fn wait_for<F>(events: &Receiver<JobEvent>, run_id: u64, mut on_event: F) -> FinishReason
where
    F: FnMut(JobEventKind),
{
    for event in events.iter() {
        if event.run_id != run_id {
            continue;
        }
        match event.kind {
            JobEventKind::Finished(reason) => return reason,
            kind => on_event(kind),
        }
    }
    FinishReason::Failed
}
