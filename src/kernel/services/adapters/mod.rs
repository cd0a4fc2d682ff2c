//! Service adapters: OS/runtime specific implementations (IO/async).

pub mod file;
pub mod runtime;
pub mod search;
pub mod settings;

pub use file::{LocalFileProvider, WalkEnumerator};
pub use runtime::AsyncRuntime;
pub use search::{JobRunner, MatchEngine, ReplaceJob, ReplacementTemplate, RunContext, SearchJob};
pub use settings::{
    ensure_log_dir, get_log_dir, get_settings_path, load_settings, load_settings_or_default,
    SettingsError,
};
