//! Search/replace modes and the controls each of them exposes.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Search,
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    CurrentFile,
    Directory,
    ProjectFiles,
    OpenedFiles,
}

impl Scope {
    pub fn is_multi_file(self) -> bool {
        !matches!(self, Scope::CurrentFile)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    Hidden,
    Active(Operation, Scope),
}

impl Mode {
    pub const ALL: [Mode; 9] = [
        Mode::Hidden,
        Mode::Active(Operation::Search, Scope::CurrentFile),
        Mode::Active(Operation::Replace, Scope::CurrentFile),
        Mode::Active(Operation::Search, Scope::Directory),
        Mode::Active(Operation::Replace, Scope::Directory),
        Mode::Active(Operation::Search, Scope::ProjectFiles),
        Mode::Active(Operation::Replace, Scope::ProjectFiles),
        Mode::Active(Operation::Search, Scope::OpenedFiles),
        Mode::Active(Operation::Replace, Scope::OpenedFiles),
    ];

    pub fn search(scope: Scope) -> Self {
        Mode::Active(Operation::Search, scope)
    }

    pub fn replace(scope: Scope) -> Self {
        Mode::Active(Operation::Replace, scope)
    }

    pub fn operation(self) -> Option<Operation> {
        match self {
            Mode::Hidden => None,
            Mode::Active(operation, _) => Some(operation),
        }
    }

    pub fn scope(self) -> Option<Scope> {
        match self {
            Mode::Hidden => None,
            Mode::Active(_, scope) => Some(scope),
        }
    }

    pub fn is_visible(self) -> bool {
        self != Mode::Hidden
    }

    pub fn is_current_file(self) -> bool {
        self.scope() == Some(Scope::CurrentFile)
    }

    pub fn is_multi_file(self) -> bool {
        self.scope().is_some_and(Scope::is_multi_file)
    }

    pub fn visible_controls(self) -> ControlSet {
        use Operation::*;
        use Scope::*;

        //                                               sear prev next srch repl path rep  rall rchk opts mask enc
        #[rustfmt::skip]
        let row = match self {
            Mode::Hidden =>                             [0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0],
            Mode::Active(Search, CurrentFile) =>        [1,   1,   1,   0,   0,   0,   0,   0,   0,   1,   0,   0],
            Mode::Active(Replace, CurrentFile) =>       [1,   1,   1,   0,   1,   0,   1,   1,   0,   1,   0,   0],
            Mode::Active(Search, Directory) =>          [1,   0,   0,   1,   0,   1,   0,   0,   0,   1,   1,   1],
            Mode::Active(Replace, Directory) =>         [1,   0,   0,   1,   1,   1,   0,   0,   1,   1,   1,   1],
            Mode::Active(Search, ProjectFiles) =>       [1,   0,   0,   1,   0,   0,   0,   0,   0,   1,   1,   1],
            Mode::Active(Replace, ProjectFiles) =>      [1,   0,   0,   1,   1,   0,   0,   0,   1,   1,   1,   1],
            Mode::Active(Search, OpenedFiles) =>        [1,   0,   0,   1,   0,   0,   0,   0,   0,   1,   1,   0],
            Mode::Active(Replace, OpenedFiles) =>       [1,   0,   0,   1,   1,   0,   0,   0,   1,   1,   1,   0],
        };
        ControlSet::from_row(row)
    }
}

/// Visibility flags pushed to the view for a mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ControlSet {
    pub search_input: bool,
    pub previous: bool,
    pub next: bool,
    pub search: bool,
    pub replace_input: bool,
    pub path: bool,
    pub replace: bool,
    pub replace_all: bool,
    pub replace_checked: bool,
    pub options: bool,
    pub mask: bool,
    pub encoding: bool,
}

impl ControlSet {
    fn from_row(row: [u8; 12]) -> Self {
        Self {
            search_input: row[0] != 0,
            previous: row[1] != 0,
            next: row[2] != 0,
            search: row[3] != 0,
            replace_input: row[4] != 0,
            path: row[5] != 0,
            replace: row[6] != 0,
            replace_all: row[7] != 0,
            replace_checked: row[8] != 0,
            options: row[9] != 0,
            mask: row[10] != 0,
            encoding: row[11] != 0,
        }
    }

    pub fn any(&self) -> bool {
        *self != Self::default()
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/ports/mode.rs"]
mod tests;
