use polars::error::PolarsError;
use std::io::Error;

pub const HELP_TEXT: &str = "\
Header: <Tab> switch to rows, <Left>/<Right> or h/l move, <Enter>/<Space> sort
Rows:   <Tab> switch to header, <Up>/<Down> or k/j move, <Enter>/<Space> select
Table:  a select all, y copy selection, L loading, E empty, R reset data
Mouse:  click a header to sort, click a checkbox to select
Other:  ? help, <Esc> close popup, q quit";

// Errors of the fallible surfaces: file loading, terminal and clipboard.
// The table itself never fails.
#[derive(Debug)]
pub enum DTError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    Clipboard(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl From<Error> for DTError {
    fn from(err: Error) -> Self {
        DTError::IoError(err)
    }
}

impl From<PolarsError> for DTError {
    fn from(err: PolarsError) -> Self {
        DTError::PolarsError(err)
    }
}

#[derive(Debug, Clone)]
pub struct DTConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub selectable: bool,
}

impl Default for DTConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            max_column_width: 40,
            selectable: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Header,
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Quit,
    Exit,
    Help,
    SwitchFocus,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    Activate,
    Click(u16, u16),
    ToggleSelectAll,
    ToggleLoading,
    ToggleEmpty,
    ResetData,
    CopySelection,
    Resize(u16, u16),
}
