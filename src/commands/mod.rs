//! Command implementations shared by the CLI and tests.
//!
//! Each `execute_*` takes a typed input and returns a serializable output.

mod history;
mod search;

// history
pub use history::{
    execute_create_user, execute_history, execute_show_user, open_session, CreateUserInput,
    HistoryAction, HistoryOutput, UserOutput,
};

// search
pub use search::{
    execute_detail, execute_search, execute_suggest, DetailInput, ErrorInfo, FoodResultItem,
    SearchInput, SearchOutput, SkippedItem, SuggestInput, SuggestOutput,
};
