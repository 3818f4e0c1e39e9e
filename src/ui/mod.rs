//! Console front end

mod activity_log;
mod app;
pub mod console;

pub use activity_log::ActivityLog;
pub use app::App;
pub use console::ConsoleCommand;
