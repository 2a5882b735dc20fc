//! Terminal front-end for the circulation desk.
//!
//! `App` holds one filterable list per tab (active loans, overdue loans,
//! fines, members, catalog) and turns key presses into `Library` calls.
//! `run_app` owns the terminal and the event loop.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
