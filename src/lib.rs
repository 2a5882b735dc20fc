//! Circulation desk for a small lending library: catalog, members, loans,
//! and overdue fines over an embedded SQLite database, with a Ratatui
//! front-end.
//!
//! The layers are split so the rules can be exercised without a terminal or
//! a database file: `models` holds the records, `store` the storage contract
//! (with an in-memory implementation), `db` the SQLite implementation, and
//! `services::Library` the operations the desk performs.
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod store;
pub mod ui;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use db::SqliteStore;
pub use error::{EntityKind, LibraryError, LibraryResult};
pub use services::Library;
pub use store::{LibraryStore, MemoryStore};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
