//! Binary entry point: load settings, start file logging, open the database,
//! and hand the terminal to the desk until the user quits.
use anyhow::Context;
use tracing::{error, info};

use library_desk::logging::init_logging;
use library_desk::{run_app, App, AppConfig, Clock, Library, SqliteStore, SystemClock};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    let _guard = init_logging(&config.logging)?;
    info!(database = %config.database.path.display(), "starting library desk");

    let mut store = SqliteStore::open(&config.database.path)
        .with_context(|| format!("failed to open {}", config.database.path.display()))?;
    if config.database.seed_sample_data {
        store.seed_sample_data(SystemClock.today())?;
    }

    let library = Library::new(store, SystemClock, config.fines);
    let mut app = App::new(library)?;
    let result = run_app(&mut app);
    if let Err(err) = &result {
        error!(error = %err, "desk stopped with an error");
    }
    info!("library desk closed");
    result
}
