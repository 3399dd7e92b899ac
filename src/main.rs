mod config;
mod db;
mod export;
mod logging;
mod models;
mod notify;
mod report;
mod run;
mod series;
mod util;

use anyhow::Result;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    logging::init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let data_dir = config::data_dir()?;
    let settings = config::Config::load(&data_dir.join(config::CONFIG_FILE))?;
    let db_path = settings.database_path(
        &data_dir,
        std::env::var_os(config::DB_ENV).map(PathBuf::from),
    );
    let mut db = db::Database::open(&db_path)?;

    let today = chrono::Local::now().date_naive();
    let mut sink = notify::TerminalSink;
    let mut session = run::Session::new(&mut db, &settings, today, &mut sink);
    run::as_cli(&args, &mut session)?;

    Ok(if session.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
