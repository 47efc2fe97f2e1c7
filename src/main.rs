mod config;
mod dashboard;
mod mood_entry;
mod sheet;
mod ui;

use std::fs::OpenOptions;
use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

use config::Settings;
use dashboard::Dashboard;
use sheet::{Credentials, SheetClient};
use ui::{Action, UI};

const LOG_FILE: &str = "mood_queue.log";

fn main() -> Result<()> {
    color_eyre::install()?;
    init_logging()?;

    let settings = Settings::from_env()?;
    let credentials = Credentials::from_file(&settings.credentials_path)?;
    // An authentication failure here is fatal: nothing renders without the store.
    let client = SheetClient::connect(credentials, settings.spreadsheet_id, settings.worksheet)
        .wrap_err("could not open the mood sheet")?;

    let mut dashboard = Dashboard::new(client);
    dashboard.reload();

    let mut ui = UI::new()?;

    loop {
        dashboard.tick();
        ui.display(&dashboard)?;

        if let Some(action) = ui.handle_input()? {
            match action {
                Action::LogMood => {
                    if let Some((mood, note)) = ui.log_mood_form()? {
                        dashboard.submit(mood, note);
                    }
                }
                Action::PrevDay => dashboard.prev_day(),
                Action::NextDay => dashboard.next_day(),
                Action::Today => dashboard.today(),
                Action::Refresh => dashboard.reload(),
                Action::Quit => break,
            }
        }
    }

    Ok(())
}

/// The TUI owns the terminal, so tracing goes to a file instead of stderr.
fn init_logging() -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(LOG_FILE)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}
