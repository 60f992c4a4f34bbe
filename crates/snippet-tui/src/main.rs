use std::fs::{self, File};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod clipboard;
mod handler;
mod highlight;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

/// Log to a file: the terminal belongs to the UI.
fn init_tracing() -> Result<()> {
    let dir = dirs::cache_dir()
        .context("could not determine cache directory")?
        .join("snippet");
    fs::create_dir_all(&dir)?;
    let file = File::create(dir.join("snippet.log"))?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("SNIPPET_LOG")
                .unwrap_or_else(|_| "snippet=info,snippet_core=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging is optional; a read-only cache dir must not stop the app
    let _ = init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "starting snippet");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(Duration::from_millis(250));

    let result = run(&mut terminal, &mut events).await;

    tui::restore()?;
    info!("exiting");
    result
}

async fn run(terminal: &mut tui::Tui, events: &mut EventHandler) -> Result<()> {
    let mut app = App::new(events.sender())?;

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(&mut app, event).await?;
    }

    app.quit();
    Ok(())
}
