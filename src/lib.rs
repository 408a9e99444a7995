pub mod ambience;
pub mod app;
pub mod audio;
pub mod commands;
pub mod db;
pub mod effects;
pub mod events;
pub mod notify;
pub mod settings;
pub mod tasks;
pub mod timer;
mod utils;

use anyhow::Result;
use log::{error, info};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use app::App;
use commands::{describe_snapshot, execute, parse_line, Outcome};
use events::{AppEvent, Celebration};

pub use utils::time::format_clock;

/// Prints state changes worth showing: not every tick, only transitions.
async fn report(app_events: events::EventBus, timer: timer::TimerController) {
    let mut events = app_events.subscribe();
    let mut snapshots = timer.subscribe();
    let mut last = snapshots.borrow().state.clone();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                let state = &snapshot.state;
                if state.running != last.running || state.kind != last.kind {
                    println!("{}", describe_snapshot(&snapshot));
                }
                last = snapshot.state;
            }
            event = events.recv() => match event {
                Ok(AppEvent::SessionCompleted(completion)) => println!(
                    "{} complete. Next: {} (press start)",
                    completion.finished.label(),
                    completion.next.label()
                ),
                Ok(AppEvent::Celebrate { reason: Celebration::SessionCompleted }) => {
                    println!("*** session done, well played ***")
                }
                Ok(AppEvent::Celebrate { reason: Celebration::TaskCompleted }) => {
                    println!("*** task done ***")
                }
                Ok(AppEvent::UpsellRequested { item }) => {
                    println!("'{item}' is part of Premium: custom sounds, more themes, no limits")
                }
                Ok(AppEvent::TasksChanged { .. }) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}

async fn session() -> Result<()> {
    let data_dir = settings::data_dir();
    let app = App::open(&data_dir).await?;
    info!("Data directory: {}", data_dir.display());

    let reporter = tokio::spawn(report(app.events.clone(), app.timer.clone()));

    println!("{}", describe_snapshot(&app.timer.get_snapshot().await));
    println!("type 'help' for commands");

    serve(&app, BufReader::new(tokio::io::stdin())).await;
    reporter.abort();
    Ok(())
}

/// Reads commands until `quit`, end of input or a read error, then shuts the
/// app down.
async fn serve<R: AsyncBufRead + Unpin>(app: &App, input: R) {
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                error!("failed to read input: {err}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(err) => {
                print!("{err}");
                continue;
            }
        };
        match execute(app, command).await {
            Ok(Outcome::Reply(text)) => println!("{text}"),
            Ok(Outcome::Quit) => break,
            Err(err) => {
                error!("command failed: {err:#}");
                println!("error: {err}");
            }
        }
    }

    app.shutdown().await;
}

pub fn run() -> Result<()> {
    utils::logging::init();
    info!("Deep Focus starting up...");

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(session())
}
