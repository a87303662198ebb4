// Draft assistant entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open database, resolve the current draft id
// 4. Load projections
// 5. Build AppState, check for crash recovery
// 6. Create mpsc channels
// 7. Spawn stdin reader task
// 8. Spawn app logic task
// 9. Print UI updates until shutdown

use std::io::Write;

use gridiron_draft::app;
use gridiron_draft::config;
use gridiron_draft::db;
use gridiron_draft::protocol::{self, UiUpdate, UserCommand};
use gridiron_draft::valuation;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const PROMPT: &str = "draft> ";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Draft assistant starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} teams, {} roster spots per team",
        config.league.name,
        config.league.num_teams,
        config.league.roster_config().spots_per_team()
    );

    // 3. Open database
    let db = db::Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);

    let draft_id = match db.get_draft_id()? {
        Some(id) => id,
        None => {
            let id = db::Database::generate_draft_id();
            db.set_draft_id(&id)?;
            info!("Started new draft {}", id);
            id
        }
    };

    // 4. Load projections
    let pool = valuation::projections::load_all(&config.data_paths)
        .context("failed to load projections")?;
    info!("Loaded {} players from {}", pool.len(), config.data_paths.dir);

    // 5. Application state + crash recovery
    let mut app_state = app::AppState::new(config, pool, db, draft_id);
    match app::recover_from_db(&mut app_state) {
        Ok(true) => info!("Draft state restored from previous session"),
        Ok(false) => info!("Starting fresh draft session"),
        Err(e) => {
            error!("Crash recovery failed: {}", e);
            return Err(e.context("crash recovery failed"));
        }
    }

    // 6. Channels
    let (cmd_tx, cmd_rx) = mpsc::channel::<UserCommand>(64);
    let (ui_tx, mut ui_rx) = mpsc::channel::<UiUpdate>(64);

    // 7. Stdin reader: parse lines into commands. EOF quits.
    let reader_ui_tx = ui_tx.clone();
    let reader_handle = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!("stdin read failed: {}", e);
                    break;
                }
            };
            match protocol::parse_command(&line) {
                Ok(Some(cmd)) => {
                    if cmd_tx.send(cmd).await.is_err() {
                        return;
                    }
                }
                Ok(None) => {
                    let _ = reader_ui_tx.send(UiUpdate::Output(String::new())).await;
                }
                Err(e) => {
                    let _ = reader_ui_tx.send(UiUpdate::Error(e.to_string())).await;
                }
            }
        }
        let _ = cmd_tx.send(UserCommand::Quit).await;
    });

    // 8. App logic
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    // 9. Printer
    while let Some(update) = ui_rx.recv().await {
        match update {
            UiUpdate::Output(text) => print!("{text}"),
            UiUpdate::Error(msg) => eprintln!("error: {msg}"),
            UiUpdate::Shutdown => break,
        }
        print!("{PROMPT}");
        let _ = std::io::stdout().flush();
    }
    println!();

    let _ = app_handle.await;
    reader_handle.abort();

    info!("Draft assistant shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file, keeping the terminal for the prompt.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("gridiron.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gridiron_draft=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
