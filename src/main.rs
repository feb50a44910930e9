//! Studio concierge in the terminal

use std::path::PathBuf;
use std::sync::Arc;
use studio_concierge::config::{Timing, WidgetConfig};
use studio_concierge::conversation::WidgetContext;
use studio_concierge::persistence::{FileStore, Persistence};
use studio_concierge::runtime::{launch, ControllerHandle};
use studio_concierge::terminal::{TerminalNavigator, TerminalSurface};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const HELP: &str = "Befehle: <Nummer> Option wählen, b zurück, w <Zahl> Wortanzahl, ok Angebot anfragen, r neu starten, o öffnen, c schließen, q beenden";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they do not interleave with the transcript
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "studio_concierge=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var_os("STUDIO_CONCIERGE_LOG_JSON").is_some() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    // Configuration
    let config = WidgetConfig::from_env()?;
    let state_dir = std::env::var("STUDIO_CONCIERGE_STATE").map_or_else(
        |_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".studio-concierge")
        },
        PathBuf::from,
    );
    let html_path = std::env::var_os("STUDIO_CONCIERGE_HTML").map(PathBuf::from);
    let page_url = std::env::var("STUDIO_CONCIERGE_PAGE_URL").ok();

    let session = FileStore::new(state_dir.join("session.json"));
    tracing::info!(path = %session.path().display(), "Opening session store");
    let persistence = Persistence::new(session, FileStore::new(state_dir.join("local.json")));

    let ctx = WidgetContext::new(config, Timing::default());
    let (handle, task) = launch(
        ctx,
        persistence,
        Arc::new(TerminalSurface::new(html_path)),
        Arc::new(TerminalNavigator),
        page_url.as_deref(),
    )
    .await;

    println!("{HELP}");
    handle.open().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !run_command(&handle, line.trim()).await {
            break;
        }
    }

    // Dropping the last handle stops the runtime after a final save
    drop(handle);
    task.await?;
    Ok(())
}

/// Returns `false` to quit
async fn run_command(handle: &ControllerHandle, command: &str) -> bool {
    let accepted = match command {
        "" => true,
        "q" => return false,
        "b" => handle.go_back().await,
        "r" => handle.reset().await,
        "o" => handle.open().await,
        "c" => handle.close().await,
        "ok" => handle.confirm_calculator().await,
        "?" => {
            println!("{HELP}");
            true
        }
        _ => {
            if let Some(raw) = command.strip_prefix("w ") {
                handle.input_words(raw.trim()).await
            } else if let Ok(number) = command.parse::<usize>() {
                match number.checked_sub(1) {
                    Some(index) => handle.select_option(index).await,
                    None => false,
                }
            } else {
                println!("{HELP}");
                true
            }
        }
    };
    if !accepted {
        tracing::debug!(command, "Command ignored");
    }
    true
}
