mod render;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use kart_core::config::{self, Config};
use kart_core::{HttpCatalog, ProductsView, SearchSession};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Search a product catalog as you type.
///
/// Each line on stdin is the full current contents of the search box.
/// Results are printed once input has been quiet for the debounce window.
#[derive(Debug, Parser)]
#[command(name = "kart", version)]
struct Cli {
    /// Config file (default: ~/.config/kart/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Catalog API base URL, overriding the config file
    #[arg(long)]
    endpoint: Option<String>,

    /// Debounce window in milliseconds, overriding the config file
    #[arg(long)]
    debounce_ms: Option<u64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_from(path),
        None => config::load(),
    };
    if let Some(endpoint) = cli.endpoint {
        config.catalog.endpoint = endpoint;
    }
    if let Some(ms) = cli.debounce_ms {
        config.search.debounce_ms = ms;
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime");

    if let Err(e) = rt.block_on(run(config, BufReader::new(tokio::io::stdin()))) {
        eprintln!("kart: {e}");
        process::exit(2);
    }
}

/// Drive a session from `input` until it ends and the last search has settled.
async fn run<R: AsyncBufRead + Unpin>(config: Config, input: R) -> kart_core::Result<()> {
    let catalog = Arc::new(HttpCatalog::from_config(&config)?);
    tracing::info!(
        "Using catalog at {} (debounce {}ms)",
        catalog.base_url(),
        config.search.debounce_ms
    );

    let view = Arc::new(ProductsView::new());
    let mut states = view.subscribe();
    let mut session =
        SearchSession::new(catalog, Arc::clone(&view), config.search.debounce_delay())?;

    session.load_all();

    let mut lines = input.lines();
    let mut input_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line(), if input_open => match line {
                Ok(Some(text)) => session.on_input(text),
                Ok(None) => {
                    tracing::debug!("Input closed, waiting for the last search");
                    input_open = false;
                }
                Err(e) => {
                    tracing::error!("Failed to read input: {}", e);
                    input_open = false;
                }
            },
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                render::print_state(&state);
            }
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted");
                break;
            }
        }

        let settled = !session.is_pending()
            && !view.state().is_loading()
            && !states.has_changed().unwrap_or(false);
        if !input_open && settled {
            break;
        }
    }

    // Dropping the session cancels the timer and any request still in flight
    drop(session);
    Ok(())
}
