//! Terminal front end for the todo store.
//!
//! Reads commands from stdin, dispatches them, and redraws whenever the
//! store publishes a new state.

use anyhow::Context as _;
use std::time::Duration;
use todo::view::{self, Command, ViewError};
use todo::{TodoConfig, TodoEnvironment, build_store};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interleave with the rendered list.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo=info,statekit_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = TodoConfig::from_env().context("loading configuration")?;
    info!(
        theme = %config.theme,
        mode = %config.mode,
        broadcast_capacity = config.broadcast_capacity,
        "Configuration loaded"
    );

    let store = build_store(&config, TodoEnvironment::live());

    let mut updates = store.subscribe();
    let renderer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let frame = view::render(&updates.borrow_and_update());
            println!("{frame}");
        }
    });

    println!("{}", view::render(&store.snapshot().await));
    println!("{}", view::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        match Command::parse(&line) {
            Ok(Command::Dispatch(action)) => {
                info!(kind = action.kind(), "Dispatching");
                store.send(action).await?;
            },
            Ok(Command::List) => println!("{}", view::render(&store.snapshot().await)),
            Ok(Command::Help) => println!("{}", view::HELP),
            Ok(Command::Quit) => break,
            Err(ViewError::Empty) => {},
            Err(error) => {
                warn!(%error, "Rejected input");
                eprintln!("{error}");
            },
        }
    }

    store.shutdown(Duration::from_secs(1)).await?;
    renderer.abort();
    info!("Bye");
    Ok(())
}
