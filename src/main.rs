use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backlog_board::{client::BacklogClient, tree, tui};

#[derive(Parser)]
#[command(name = "backlog-board")]
#[command(about = "Terminal backlog browser with inline editing")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the backlog interactively
    Browse,
    /// Print the backlog hierarchy as an ASCII tree and exit
    Tree,
}

/// Initialize tracing with output to stderr (for TUI mode) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "backlog_board=debug".into()),
    );

    if use_stderr {
        // TUI mode: log to stderr so stdout is clean for the terminal
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The interactive view owns stdout, so its logs go to stderr
    let use_stderr = !matches!(cli.command, Some(Commands::Tree));
    init_tracing(use_stderr);

    let client = BacklogClient::from_env();

    match cli.command {
        Some(Commands::Tree) => {
            let snapshot = client.load_all().await?;
            let nodes = tree::build_tree(&snapshot.stories, &snapshot.features, &snapshot.tasks);
            print!("{}", tree::render_tree(&nodes));
        }
        Some(Commands::Browse) | None => {
            tracing::info!("Starting backlog browser");
            tui::run(client).await?;
        }
    }

    Ok(())
}
