//! `league` server binary.
//!
//! Reads `league.toml` (or the path given with `--config`) layered with
//! `LEAGUE_*` environment variables, opens the SQLite store, and either
//! serves the JSON API or runs one of the offline subcommands.
//!
//! ```text
//! league serve
//! league import papers.yaml --category cs --subcategory LG --year 2024
//! league export --output matches.yaml
//! league rank matches.yaml --by papers
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use league_api::AppState;
use league_arena::CompetitionManager;
use league_codec::interchange::parse_matches;
use league_providers::Upstream;
use league_server::{
  RankBy, ServerConfig, app, export_matches, import_papers, rank_document, register_agents,
  render_table,
};
use league_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Paper evaluation league server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "league.toml", env = "LEAGUE_CONFIG")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API (the default).
  Serve,
  /// Add the papers of a YAML papers document to the store.
  Import {
    file:        PathBuf,
    #[arg(long)]
    category:    String,
    #[arg(long)]
    subcategory: String,
    #[arg(long)]
    year:        i32,
  },
  /// Write completed matches as a YAML matches document.
  Export {
    /// Output file; stdout if omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
  /// Print a leaderboard for an exported matches document.
  Rank {
    file: PathBuf,
    #[arg(long, value_enum, default_value = "reviewers")]
    by:   RankBy,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Ranking a document needs neither configuration nor a store.
  if let Some(Command::Rank { file, by }) = &cli.command {
    let raw = std::fs::read_to_string(file)
      .with_context(|| format!("failed to read {}", file.display()))?;
    let doc = parse_matches(&raw).context("failed to parse matches document")?;
    print!("{}", render_table(&rank_document(&doc, *by)));
    return Ok(());
  }

  let config = ServerConfig::load(&cli.config).context("failed to read configuration")?;
  let store = SqliteStore::open(&config.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", config.store_path))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(config, store).await,
    Command::Import { file, category, subcategory, year } => {
      let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;
      let (added, skipped) = import_papers(&store, &raw, &category, &subcategory, year)
        .await
        .context("import failed")?;
      tracing::info!(added, skipped, "import finished");
      Ok(())
    }
    Command::Export { output } => {
      let yaml = export_matches(&store).await.context("export failed")?;
      match output {
        Some(path) => std::fs::write(&path, yaml)
          .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{yaml}"),
      }
      Ok(())
    }
    // Handled before the store is opened.
    Command::Rank { .. } => Ok(()),
  }
}

async fn serve(config: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  register_agents(&store, &config.agents)
    .await
    .context("failed to register agents")?;

  let upstream = Upstream::new(config.upstream()).context("failed to build HTTP client")?;
  let manager =
    CompetitionManager::new(store, upstream.clone()).with_judge(config.judge.clone());
  let app = app(AppState::new(manager, upstream));

  let address = config.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
