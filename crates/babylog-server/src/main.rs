//! babylog server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), then
//! `BABYLOG_*` environment variables and a plain `PORT`, opens the SQLite
//! store, and serves the webhook, login flow and JSON API over HTTP.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use babylog_server::{AppState, ServerConfig, provider::YandexProvider};
use babylog_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "babylog voice-assistant backend")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
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

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("BABYLOG"))
    .set_override_option("port", std::env::var("PORT").ok())
    .context("invalid PORT")?
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if server_cfg.has_insecure_secret() {
    tracing::warn!(
      "session_secret is not set; login state is signed with a well-known key"
    );
  }
  if server_cfg.yandex_client_id.is_empty() {
    tracing::warn!("yandex_client_id is not set; login will fail");
  }

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let provider =
    YandexProvider::new(&server_cfg).context("failed to build identity provider")?;

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let state = AppState::new(store, provider, server_cfg);
  let app = babylog_server::router(state).layer(TraceLayer::new_for_http());

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
