//! HTTP front end for babylog.
//!
//! Exposes an axum [`Router`] serving the voice-assistant webhook, the
//! identity-provider login flow and the JSON API from `babylog-api`, backed
//! by any store implementing [`RecordStore`] and [`IdentityLinker`].

pub mod alice;
pub mod auth;
pub mod error;
pub mod login_state;
pub mod provider;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use babylog_core::{
  interpreter::{Interpreter, Trigger},
  store::{IdentityLinker, RecordStore},
};
use serde::Deserialize;

use provider::IdentityProvider;

pub const LIVENESS_TEXT: &str = "babylog server is running!";

/// Used when no `session_secret` is configured. Anyone who knows it can
/// forge login state, so startup warns about it.
pub const INSECURE_SESSION_SECRET: &str = "insecure-session-secret";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// environment. Every key has a default.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  pub store_path:           PathBuf,
  pub yandex_client_id:     String,
  pub yandex_client_secret: String,
  /// Redirect URI registered with the provider.
  pub callback_url:         String,
  /// Key for signing the OAuth state.
  pub session_secret:       String,
  /// App URL opened after a successful login.
  pub deep_link:            String,
  /// `en` or `ru`; picks the built-in trigger phrases.
  pub language:             String,
  /// Overrides the built-in trigger phrases when non-empty.
  pub triggers:             Vec<Trigger>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                 "0.0.0.0".to_string(),
      port:                 3000,
      store_path:           PathBuf::from("babylog.db"),
      yandex_client_id:     String::new(),
      yandex_client_secret: String::new(),
      callback_url:         "http://localhost:3000/auth/yandex/callback".to_string(),
      session_secret:       INSECURE_SESSION_SECRET.to_string(),
      deep_link:            "babylog://auth".to_string(),
      language:             "en".to_string(),
      triggers:             Vec::new(),
    }
  }
}

impl ServerConfig {
  pub fn interpreter(&self) -> Interpreter {
    if self.triggers.is_empty() {
      Interpreter::for_language(&self.language)
    } else {
      Interpreter::new(self.triggers.iter().cloned())
    }
  }

  pub fn has_insecure_secret(&self) -> bool {
    self.session_secret.is_empty() || self.session_secret == INSECURE_SESSION_SECRET
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S, P> {
  pub store:       Arc<S>,
  pub provider:    Arc<P>,
  pub interpreter: Arc<Interpreter>,
  pub config:      Arc<ServerConfig>,
}

impl<S, P> AppState<S, P> {
  pub fn new(store: S, provider: P, config: ServerConfig) -> Self {
    Self {
      store:       Arc::new(store),
      provider:    Arc::new(provider),
      interpreter: Arc::new(config.interpreter()),
      config:      Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application [`Router`]; the JSON API is nested at `/api`.
pub fn router<S, P>(state: AppState<S, P>) -> Router
where
  S: RecordStore + IdentityLinker + Clone + Send + Sync + 'static,
  P: IdentityProvider + Clone + Send + Sync + 'static,
{
  let api = babylog_api::api_router(state.store.clone());

  Router::new()
    .route("/",                     get(liveness))
    .route("/alice",                post(alice::handler::<S, P>))
    .route("/auth/yandex",          get(auth::login::<S, P>))
    .route("/auth/yandex/callback", get(auth::callback::<S, P>))
    .with_state(state)
    .nest("/api", api)
}

async fn liveness() -> &'static str { LIVENESS_TEXT }

// ─── Integration tests ────────────────────────────────────────────────────────
