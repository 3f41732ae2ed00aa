//! `POST /alice` — the voice-assistant webhook.
//!
//! The assistant expects a reply to every turn, so this handler always
//! answers `200` with a spoken text. Failures are logged and turned into an
//! apology. Records are written in a detached task after the reply is
//! built: persistence is best-effort and never delays or fails the turn.

use std::sync::Arc;

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use babylog_core::{
  identity::resolve_user_id,
  interpreter::Intent,
  store::{IdentityLinker, RecordStore},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::Error, provider::IdentityProvider};

pub const ACKNOWLEDGED: &str = "Got it, noted.";
pub const UNKNOWN_USER: &str =
  "Sorry, I couldn't tell who you are. Please link your account and try again.";
pub const FAILED: &str = "Sorry, something went wrong. Please try again later.";

const DEFAULT_VERSION: &str = "1.0";

// ─── Wire types ──────────────────────────────────────────────────────────────

// Every field is optional; `null` reads as absent.

#[derive(Debug, Default, Deserialize)]
pub struct AliceRequest {
  pub session: Option<Session>,
  pub request: Option<Utterance>,
  pub version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Session {
  pub application: Option<Application>,
  pub user_id:     Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Application {
  pub application_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Utterance {
  pub original_utterance: Option<String>,
}

impl AliceRequest {
  fn user_id(&self) -> Option<&str> {
    self.session.as_ref()?.user_id.as_deref()
  }

  fn application_id(&self) -> Option<&str> {
    self
      .session
      .as_ref()?
      .application
      .as_ref()?
      .application_id
      .as_deref()
  }

  fn utterance(&self) -> &str {
    self
      .request
      .as_ref()
      .and_then(|r| r.original_utterance.as_deref())
      .unwrap_or_default()
  }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AliceResponse {
  pub response: ResponseBody,
  pub version:  String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseBody {
  pub text:        String,
  pub end_session: bool,
}

impl AliceResponse {
  fn say(text: &str, version: Option<String>) -> Self {
    Self {
      response: ResponseBody { text: text.to_owned(), end_session: false },
      version:  version
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_VERSION.to_owned()),
    }
  }
}

// ─── Handler ─────────────────────────────────────────────────────────────────

pub async fn handler<S, P>(
  State(state): State<AppState<S, P>>,
  payload: Result<Json<AliceRequest>, JsonRejection>,
) -> Json<AliceResponse>
where
  S: RecordStore + IdentityLinker + Clone + Send + Sync + 'static,
  P: IdentityProvider + Clone + Send + Sync + 'static,
{
  let request = match payload {
    Ok(Json(request)) => request,
    Err(e) => {
      tracing::warn!(error = %e, "malformed webhook body");
      return Json(AliceResponse::say(FAILED, None));
    }
  };

  let version = request.version.clone();
  let text = match respond(&state, &request).await {
    Ok(text) => text,
    Err(e) => {
      tracing::error!(error = %e, "voice command failed");
      FAILED
    }
  };
  Json(AliceResponse::say(text, version))
}

async fn respond<S, P>(
  state: &AppState<S, P>,
  request: &AliceRequest,
) -> Result<&'static str, Error>
where
  S: RecordStore + IdentityLinker + Clone + Send + Sync + 'static,
  P: IdentityProvider + Clone + Send + Sync + 'static,
{
  let user_id = resolve_user_id(
    state.store.as_ref(),
    request.user_id(),
    request.application_id(),
  )
  .await
  .map_err(Error::store)?;

  let Some(user_id) = user_id else {
    tracing::warn!("voice command without user or application id");
    return Ok(UNKNOWN_USER);
  };

  let utterance = request.utterance();
  let intents = state.interpreter.interpret(utterance);

  if intents.is_empty() {
    tracing::debug!(
      %user_id,
      %utterance,
      "no trigger phrase matched"
    );
  } else {
    persist_in_background(state.store.clone(), user_id, intents);
  }

  Ok(ACKNOWLEDGED)
}

/// Write an utterance's records in order on a detached task.
///
/// Errors are logged and dropped; the caller has already answered.
fn persist_in_background<S>(store: Arc<S>, user_id: String, intents: Vec<Intent>)
where
  S: RecordStore + 'static,
{
  tokio::spawn(async move {
    for intent in intents {
      let kind = intent.kind;
      match store.add_record(intent.into_record(user_id.clone())).await {
        Ok(record) => {
          tracing::info!(id = record.id, %user_id, %kind, "voice record stored");
        }
        Err(e) => {
          tracing::error!(error = %e, %user_id, %kind, "failed to store voice record");
        }
      }
    }
  });
}
