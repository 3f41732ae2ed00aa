//! Login through the identity provider.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/auth/yandex` | Optional `?application_id`; redirects to the provider |
//! | `GET`  | `/auth/yandex/callback` | Links the application id, redirects to the app |
//!
//! The application id travels through the provider inside the signed OAuth
//! `state`, so no server-side session is needed between the two requests.

use axum::{
  extract::{Query, State},
  response::Redirect,
};
use babylog_core::store::{IdentityLinker, RecordStore};
use reqwest::Url;
use serde::Deserialize;

use crate::{AppState, error::Error, login_state, provider::IdentityProvider};

fn non_empty(s: Option<String>) -> Option<String> {
  s.filter(|v| !v.is_empty())
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct LoginParams {
  pub application_id: Option<String>,
}

/// `GET /auth/yandex[?application_id=...]`
pub async fn login<S, P>(
  State(state): State<AppState<S, P>>,
  Query(params): Query<LoginParams>,
) -> Result<Redirect, Error>
where
  S: RecordStore + IdentityLinker + Clone + Send + Sync + 'static,
  P: IdentityProvider + Clone + Send + Sync + 'static,
{
  let signed = non_empty(params.application_id)
    .map(|id| login_state::sign(&state.config.session_secret, &id))
    .transpose()?;

  Ok(Redirect::to(&state.provider.authorize_url(signed.as_deref())))
}

// ─── Callback ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
  pub code:              Option<String>,
  pub state:             Option<String>,
  pub error:             Option<String>,
  pub error_description: Option<String>,
}

/// `GET /auth/yandex/callback?code=...[&state=...]`
pub async fn callback<S, P>(
  State(state): State<AppState<S, P>>,
  Query(params): Query<CallbackParams>,
) -> Result<Redirect, Error>
where
  S: RecordStore + IdentityLinker + Clone + Send + Sync + 'static,
  P: IdentityProvider + Clone + Send + Sync + 'static,
{
  if let Some(error) = params.error {
    let detail = params.error_description.unwrap_or(error);
    return Err(Error::BadRequest(format!("login failed: {detail}")));
  }

  let code = non_empty(params.code)
    .ok_or_else(|| Error::BadRequest("missing authorization code".into()))?;

  // Checked before the exchange so a forged state never reaches the provider.
  let application_id = non_empty(params.state)
    .map(|s| login_state::verify(&state.config.session_secret, &s))
    .transpose()?
    .filter(|id| !id.is_empty());

  let profile = state.provider.exchange(&code).await?;

  if let Some(application_id) = application_id {
    state
      .store
      .link(&application_id, &profile.id)
      .await
      .map_err(Error::store)?;
    tracing::info!(%application_id, login = ?profile.login, "application linked");
  }

  let target = deep_link(&state.config.deep_link, &profile.id)?;
  Ok(Redirect::to(&target))
}

/// The app URL the browser lands on after login, carrying the user token.
fn deep_link(base: &str, user_token: &str) -> Result<String, Error> {
  let mut url =
    Url::parse(base).map_err(|e| Error::Config(format!("deep_link {base:?}: {e}")))?;
  url.query_pairs_mut().append_pair("user_token", user_token);
  Ok(url.into())
}
