//! The external identity provider used by the login flow.
//!
//! Only the authorisation-code grant is needed: build the authorize URL,
//! then trade the returned code for the user's profile.

use std::{future::Future, time::Duration};

use reqwest::{Client, Url, header};
use serde::{Deserialize, Serialize};

use crate::{ServerConfig, error::Error};

pub const YANDEX_AUTHORIZE_URL: &str = "https://oauth.yandex.ru/authorize";
pub const YANDEX_TOKEN_URL: &str = "https://oauth.yandex.ru/token";
pub const YANDEX_INFO_URL: &str = "https://login.yandex.ru/info?format=json";

/// The authenticated user as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  /// Durable user identifier; becomes the linked user token.
  pub id:    String,
  #[serde(default)]
  pub login: Option<String>,
}

pub trait IdentityProvider: Send + Sync {
  /// Where to send the browser to start a login. `state` is echoed back to
  /// the callback untouched.
  fn authorize_url(&self, state: Option<&str>) -> String;

  /// Exchange an authorisation code for the user's profile.
  fn exchange<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<Profile, Error>> + Send + 'a;
}

// ─── Yandex ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TokenResponse {
  access_token: String,
}

/// Yandex ID over OAuth 2.0.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct YandexProvider {
  client:        Client,
  client_id:     String,
  client_secret: String,
  callback_url:  String,
  authorize:     Url,
  token:         Url,
  info:          Url,
}

impl YandexProvider {
  pub fn new(config: &ServerConfig) -> Result<Self, Error> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    let parse = |s: &str| Url::parse(s).map_err(|e| Error::Config(format!("{s}: {e}")));

    Ok(Self {
      client,
      client_id: config.yandex_client_id.clone(),
      client_secret: config.yandex_client_secret.clone(),
      callback_url: config.callback_url.clone(),
      authorize: parse(YANDEX_AUTHORIZE_URL)?,
      token: parse(YANDEX_TOKEN_URL)?,
      info: parse(YANDEX_INFO_URL)?,
    })
  }
}

impl IdentityProvider for YandexProvider {
  fn authorize_url(&self, state: Option<&str>) -> String {
    let mut url = self.authorize.clone();
    {
      let mut query = url.query_pairs_mut();
      query
        .append_pair("response_type", "code")
        .append_pair("client_id", &self.client_id)
        .append_pair("redirect_uri", &self.callback_url);
      if let Some(state) = state {
        query.append_pair("state", state);
      }
    }
    url.into()
  }

  async fn exchange(&self, code: &str) -> Result<Profile, Error> {
    let token: TokenResponse = self
      .client
      .post(self.token.clone())
      .form(&[
        ("grant_type", "authorization_code"),
        ("code", code),
        ("client_id", self.client_id.as_str()),
        ("client_secret", self.client_secret.as_str()),
      ])
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;

    let profile: Profile = self
      .client
      .get(self.info.clone())
      .header(header::AUTHORIZATION, format!("OAuth {}", token.access_token))
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;

    if profile.id.is_empty() {
      return Err(Error::Provider("profile has no id".into()));
    }
    Ok(profile)
  }
}
