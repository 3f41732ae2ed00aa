//! Signed OAuth `state` values carrying the assistant's application id.
//!
//! Format: `<base64url(application_id)>.<hex(hmac-sha256(secret, payload))>`.
//! The signature stops a caller from linking their token to someone else's
//! application id by forging the state.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::Error;

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &str, payload: &str) -> Result<HmacSha256, Error> {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .map_err(|e| Error::Config(format!("session secret: {e}")))?;
  mac.update(payload.as_bytes());
  Ok(mac)
}

/// Produce a state value for `application_id`.
pub fn sign(secret: &str, application_id: &str) -> Result<String, Error> {
  let payload = B64.encode(application_id);
  let tag = hex::encode(mac(secret, &payload)?.finalize().into_bytes());
  Ok(format!("{payload}.{tag}"))
}

/// Check a state value and return the application id it carries.
pub fn verify(secret: &str, state: &str) -> Result<String, Error> {
  let (payload, tag) = state.split_once('.').ok_or(Error::BadState)?;
  let tag = hex::decode(tag).map_err(|_| Error::BadState)?;

  mac(secret, payload)?
    .verify_slice(&tag)
    .map_err(|_| Error::BadState)?;

  let bytes = B64.decode(payload).map_err(|_| Error::BadState)?;
  String::from_utf8(bytes).map_err(|_| Error::BadState)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn signed_state_verifies() {
    let state = sign("secret", "app/42 ü").unwrap();
    assert_eq!(verify("secret", &state).unwrap(), "app/42 ü");
  }

  #[test]
  fn wrong_secret_is_rejected() {
    let state = sign("secret", "app-1").unwrap();
    assert!(matches!(verify("other", &state), Err(Error::BadState)));
  }

  #[test]
  fn swapped_payload_is_rejected() {
    let state = sign("secret", "app-1").unwrap();
    let (_, tag) = state.split_once('.').unwrap();
    let forged = format!("{}.{tag}", B64.encode("app-2"));
    assert!(matches!(verify("secret", &forged), Err(Error::BadState)));
  }

  #[test]
  fn malformed_state_is_rejected() {
    for state in ["", "no-dot", "abc.not-hex", "."] {
      assert!(
        matches!(verify("secret", state), Err(Error::BadState)),
        "{state:?}"
      );
    }
  }
}
