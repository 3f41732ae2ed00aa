//! Identity linking between the voice assistant and the identity provider.
//!
//! The assistant issues an `application_id` per device before any login has
//! happened. After a login, the identity provider's durable user token is
//! linked to that application id. Until then the application id itself is
//! used as the user id, so one child's history may be split across an
//! unlinked application id and a later-linked token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::IdentityLinker;

/// A persisted `application_id -> user_token` link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMapping {
  pub application_id: String,
  pub user_token:     String,
  pub created_at:     DateTime<Utc>,
}

/// Work out whose records an inbound voice command belongs to.
///
/// A user id supplied directly by the session wins. Otherwise the session's
/// application id is resolved through `linker`. Returns `None` when the
/// session carries neither; empty strings count as absent.
pub async fn resolve_user_id<L>(
  linker: &L,
  session_user_id: Option<&str>,
  application_id: Option<&str>,
) -> Result<Option<String>, L::Error>
where
  L: IdentityLinker,
{
  if let Some(user_id) = session_user_id.filter(|s| !s.is_empty()) {
    return Ok(Some(user_id.to_owned()));
  }
  match application_id.filter(|s| !s.is_empty()) {
    Some(app_id) => linker.resolve(app_id).await.map(Some),
    None => Ok(None),
  }
}
