use std::sync::Arc;

use tracing::{info, warn};

use shutter_db::Database;
use shutter_types::api::Claims;

use crate::error::ApiError;
use crate::identity::IdentityProvider;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub identity: Arc<dyn IdentityProvider>,
    pub session_secret: String,
}

/// The user a request acts for must be the session's subject.
pub fn authorize(claims: &Claims, user_id: &str) -> Result<(), ApiError> {
    if claims.sub != user_id {
        return Err(ApiError::Forbidden(format!(
            "session does not belong to {}",
            user_id
        )));
    }
    Ok(())
}

/// Make sure a users row exists, creating it from the identity provider profile if not.
/// Returns true iff this call created the row.
pub async fn provision_user(state: &AppStateInner, user_id: &str) -> Result<bool, ApiError> {
    if state.db.user_exists(user_id)? {
        return Ok(false);
    }

    let profile = state.identity.fetch_profile(user_id).await?;

    // A concurrent first interaction may have won the race; the insert is a no-op then.
    let created = state
        .db
        .insert_user_if_absent(user_id, &profile.full_name(), &profile.image_url)?;

    if created {
        info!(user_id, "Provisioned user from identity provider");
    }
    Ok(created)
}

/// Provisioning on behalf of a like, comment or follow. A failed identity lookup is
/// logged and the write goes ahead; the author then reads back as unknown.
pub async fn provision_user_or_warn(state: &AppStateInner, user_id: &str) {
    if let Err(e) = provision_user(state, user_id).await {
        warn!(user_id, error = %e, "Could not provision user, continuing without profile");
    }
}
