use log::*;

use crate::{
    db_types::User,
    traits::{AuthApiError, UserStore},
};

/// Thin wrapper over the credential verifier.
pub struct AuthApi<B> {
    db: B,
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AuthApi<B>
where B: UserStore
{
    /// Resolve a login credential to a user, or fail with `InvalidCredential`.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthApiError> {
        let user = self.db.verify_credential(token).await?.ok_or(AuthApiError::InvalidCredential)?;
        debug!("🔑️ Credential verified for user {} ({:?})", user.id, user.role);
        Ok(user)
    }

    pub async fn user_by_id(&self, user_id: i64) -> Result<User, AuthApiError> {
        self.db.fetch_user(user_id).await?.ok_or(AuthApiError::UserNotFound(user_id))
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
