use crate::{db_types::User, traits::AuthApiError};

/// Credential verification is a black box from the engine's point of view: a token either
/// resolves to a user (with a role) or it does not.
#[allow(async_fn_in_trait)]
pub trait UserStore {
    async fn verify_credential(&self, token: &str) -> Result<Option<User>, AuthApiError>;

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AuthApiError>;
}
