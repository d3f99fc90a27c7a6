/// Authenticated session for the current user.
///
/// Built once at startup from configuration and handed explicitly to
/// everything that talks to the profile store, instead of being looked up
/// from ambient state. A token change (login/logout) means building a new
/// `Session` and re-loading simulator state through it.
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn bearer_token(&self) -> &str {
        &self.token
    }
}
