use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::models::Account;
use crate::session::Session;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unauthorized")]
    Unauthorized,
}

/// Remote persistence for simulator state, keyed by the authenticated user.
///
/// The backend keeps no version counter, so concurrent sessions race with
/// last-write-wins semantics. That gap is inherited from the stored contract
/// and deliberately left open (see DESIGN.md).
#[async_trait]
pub trait StateStore: Send + Sync {
    /// `Ok(None)` means no state has ever been saved for this user.
    /// `Err(StoreError::Parse)` means state exists but is unreadable.
    async fn fetch(&self, session: &Session) -> Result<Option<Account>, StoreError>;

    async fn save(&self, session: &Session, account: &Account) -> Result<(), StoreError>;

    async fn delete(&self, session: &Session) -> Result<(), StoreError>;
}

pub struct ProfileStoreClient {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct FetchStateResponse {
    state: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SaveStateResponse {
    #[serde(default)]
    success: bool,
}

impl ProfileStoreClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/auth/simulator-state", base_url.trim_end_matches('/')),
        }
    }

    fn check_status(resp: &reqwest::Response) -> Result<(), StoreError> {
        match resp.status() {
            reqwest::StatusCode::UNAUTHORIZED => Err(StoreError::Unauthorized),
            status if !status.is_success() => {
                Err(StoreError::BadResponse(format!("HTTP {status}")))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl StateStore for ProfileStoreClient {
    async fn fetch(&self, session: &Session) -> Result<Option<Account>, StoreError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .bearer_auth(session.bearer_token())
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Self::check_status(&resp)?;

        let body: FetchStateResponse = resp
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        match body.state {
            None => Ok(None),
            // An unreadable stored payload is distinct from "nothing saved";
            // the caller warns differently for the two cases.
            Some(state) => serde_json::from_value(state)
                .map(Some)
                .map_err(|e| StoreError::Parse(e.to_string())),
        }
    }

    async fn save(&self, session: &Session, account: &Account) -> Result<(), StoreError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(session.bearer_token())
            .json(&json!({ "state": account }))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Self::check_status(&resp)?;

        let body: SaveStateResponse = resp
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        if !body.success {
            return Err(StoreError::BadResponse("save was rejected".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, session: &Session) -> Result<(), StoreError> {
        let resp = self
            .client
            .delete(&self.endpoint)
            .bearer_auth(session.bearer_token())
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Self::check_status(&resp)
    }
}
