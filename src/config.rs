use url::Url;

/// Engine configuration, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the NeuroCrypt backend hosting `/auth/simulator-state`.
    pub backend_url: Url,
    /// Bearer token for the authenticated user. Issued by the external auth
    /// backend; this engine only carries it.
    pub auth_token: String,
    /// Which market-data provider to use: binance, finnhub, offline or multi.
    pub market_provider: String,
    pub finnhub_api_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let backend_url = std::env::var("NEUROCRYPT_BACKEND_URL")
            .unwrap_or_else(|_| "http://localhost:5000".to_string());
        let backend_url = Url::parse(&backend_url)
            .map_err(|e| format!("invalid NEUROCRYPT_BACKEND_URL: {e}"))?;

        let auth_token = std::env::var("NEUROCRYPT_AUTH_TOKEN")
            .map_err(|_| "NEUROCRYPT_AUTH_TOKEN not set".to_string())?;

        Ok(Self {
            backend_url,
            auth_token,
            market_provider: std::env::var("MARKET_PROVIDER")
                .unwrap_or_else(|_| "multi".to_string()),
            finnhub_api_key: std::env::var("FINNHUB_API_KEY").ok(),
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.auth_token.trim().is_empty() {
            return Err("NEUROCRYPT_AUTH_TOKEN is empty".to_string());
        }
        if self.market_provider.eq_ignore_ascii_case("finnhub") && self.finnhub_api_key.is_none() {
            return Err(
                "MARKET_PROVIDER is finnhub but FINNHUB_API_KEY is not set".to_string(),
            );
        }
        Ok(())
    }
}
