use crate::config::Config;
use crate::dto::{Envelope, ProfileDto, TransactionDto, TransactionsRequest};
use crate::errors::{ApiError, ClientError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

pub const PROFILE_PATH: &str = "profile/get";
pub const TRANSACTIONS_PATH: &str = "transactions/mine";

/// Client for the rider REST backend.
///
/// Every call is a single POST; there is no retry. Timeouts are whatever the
/// underlying `reqwest` client enforces.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Creates a client from loaded configuration.
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        Self::with_base_url(&config.api_base_url, config.api_token.clone(), config.timeout())
    }

    /// Creates a client for `base_url`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Root of the API; endpoint paths are joined onto it.
    /// * `token` - Optional bearer token sent on every request.
    /// * `timeout` - Per-request timeout.
    pub fn with_base_url(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        // Url::join drops the last segment unless the base ends with '/'
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches the signed-in customer's profile.
    pub async fn fetch_profile(&self) -> Result<Envelope<ProfileDto>, ApiError> {
        self.post(PROFILE_PATH, &json!({})).await
    }

    /// Fetches the customer's bookings filtered by `booking_status`.
    pub async fn fetch_transactions(
        &self,
        booking_status: &str,
    ) -> Result<Envelope<Vec<TransactionDto>>, ApiError> {
        let body = TransactionsRequest {
            booking_status: booking_status.to_string(),
        };
        self.post(TRANSACTIONS_PATH, &body).await
    }

    /// Issues one POST and decodes the response envelope.
    ///
    /// Non-2xx responses are classified into an [`ApiError`]; a request that
    /// never got a response is an unknown-kind error.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<Envelope<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.base_url.join(path).map_err(|e| {
            tracing::error!("Failed to build URL for {}: {}", path, e);
            ApiError::transport()
        })?;
        let request_id = Uuid::new_v4();
        tracing::info!(%request_id, "POST {}", url);

        let mut request = self
            .client
            .post(url.clone())
            .header("X-Request-Id", request_id.to_string())
            .json(body);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%request_id, "Request to {} failed: {}", url, e);
            ApiError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let err = ApiError::from_response(status.as_u16(), &error_text);
            tracing::warn!(
                %request_id,
                "{} returned {} ({} error): {}",
                url,
                status,
                err.kind(),
                err.message()
            );
            return Err(err);
        }

        let envelope = response.json::<Envelope<T>>().await.map_err(|e| {
            tracing::error!(%request_id, "Failed to parse response from {}: {}", url, e);
            ApiError::invalid_payload()
        })?;

        tracing::debug!(%request_id, "{} responded with status marker {:?}", url, envelope.status);
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = ApiClient::with_base_url("https://example.com", None, Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let client =
            ApiClient::with_base_url("https://example.com/api/v1", None, Duration::from_secs(5))
                .unwrap();
        let url = client.base_url().join(PROFILE_PATH).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/v1/profile/get");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = ApiClient::with_base_url("not a url", None, Duration::from_secs(5));
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }
}
