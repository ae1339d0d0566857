// Token refresh call

use reqwest::Client;

use super::types::{RefreshRequest, RefreshResponse};
use crate::error::ApiError;
use crate::store::TokenPair;

/// Exchange the refresh credential for a new token pair
///
/// Every failure here counts as an authentication failure: the caller
/// clears stored credentials and falls back to the login flow.
pub async fn refresh_access_token(
    client: &Client,
    origin: &str,
    path: &str,
    refresh_token: &str,
) -> Result<TokenPair, ApiError> {
    let url = format!("{}{}", origin.trim_end_matches('/'), path);
    tracing::debug!(url = %url, "Refreshing access token");

    let request = RefreshRequest {
        refresh_token: refresh_token.to_string(),
    };

    let response = client
        .post(&url)
        .json(&request)
        .send()
        .await
        .map_err(|e| ApiError::Auth(format!("refresh request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, "Token refresh rejected");
        return Err(ApiError::Auth(format!(
            "refresh rejected with status {status}: {body}"
        )));
    }

    let data: RefreshResponse = response
        .json()
        .await
        .map_err(|e| ApiError::Auth(format!("failed to parse refresh response: {e}")))?;

    if data.access_token.is_empty() || data.refresh_token.is_empty() {
        return Err(ApiError::Auth(
            "refresh response missing tokens".to_string(),
        ));
    }

    tracing::info!("Access token refreshed");

    Ok(TokenPair {
        access_token: data.access_token,
        refresh_token: data.refresh_token,
    })
}
