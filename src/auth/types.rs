// Refresh endpoint wire types

use serde::{Deserialize, Serialize};

/// Body of `POST {origin}/auth/refresh`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful refresh payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_camel_case_on_the_wire() {
        let request = RefreshRequest {
            refresh_token: "rtk1".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"refreshToken": "rtk1"}));
    }

    #[test]
    fn test_response_parses_camel_case() {
        let response: RefreshResponse =
            serde_json::from_str(r#"{"accessToken":"atk2","refreshToken":"rtk2"}"#).unwrap();
        assert_eq!(response.access_token, "atk2");
        assert_eq!(response.refresh_token, "rtk2");
    }
}
