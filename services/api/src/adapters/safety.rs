//! services/api/src/adapters/safety.rs
//!
//! This module contains the adapter for the URL reputation checker used by
//! scam-check mode. It implements the `LinkSafetyService` port from the
//! `core` crate against an IPQualityScore-style JSON API.

use async_trait::async_trait;
use sabi_assistant_core::ports::{GatewayError, LinkSafetyService, SafetyVerdict};
use serde::Deserialize;
use std::time::Duration;

// Scores at or above this are treated as unsafe even without a named flag.
const RISK_THRESHOLD: u8 = 75;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `LinkSafetyService` against a hosted
/// URL-reputation API.
#[derive(Clone)]
pub struct IpqsSafetyAdapter {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl IpqsSafetyAdapter {
    /// Creates a new `IpqsSafetyAdapter`.
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }
}

//=========================================================================================
// Wire Format
//=========================================================================================

#[derive(Debug, Deserialize)]
struct IpqsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "unsafe", default)]
    is_unsafe: bool,
    #[serde(default)]
    risk_score: u8,
    #[serde(default)]
    phishing: bool,
    #[serde(default)]
    malware: bool,
    #[serde(default)]
    suspicious: bool,
}

fn verdict_from(response: IpqsResponse) -> SafetyVerdict {
    let reason = if response.phishing {
        Some("flagged as phishing".to_string())
    } else if response.malware {
        Some("flagged as malware".to_string())
    } else if response.suspicious {
        Some("flagged as suspicious".to_string())
    } else if response.is_unsafe || response.risk_score >= RISK_THRESHOLD {
        Some(format!("risk score {}", response.risk_score))
    } else {
        None
    };

    SafetyVerdict {
        is_unsafe: reason.is_some(),
        reason,
    }
}

//=========================================================================================
// `LinkSafetyService` Trait Implementation
//=========================================================================================

#[async_trait]
impl LinkSafetyService for IpqsSafetyAdapter {
    async fn check(&self, candidate: &str) -> Result<SafetyVerdict, GatewayError> {
        let endpoint = format!("{}/{}", self.api_url.trim_end_matches('/'), self.api_key);

        let response = self
            .http
            .get(&endpoint)
            .query(&[("url", candidate)])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| GatewayError::transient(e.to_string()))?;

        let response = response.error_for_status().map_err(|e| {
            if e.status().is_some_and(|s| s.is_server_error()) {
                GatewayError::transient(e.to_string())
            } else {
                GatewayError::permanent(e.to_string())
            }
        })?;

        let body: IpqsResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::permanent(e.to_string()))?;

        if !body.success {
            return Err(GatewayError::permanent(
                body.message
                    .unwrap_or_else(|| "reputation check was not successful".to_string()),
            ));
        }

        Ok(verdict_from(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> IpqsResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn phishing_flag_is_unsafe() {
        let verdict = verdict_from(parse(
            r#"{"success": true, "unsafe": false, "risk_score": 40, "phishing": true}"#,
        ));
        assert!(verdict.is_unsafe);
        assert_eq!(verdict.reason.as_deref(), Some("flagged as phishing"));
    }

    #[test]
    fn high_risk_score_is_unsafe_without_flags() {
        let verdict = verdict_from(parse(r#"{"success": true, "risk_score": 90}"#));
        assert!(verdict.is_unsafe);
        assert_eq!(verdict.reason.as_deref(), Some("risk score 90"));
    }

    #[test]
    fn clean_response_is_safe() {
        let verdict = verdict_from(parse(
            r#"{"success": true, "unsafe": false, "risk_score": 5}"#,
        ));
        assert!(!verdict.is_unsafe);
        assert!(verdict.reason.is_none());
    }

    #[test]
    fn missing_fields_default_to_safe() {
        let verdict = verdict_from(parse(r#"{"success": true}"#));
        assert!(!verdict.is_unsafe);
    }
}
