//! Numbeo pricing source (via RapidAPI).
//!
//! `GET {base_url}/city_cost?city=<city>` with the RapidAPI key and host
//! headers. Every attempt is bounded by the configured timeout; transport
//! errors and 5xx responses are retried up to `max_retries` times.

use std::time::Duration;

use async_trait::async_trait;
use costwise_core::{CityKey, CostIndices, CostwiseResult, UpstreamError};
use costwise_storage::{PricingQuote, PricingSource};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::PricingConfig;
use crate::error::{ApiError, ApiResult};
use crate::telemetry::metrics;

const INITIAL_RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// Body returned by `/city_cost`. Unknown cities come back with `error` set.
#[derive(Debug, Deserialize)]
struct CityCostPayload {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    cost_of_living_index: Option<f64>,
    #[serde(default)]
    rent_index: Option<f64>,
    #[serde(default)]
    groceries_index: Option<f64>,
    #[serde(default)]
    restaurant_price_index: Option<f64>,
}

impl CityCostPayload {
    fn into_quote(self, city: &CityKey) -> CostwiseResult<PricingQuote> {
        if let Some(error) = self.error {
            tracing::debug!(city = %city, error = %error, "Pricing source has no such city");
            return Err(UpstreamError::CityNotFound {
                city: city.to_string(),
            }
            .into());
        }

        fn required(value: Option<f64>, field: &str) -> Result<f64, UpstreamError> {
            value.ok_or_else(|| UpstreamError::InvalidResponse {
                reason: format!("missing field '{}'", field),
            })
        }

        let country = self.country.ok_or_else(|| UpstreamError::InvalidResponse {
            reason: "missing field 'country'".to_string(),
        })?;

        Ok(PricingQuote {
            country,
            indices: CostIndices {
                cost_of_living_index: required(self.cost_of_living_index, "cost_of_living_index")?,
                rent_index: required(self.rent_index, "rent_index")?,
                groceries_index: required(self.groceries_index, "groceries_index")?,
                restaurant_index: required(self.restaurant_price_index, "restaurant_price_index")?,
            },
        })
    }
}

/// One attempt's failure, tagged with whether it is worth retrying.
struct AttemptError {
    error: UpstreamError,
    retryable: bool,
}

/// Pricing source backed by the Numbeo RapidAPI endpoint.
#[derive(Debug, Clone)]
pub struct NumbeoClient {
    http: reqwest::Client,
    config: PricingConfig,
}

impl NumbeoClient {
    pub fn new(config: PricingConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("costwise/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::internal_error(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/city_cost", self.config.base_url.trim_end_matches('/'))
    }

    async fn attempt(&self, city: &CityKey) -> Result<PricingQuote, AttemptError> {
        let response = self
            .http
            .get(self.endpoint())
            .query(&[("city", city.as_str())])
            .header("X-RapidAPI-Key", &self.config.api_key)
            .header("X-RapidAPI-Host", &self.config.api_host)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AttemptError {
                error: UpstreamError::CityNotFound {
                    city: city.to_string(),
                },
                retryable: false,
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AttemptError {
                error: UpstreamError::Status {
                    status: status.as_u16(),
                    message: truncate(&message, 200),
                },
                retryable: status.is_server_error(),
            });
        }

        let payload: CityCostPayload = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                AttemptError {
                    error: UpstreamError::InvalidResponse {
                        reason: e.to_string(),
                    },
                    retryable: false,
                }
            }
        })?;

        payload.into_quote(city).map_err(|e| AttemptError {
            error: match e {
                costwise_core::CostwiseError::Upstream(upstream) => upstream,
                other => UpstreamError::InvalidResponse {
                    reason: other.to_string(),
                },
            },
            retryable: false,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> AttemptError {
        let error = if err.is_timeout() {
            UpstreamError::Timeout {
                timeout_ms: self.config.timeout.as_millis() as u64,
            }
        } else {
            UpstreamError::Unreachable {
                reason: err.to_string(),
            }
        };
        AttemptError {
            error,
            retryable: true,
        }
    }
}

#[async_trait]
impl PricingSource for NumbeoClient {
    async fn fetch(&self, city: &CityKey) -> CostwiseResult<PricingQuote> {
        let mut backoff = INITIAL_RETRY_BACKOFF;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.attempt(city).await {
                Ok(quote) => {
                    metrics::record_upstream_fetch(self.name(), "success");
                    return Ok(quote);
                }
                Err(AttemptError { error, retryable }) => {
                    if retryable && attempt <= self.config.max_retries {
                        tracing::warn!(
                            city = %city,
                            attempt = attempt,
                            error = %error,
                            "Pricing source request failed, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                        continue;
                    }
                    let outcome = match &error {
                        UpstreamError::CityNotFound { .. } => "not_found",
                        UpstreamError::Timeout { .. } => "timeout",
                        _ => "error",
                    };
                    metrics::record_upstream_fetch(self.name(), outcome);
                    return Err(error.into());
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "numbeo"
    }
}

fn truncate(message: &str, max_chars: usize) -> String {
    message.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(name: &str) -> CityKey {
        CityKey::parse(name).expect("valid city")
    }

    #[test]
    fn test_payload_maps_to_quote() -> CostwiseResult<()> {
        let payload: CityCostPayload = serde_json::from_value(serde_json::json!({
            "name": "Toronto",
            "country": "Canada",
            "cost_of_living_index": 70.5,
            "rent_index": 45.2,
            "groceries_index": 68.0,
            "restaurant_price_index": 66.1
        }))
        .map_err(|e| UpstreamError::InvalidResponse { reason: e.to_string() })?;

        let quote = payload.into_quote(&city("Toronto"))?;
        assert_eq!(quote.country, "Canada");
        assert_eq!(quote.indices.rent_index, 45.2);
        assert_eq!(quote.indices.restaurant_index, 66.1);
        Ok(())
    }

    #[test]
    fn test_error_field_means_city_not_found() {
        let payload = CityCostPayload {
            error: Some("City not found".to_string()),
            country: None,
            cost_of_living_index: None,
            rent_index: None,
            groceries_index: None,
            restaurant_price_index: None,
        };
        let err = payload.into_quote(&city("Atlantis")).unwrap_err();
        assert_eq!(err.kind(), costwise_core::ErrorKind::NotFound);
    }

    #[test]
    fn test_missing_index_is_invalid_response() {
        let payload = CityCostPayload {
            error: None,
            country: Some("Canada".to_string()),
            cost_of_living_index: Some(70.0),
            rent_index: None,
            groceries_index: Some(60.0),
            restaurant_price_index: Some(50.0),
        };
        let err = payload.into_quote(&city("Toronto")).unwrap_err();
        assert_eq!(err.kind(), costwise_core::ErrorKind::UpstreamUnavailable);
        assert!(err.to_string().contains("rent_index"));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() -> ApiResult<()> {
        let client = NumbeoClient::new(PricingConfig {
            base_url: "http://127.0.0.1:9/".to_string(),
            ..Default::default()
        })?;
        assert_eq!(client.endpoint(), "http://127.0.0.1:9/city_cost");
        Ok(())
    }
}
