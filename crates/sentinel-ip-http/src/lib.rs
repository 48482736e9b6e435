// # HTTP IP Resolver
//
// This crate provides the HTTP provider-chain implementation of
// `IpResolver` for the IP Sentinel system.
//
// ## Architecture
//
// A fixed, ordered list of public IP services acts as a priority chain:
// each provider is a (URL, response format) pair. A resolution attempt
// walks the chain, treats any non-2xx response, network error, timeout,
// or parse failure as that provider's failure, and returns the first
// successfully parsed address. Only when every provider fails does the
// attempt surface an error.
//
// There is deliberately no retry or backoff inside a single attempt;
// the scheduler retries on its next tick.

use sentinel_core::traits::IpResolver;
use sentinel_core::{Error, Result};

use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

/// Per-provider request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// How a provider encodes the address in its response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Body is the bare address, possibly with surrounding whitespace
    PlainText,

    /// Body is a JSON object; the address sits under the named field
    JsonField(String),
}

/// One external IP service in the priority chain
#[derive(Debug, Clone)]
pub struct Provider {
    /// Request URL
    pub url: String,

    /// Response body format
    pub format: ResponseFormat,
}

impl Provider {
    /// Provider returning the bare address as text
    pub fn plain_text(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: ResponseFormat::PlainText,
        }
    }

    /// Provider returning JSON with the address under `field`
    pub fn json_field(url: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: ResponseFormat::JsonField(field.into()),
        }
    }
}

/// Default provider chain, in priority order
pub fn default_providers() -> Vec<Provider> {
    vec![
        Provider::json_field("https://api.ipify.org?format=json", "ip"),
        Provider::plain_text("https://ifconfig.me/ip"),
        Provider::json_field("https://api.ipapi.com/api/check?access_key=free", "ip"),
    ]
}

/// HTTP-based public IP resolver
pub struct HttpResolver {
    providers: Vec<Provider>,
    client: reqwest::Client,
}

impl HttpResolver {
    /// Create a resolver over the default provider chain
    pub fn new() -> Self {
        Self::with_providers(default_providers())
    }

    /// Create a resolver over a custom provider chain
    ///
    /// Order is significant: earlier providers are tried first.
    pub fn with_providers(providers: Vec<Provider>) -> Self {
        Self {
            providers,
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Query one provider
    async fn fetch(&self, provider: &Provider) -> Result<IpAddr> {
        let response = self
            .client
            .get(&provider.url)
            .send()
            .await
            .map_err(|e| Error::resolution(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::resolution(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::resolution(format!("Failed to read response: {}", e)))?;

        extract_ip(&body, &provider.format)
    }
}

impl Default for HttpResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IpResolver for HttpResolver {
    async fn resolve(&self) -> Result<IpAddr> {
        for provider in &self.providers {
            match self.fetch(provider).await {
                Ok(ip) => {
                    debug!("Resolved public IP {} via {}", ip, provider.url);
                    return Ok(ip);
                }
                Err(e) => {
                    debug!("Provider {} failed: {}", provider.url, e);
                }
            }
        }

        Err(Error::resolution("All IP providers failed"))
    }
}

/// Parse an address out of a provider response body
fn extract_ip(body: &str, format: &ResponseFormat) -> Result<IpAddr> {
    let text = match format {
        ResponseFormat::PlainText => body.trim().to_string(),
        ResponseFormat::JsonField(field) => {
            let value: serde_json::Value = serde_json::from_str(body)
                .map_err(|e| Error::resolution(format!("Invalid JSON response: {}", e)))?;

            value
                .get(field)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::resolution(format!("Response JSON has no string field '{}'", field))
                })?
        }
    };

    text.parse()
        .map_err(|_| Error::resolution(format!("Invalid IP address: {}", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain_text() {
        let ip = extract_ip("  203.0.113.7\n", &ResponseFormat::PlainText).unwrap();
        assert_eq!(ip, "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_extract_json_field() {
        let format = ResponseFormat::JsonField("ip".to_string());
        let ip = extract_ip(r#"{"ip": "203.0.113.7"}"#, &format).unwrap();
        assert_eq!(ip, "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_extract_rejects_garbage() {
        assert!(extract_ip("not an ip", &ResponseFormat::PlainText).is_err());

        let format = ResponseFormat::JsonField("ip".to_string());
        assert!(extract_ip("not json", &format).is_err());
        assert!(extract_ip(r#"{"address": "203.0.113.7"}"#, &format).is_err());
        assert!(extract_ip(r#"{"ip": 42}"#, &format).is_err());
    }

    #[test]
    fn test_default_chain_order() {
        let providers = default_providers();
        assert_eq!(providers.len(), 3);
        assert!(providers[0].url.contains("ipify"));
        assert!(providers[1].url.contains("ifconfig"));
    }

    #[tokio::test]
    async fn test_empty_chain_fails_without_network() {
        let resolver = HttpResolver::with_providers(Vec::new());
        let result = resolver.resolve().await;
        assert!(matches!(result, Err(Error::Resolution(_))));
    }
}
