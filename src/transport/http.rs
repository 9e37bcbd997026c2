//! reqwest-backed transport for a single `api.php` endpoint.
//!
//! Owns the session state a wiki conversation needs: the endpoint URL, the
//! user agent, cookie-based login, and the default parameters every request
//! gets unless the caller already set them. Maxlag backoff lives here too;
//! the builder layer never retries anything.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{RETRY_AFTER, USER_AGENT};
use serde_json::Value;
use tracing::{event, instrument, Level};
use url::Url;

use crate::action::Verb;
use crate::builder::RequestBuilder;
use crate::error::Error;
use crate::response::ResponseEnvelope;
use crate::transport::{Transport, TransportError};
use crate::types::{AssertType, LoginCredential, SiteProfile};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAXLAG_WAIT_SECS: u64 = 5;

pub struct HttpTransport {
    endpoint: Url,
    client: reqwest::Client,
    user_agent: String,
    assert: Option<AssertType>,
    maxlag: Option<u64>,
    max_retry_attempts: u64,
}

impl HttpTransport {
    /// Creates a transport for the given `api.php` endpoint.
    pub fn new(endpoint: &str) -> Result<Self, TransportError> {
        let endpoint = Url::parse(endpoint)?;
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(HttpTransport {
            endpoint,
            client,
            user_agent: format!("mwaction/{}", env!("CARGO_PKG_VERSION")),
            assert: None,
            maxlag: Some(5),
            max_retry_attempts: 3,
        })
    }

    /// Creates a transport configured from a site profile.
    pub fn from_profile(profile: &SiteProfile) -> Result<Self, TransportError> {
        let mut transport = Self::new(&profile.api)?;
        transport.assert = profile.assert;
        if profile.maxlag.is_some() {
            transport.maxlag = profile.maxlag;
        }
        if let Some(user_agent) = &profile.user_agent {
            transport.user_agent = user_agent.clone();
        }
        Ok(transport)
    }

    pub fn set_user_agent(&mut self, user_agent: String) {
        self.user_agent = user_agent;
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn set_maxlag(&mut self, maxlag: Option<u64>) {
        self.maxlag = maxlag;
    }

    pub fn set_assert(&mut self, assert: Option<AssertType>) {
        self.assert = assert;
    }

    pub fn set_max_retry_attempts(&mut self, attempts: u64) {
        self.max_retry_attempts = attempts;
    }

    /// Fills in the default parameters, leaving anything the caller set.
    fn decorate(&self, params: &mut HashMap<String, String>) {
        if !params.contains_key("format") {
            params.insert("format".to_string(), "json".to_string());
        }
        if !params.contains_key("formatversion") {
            params.insert("formatversion".to_string(), "2".to_string());
        }
        if !params.contains_key("utf8") {
            params.insert("utf8".to_string(), "1".to_string());
        }
        if let Some(maxlag) = self.maxlag {
            if !params.contains_key("maxlag") {
                params.insert("maxlag".to_string(), maxlag.to_string());
            }
        }
        if let Some(assert) = self.assert {
            if !params.contains_key("assert") {
                params.insert("assert".to_string(), assert.to_string());
            }
        }
    }

    #[instrument(target = "transport", level = "debug", skip(self, params))]
    async fn request(
        &self,
        verb: Verb,
        params: &HashMap<String, String>,
    ) -> Result<String, TransportError> {
        let mut params = params.clone();
        self.decorate(&mut params);
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            let request = match verb {
                Verb::Get => self.client.get(self.endpoint.clone()).query(&params),
                Verb::Post => self.client.post(self.endpoint.clone()).form(&params),
            };
            let response = request.header(USER_AGENT, self.user_agent.as_str()).send().await?;
            let status = response.status();
            if !status.is_success() {
                event!(Level::WARN, status = status.as_u16(), "request rejected");
                return Err(TransportError::Status(status.as_u16()));
            }
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let text = response.text().await?;
            if self.is_lagged(&text) && attempt <= self.max_retry_attempts {
                let wait = retry_after.unwrap_or(DEFAULT_MAXLAG_WAIT_SECS);
                event!(Level::INFO, attempt, wait, "server lagged, backing off");
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }
            return Ok(text);
        }
    }

    /// Maxlag rejections come back as a normal 200 with an error payload.
    fn is_lagged(&self, body: &str) -> bool {
        if self.maxlag.is_none() {
            return false;
        }
        match serde_json::from_str::<Value>(body) {
            Ok(parsed) => parsed
                .get("error")
                .and_then(|e| e.get("code"))
                .and_then(Value::as_str)
                == Some("maxlag"),
            Err(_) => false,
        }
    }

    /// Logs in with the legacy bot-password flow: fetch a login token, post
    /// `action=login`, keep the session cookies.
    pub async fn login(&self, credential: &LoginCredential) -> Result<(), Error> {
        let token = self.fetch_token("login").await?;
        let envelope = RequestBuilder::login()
            .set("name", &credential.username)?
            .set("password", &credential.password)?
            .set("token", token)?
            .build_response(self)
            .await?;
        let login = envelope.content().get("login");
        let result = login.and_then(|l| l.get("result")).and_then(Value::as_str);
        if result == Some("Success") {
            event!(Level::INFO, user = %credential.username, "logged in");
            Ok(())
        } else {
            let reason = login
                .and_then(|l| l.get("reason"))
                .and_then(Value::as_str)
                .or(result)
                .unwrap_or("no result reported")
                .to_string();
            Err(Error::LoginFailure(reason))
        }
    }

    /// Fetches a fresh CSRF token for write actions.
    pub async fn csrf_token(&self) -> Result<String, Error> {
        self.fetch_token("csrf").await
    }

    async fn fetch_token(&self, kind: &str) -> Result<String, Error> {
        let envelope = RequestBuilder::query()
            .append("meta", "tokens")?
            .append("type", kind)?
            .build_response(self)
            .await?;
        token_from_envelope(&envelope, kind)
    }
}

impl Transport for HttpTransport {
    async fn get(&self, params: &HashMap<String, String>) -> Result<String, TransportError> {
        self.request(Verb::Get, params).await
    }

    async fn post(&self, params: &HashMap<String, String>) -> Result<String, TransportError> {
        self.request(Verb::Post, params).await
    }
}

fn token_from_envelope(envelope: &ResponseEnvelope, kind: &str) -> Result<String, Error> {
    let field = format!("{}token", kind);
    envelope
        .content()
        .get("query")
        .and_then(|q| q.get("tokens"))
        .and_then(|t| t.get(&field))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::MissingToken(kind.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use serde_json::json;

    #[test]
    fn test_new_rejects_bad_endpoint() {
        assert!(matches!(
            HttpTransport::new("not a url"),
            Err(TransportError::Endpoint(_))
        ));
    }

    #[test]
    fn test_decorate_fills_absent_defaults() {
        let transport = HttpTransport::new("https://en.wikipedia.org/w/api.php").unwrap();
        let mut params = HashMap::new();
        transport.decorate(&mut params);
        assert_eq!(params.get("format").map(String::as_str), Some("json"));
        assert_eq!(params.get("formatversion").map(String::as_str), Some("2"));
        assert_eq!(params.get("utf8").map(String::as_str), Some("1"));
        assert_eq!(params.get("maxlag").map(String::as_str), Some("5"));
        assert!(params.get("assert").is_none());
    }

    #[test]
    fn test_decorate_keeps_caller_values() {
        let transport = HttpTransport::new("https://en.wikipedia.org/w/api.php").unwrap();
        let mut params = HashMap::new();
        params.insert("format".to_string(), "xml".to_string());
        params.insert("maxlag".to_string(), "1".to_string());
        transport.decorate(&mut params);
        assert_eq!(params.get("format").map(String::as_str), Some("xml"));
        assert_eq!(params.get("maxlag").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_decorate_applies_profile_assert() {
        let profile = SiteProfile {
            api: "https://en.wikipedia.org/w/api.php".to_string(),
            assert: Some(AssertType::Bot),
            maxlag: Some(3),
            user_agent: Some("test agent".to_string()),
        };
        let transport = HttpTransport::from_profile(&profile).unwrap();
        assert_eq!(transport.user_agent(), "test agent");
        let mut params = HashMap::new();
        transport.decorate(&mut params);
        assert_eq!(params.get("assert").map(String::as_str), Some("bot"));
        assert_eq!(params.get("maxlag").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_is_lagged() {
        let transport = HttpTransport::new("https://en.wikipedia.org/w/api.php").unwrap();
        let lagged = json!({
            "error": { "code": "maxlag", "info": "Waiting for a database server" }
        })
        .to_string();
        assert!(transport.is_lagged(&lagged));
        assert!(!transport.is_lagged("{\"query\":{}}"));
        assert!(!transport.is_lagged("<html>not json</html>"));
    }

    #[test]
    fn test_token_from_envelope() {
        let raw = json!({
            "batchcomplete": true,
            "query": { "tokens": { "csrftoken": "abc+\\" } }
        })
        .to_string();
        let envelope = ResponseEnvelope::parse(Action::Query, &raw).unwrap();
        assert_eq!(token_from_envelope(&envelope, "csrf").unwrap(), "abc+\\");
        assert!(matches!(
            token_from_envelope(&envelope, "login"),
            Err(Error::MissingToken(_))
        ));
    }
}
