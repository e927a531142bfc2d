use std::env;
use std::pin::Pin;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::Stream;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUESTS, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS};
use crate::sse::process_sse;
use crate::types::{
    MessageCountTokensParams, MessageCreateParams, MessageStreamEvent, MessageTokensCount,
};

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/";
const ANTHROPIC_API_VERSION: &str = "2023-06-01";
const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A boxed stream of parsed message events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<MessageStreamEvent>> + Send>>;

/// The operations a chat session needs from the model provider.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Open a streaming completion for `params`.
    async fn stream(&self, params: MessageCreateParams) -> Result<EventStream>;

    /// Count the input tokens `params` would consume.
    async fn count_tokens(&self, params: MessageCountTokensParams) -> Result<MessageTokensCount>;
}

/// Client for the Anthropic API.
#[derive(Debug, Clone)]
pub struct Anthropic {
    api_key: String,
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
}

impl Anthropic {
    /// Create a new Anthropic client.
    ///
    /// The API key can be provided directly or read from the ANTHROPIC_API_KEY
    /// environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    ///
    /// `timeout` bounds non-streaming requests only; streams may run as long
    /// as the server keeps sending.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => env::var(API_KEY_ENV).map_err(|_| {
                Error::authentication(format!(
                    "API key not provided and {API_KEY_ENV} environment variable not set"
                ))
            })?,
        };
        if api_key.trim().is_empty() {
            return Err(Error::authentication("API key is empty"));
        }

        let mut base_url = base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        url::Url::parse(&base_url)
            .map_err(|e| Error::url(format!("Invalid base URL {base_url:?}: {e}"), Some(e)))?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
        })
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let api_key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| Error::authentication("API key contains invalid header characters"))?;
        headers.insert("x-api-key", api_key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_API_VERSION),
        );
        Ok(headers)
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let request_id = response
            .headers()
            .get("request-id")
            .or_else(|| response.headers().get("x-request-id"))
            .and_then(|val| val.to_str().ok())
            .map(String::from);

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            #[serde(rename = "type")]
            error_type: Option<String>,
            message: Option<String>,
            param: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error);
        let (error_type, error_message, error_param) = match detail {
            Some(detail) => (
                detail.error_type,
                detail.message.unwrap_or_else(|| error_body.clone()),
                detail.param,
            ),
            None => (None, error_body.clone(), None),
        };

        error_from_status(status_code, error_type, error_message, error_param, request_id, retry_after)
    }

    /// POST `body` to `path` and return the successful response.
    async fn post<T: serde::Serialize>(
        &self,
        path: &str,
        headers: HeaderMap,
        body: &T,
        timeout: Option<Duration>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "sending request");
        CLIENT_REQUESTS.click();
        let start = Instant::now();

        let mut request = self.client.post(&url).headers(headers).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(|e| {
            CLIENT_REQUEST_ERRORS.click();
            self.map_send_error(e)
        });
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        let response = response?;

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            let err = Self::process_error_response(response).await;
            tracing::warn!(error = %err, %url, "request failed");
            return Err(err);
        }
        Ok(response)
    }

    /// Send a message to the API and get a streaming response.
    ///
    /// Returns a stream of MessageStreamEvent objects that can be processed incrementally.
    pub async fn stream(&self, mut params: MessageCreateParams) -> Result<EventStream> {
        params.stream = true;

        let mut headers = self.default_headers()?;
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );

        let response = self.post("messages", headers, &params, None).await?;
        Ok(Box::pin(process_sse(response.bytes_stream())))
    }

    /// Count the tokens a request would consume.
    pub async fn count_tokens(
        &self,
        params: MessageCountTokensParams,
    ) -> Result<MessageTokensCount> {
        let headers = self.default_headers()?;
        let response = self
            .post("messages/count_tokens", headers, &params, Some(self.timeout))
            .await?;
        response.json::<MessageTokensCount>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }
}

#[async_trait]
impl ChatBackend for Anthropic {
    async fn stream(&self, params: MessageCreateParams) -> Result<EventStream> {
        Anthropic::stream(self, params).await
    }

    async fn count_tokens(&self, params: MessageCountTokensParams) -> Result<MessageTokensCount> {
        Anthropic::count_tokens(self, params).await
    }
}

/// Map an HTTP status and parsed error body onto our error kinds.
fn error_from_status(
    status_code: u16,
    error_type: Option<String>,
    message: String,
    param: Option<String>,
    request_id: Option<String>,
    retry_after: Option<u64>,
) -> Error {
    match status_code {
        400 => Error::bad_request(message, param),
        401 => Error::authentication(message),
        403 => Error::permission(message),
        404 => Error::not_found(message, None, None),
        408 => Error::timeout(message, None),
        429 => Error::rate_limit(message, retry_after),
        500 => Error::internal_server(message, request_id),
        502..=504 => Error::service_unavailable(message, retry_after),
        _ => Error::api(status_code, error_type, message, request_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{KnownModel, MessageParam, Model};
    use futures::StreamExt;

    #[test]
    fn client_creation() {
        let client = Anthropic::new(Some("test-key".to_string())).unwrap();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url, DEFAULT_API_URL);
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);

        let client = Anthropic::with_options(
            Some("test-key".to_string()),
            Some("https://custom-api.example.com".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://custom-api.example.com/");
        assert_eq!(client.timeout, Duration::from_secs(30));
    }

    #[test]
    fn rejects_bad_base_url() {
        let err = Anthropic::with_options(
            Some("test-key".to_string()),
            Some("not a url".to_string()),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn rejects_empty_key() {
        let err = Anthropic::new(Some("  ".to_string())).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn invalid_header_key_is_authentication_error() {
        let client = Anthropic::new(Some("bad\nkey".to_string())).unwrap();
        assert!(client.default_headers().unwrap_err().is_authentication());
    }

    #[test]
    fn headers_carry_key_and_version() {
        let client = Anthropic::new(Some("sk-test".to_string())).unwrap();
        let headers = client.default_headers().unwrap();
        assert_eq!(headers["x-api-key"], "sk-test");
        assert_eq!(headers["anthropic-version"], ANTHROPIC_API_VERSION);
    }

    #[test]
    fn status_mapping() {
        let err = |code| error_from_status(code, None, "m".to_string(), None, None, None);
        assert!(matches!(err(400), Error::BadRequest { .. }));
        assert!(err(401).is_authentication());
        assert!(matches!(err(403), Error::Permission { .. }));
        assert!(err(404).is_not_found());
        assert!(err(408).is_timeout());
        assert!(err(429).is_rate_limit());
        assert!(matches!(err(500), Error::InternalServer { .. }));
        for code in 502..=504 {
            assert!(matches!(err(code), Error::ServiceUnavailable { .. }));
        }
        assert_eq!(err(529).status_code(), Some(529));
    }

    #[tokio::test]
    #[ignore] // Requires a real API key
    async fn live_stream() {
        let Ok(api_key) = env::var(API_KEY_ENV) else {
            return;
        };
        let client = Anthropic::new(Some(api_key)).unwrap();
        let params = MessageCreateParams::new(
            100,
            vec![MessageParam::user("Respond with a short greeting.")],
            Model::Known(KnownModel::Claude37Sonnet20250219),
        );
        let mut stream = client.stream(params).await.unwrap();
        let mut received = false;
        while let Some(event) = stream.next().await {
            event.unwrap();
            received = true;
        }
        assert!(received);
    }
}
