//! `reqwest`-backed transport with tracing instrumentation.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{Span, instrument};
use url::Url;

use super::{Transport, TransportRequest, TransportResponse, decode_body};
use crate::auth::ApiAuthMethod;
use crate::error::{ConfigError, TransportError};
use crate::params::ParamSet;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builder for configuring an [`HttpTransport`].
#[derive(Debug)]
pub struct HttpTransportBuilder {
    base_url: String,
    timeout: Duration,
    default_headers: HeaderMap,
    auth: Option<(ApiAuthMethod, String)>,
}

impl HttpTransportBuilder {
    fn new(base_url: String) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            default_headers,
            auth: None,
        }
    }

    /// Sets the request timeout. Defaults to 10 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a header sent with every request.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidHeader`] if the name or value is not valid HTTP.
    pub fn default_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, ConfigError> {
        let (name, value) = header_pair(name.as_ref(), value.as_ref(), false)?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the authentication method and credential.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use apimap_lib::{ApiAuthMethod, HttpTransport};
    ///
    /// let transport = HttpTransport::builder("https://api.example.com")
    ///     .auth(ApiAuthMethod::ApiKey("X-API-Key".into()), "secret")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(transport.base_url(), "https://api.example.com");
    /// ```
    pub fn auth(mut self, method: ApiAuthMethod, key: impl Into<String>) -> Self {
        self.auth = Some((method, key.into()));
        self
    }

    /// Builds the transport.
    ///
    /// ## Errors
    ///
    /// - [`ConfigError::InvalidUrl`] if the base URL does not parse.
    /// - [`ConfigError::InvalidHeader`] if the credential is not a valid header value.
    /// - [`ConfigError::HttpClient`] if the HTTP client cannot be constructed.
    pub fn build(mut self) -> Result<HttpTransport, ConfigError> {
        Url::parse(&self.base_url)?;
        let base_url = self.base_url.trim_end_matches('/').to_string();

        let mut query_auth = None;
        match self.auth {
            Some((ApiAuthMethod::BearerToken, key)) => {
                let (name, value) = header_pair(AUTHORIZATION.as_str(), &format!("Bearer {key}"), true)?;
                self.default_headers.insert(name, value);
            }
            Some((ApiAuthMethod::ApiKey(header), key)) => {
                let (name, value) = header_pair(&header, &key, true)?;
                self.default_headers.insert(name, value);
            }
            Some((ApiAuthMethod::QueryParam(param), key)) => query_auth = Some((param, key)),
            Some((ApiAuthMethod::None, _)) | None => {}
        }

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(self.default_headers)
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(HttpTransport {
            client,
            base_url,
            timeout: self.timeout,
            query_auth,
        })
    }
}

fn header_pair(name: &str, value: &str, sensitive: bool) -> Result<(HeaderName, HeaderValue), ConfigError> {
    let name = HeaderName::try_from(name).map_err(|e| ConfigError::InvalidHeader(format!("{name}: {e}")))?;
    let mut value =
        HeaderValue::try_from(value).map_err(|e| ConfigError::InvalidHeader(format!("{}: {e}", name.as_str())))?;
    value.set_sensitive(sensitive);
    Ok((name, value))
}

/// JSON-over-HTTP transport.
///
/// The request URL is the base URL followed by the resolved path; query
/// parameters are form-encoded, with arrays sent as repeated `key[]=value`
/// pairs and null values skipped.
///
/// ## Examples
///
/// ```rust,ignore
/// use apimap_lib::{Dispatcher, HttpTransport, Registry, ResponseCache};
///
/// let transport = HttpTransport::new("https://api.example.com")?;
/// let dispatcher = Dispatcher::new(registry, cache, transport);
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    query_auth: Option<(String, String)>,
}

impl HttpTransport {
    pub fn builder(base_url: impl Into<String>) -> HttpTransportBuilder {
        HttpTransportBuilder::new(base_url.into())
    }

    /// Creates a transport with default settings.
    ///
    /// ## Errors
    ///
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        Self::builder(base_url).build()
    }

    /// The base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the full request URL.
    fn url_for(&self, path: &str, query: &ParamSet) -> Result<Url, TransportError> {
        let separator = if path.starts_with('/') || path.is_empty() { "" } else { "/" };
        let mut url = Url::parse(&format!("{}{separator}{path}", self.base_url))
            .map_err(|e| TransportError::other(format!("invalid URL: {e}")))?;

        let has_auth = self.query_auth.is_some();
        if !query.is_empty() || has_auth {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                match value {
                    Value::Null => {}
                    Value::Array(items) => {
                        let name = format!("{name}[]");
                        for item in items.iter().filter(|item| !item.is_null()) {
                            pairs.append_pair(&name, &query_text(item));
                        }
                    }
                    other => {
                        pairs.append_pair(name, &query_text(other));
                    }
                }
            }
            if let Some((param, key)) = &self.query_auth {
                pairs.append_pair(param, key);
            }
        }

        Ok(url)
    }

    #[instrument(
        name = "api_request",
        skip(self, request),
        fields(
            http.method = %request.method,
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
            otel.kind = "client",
            otel.status_code = tracing::field::Empty,
        )
    )]
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = self.url_for(&request.path, &request.query)?;
        Span::current().record("http.url", url.as_str());

        let mut builder = self.client.request(request.method.as_http(), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.inspect_err(|_| {
            Span::current().record("otel.status_code", "ERROR");
        })?;

        let status = response.status();
        Span::current().record("http.status_code", status.as_u16());

        let bytes = response.bytes().await?;
        let data = decode_body(&bytes);

        if !status.is_success() {
            let otel_status = if status.is_server_error() { "ERROR" } else { "UNSET" };
            Span::current().record("otel.status_code", otel_status);

            let message = data
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
            let payload = (!data.is_null()).then_some(data);

            return Err(TransportError::http(status.as_u16(), payload, message));
        }

        Span::current().record("otel.status_code", "OK");
        Ok(TransportResponse::new(status.as_u16(), data))
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send {
        self.execute(request)
    }
}

/// Query text of a scalar: strings verbatim, everything else as JSON.
fn query_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
