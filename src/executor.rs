//! Signed request execution with a fixed retry policy.
//!
//! The [`Executor`] type is the main entry point. Use [`ExecutorBuilder`] to
//! configure the retry bound, wait, timeout and signer provider.

use crate::{
    request::parse_header,
    response::TRANSPORT_FAILURE_STATUS,
    retry::RetryPolicy,
    signer::{Signer, SignerProvider},
    ApiResponse, Error, RequestConfig, Result,
};
use http::{header::CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Default client-level timeout for each attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes signed API calls, retrying soft failures.
///
/// The executor is cheap to clone and holds no per-call state: every call
/// loads its own signer and keeps its own attempt history.
///
/// # Examples
///
/// ```no_run
/// use edgecall::{Executor, RequestConfig, Signer};
/// use serde::Deserialize;
/// use std::path::Path;
/// use std::time::Duration;
///
/// # struct EdgeGrid;
/// # impl Signer for EdgeGrid {
/// #     fn host(&self) -> &str { "akab-xxxx.luna.akamaiapis.net" }
/// #     fn sign(&self, _request: &mut reqwest::Request) {}
/// # }
/// # fn load_edgerc(_path: &Path, _section: &str) -> Result<EdgeGrid, std::io::Error> { Ok(EdgeGrid) }
/// #[derive(Deserialize)]
/// struct Contracts {
///     #[serde(rename = "accountId")]
///     account_id: String,
/// }
///
/// # async fn example() -> Result<(), edgecall::Error> {
/// let executor = Executor::builder(load_edgerc)
///     .max_attempts(3)
///     .retry_delay(Duration::from_secs(1))
///     .build()?;
///
/// let request = RequestConfig::get("~/.edgerc", "papi", "/papi/v1/contracts");
/// let response = executor.execute::<_, Contracts>(&request).await?;
///
/// match response.body {
///     Some(contracts) => println!("account: {}", contracts.account_id),
///     None => eprintln!("failed: {:?} {:?}", response.status_codes, response.errors),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Executor {
    inner: Arc<ExecutorInner>,
}

struct ExecutorInner {
    http_client: reqwest::Client,
    provider: Box<dyn SignerProvider>,
    default_headers: HeaderMap,
    retry_policy: RetryPolicy,
    scheme: String,
}

/// Attempt history collected while the retry loop runs.
struct AttemptLog {
    status_codes: Vec<u16>,
    errors: Vec<String>,
    success_body: Option<Vec<u8>>,
    started: Instant,
}

impl AttemptLog {
    fn new() -> Self {
        Self {
            status_codes: Vec::new(),
            errors: Vec::new(),
            success_body: None,
            started: Instant::now(),
        }
    }

    fn record_failure(&mut self, status: u16, message: String) {
        self.status_codes.push(status);
        self.errors.push(message);
    }

    /// A 200 whose body could not be read is a failed attempt, not a success.
    fn succeeded(&self) -> bool {
        self.success_body.is_some()
    }

    fn finish<T>(self, body: Option<T>) -> ApiResponse<T> {
        let raw_body = self
            .success_body
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
        ApiResponse {
            status_codes: self.status_codes,
            errors: self.errors,
            body,
            raw_body,
            latency: self.started.elapsed(),
        }
    }
}

impl Executor {
    /// Creates a new `ExecutorBuilder` using `provider` to load signers.
    pub fn builder<P>(provider: P) -> ExecutorBuilder
    where
        P: SignerProvider + 'static,
    {
        ExecutorBuilder::new(provider)
    }

    /// The retry policy applied to every call.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.inner.retry_policy
    }

    /// Makes a signed call and decodes a 200 response body into `T`.
    ///
    /// Returns `Ok` both when an attempt succeeded and when every attempt
    /// failed; check [`ApiResponse::is_success`]. Returns `Err` only for
    /// failures that retrying would not fix.
    ///
    /// # Errors
    ///
    /// * [`Error::SignerInit`] if the credentials cannot be loaded
    /// * [`Error::SerializationFailed`] if the body cannot be encoded; no
    ///   request is sent
    /// * [`Error::InvalidUrl`] or [`Error::RequestBuild`] if the request
    ///   cannot be constructed
    /// * [`Error::DeserializationFailed`] if the 200 body does not decode
    pub async fn execute<B, T>(&self, request: &RequestConfig<B>) -> Result<ApiResponse<T>>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let log = self.run(request).await?;
        let Some(raw) = log.success_body.as_deref() else {
            return Ok(log.finish(None));
        };

        match serde_json::from_slice::<T>(raw) {
            Ok(data) => Ok(log.finish(Some(data))),
            Err(e) => {
                let raw_response = String::from_utf8_lossy(raw).into_owned();
                tracing::error!(
                    error = %e,
                    raw_response = %raw_response,
                    path = %request.path,
                    "Failed to deserialize response"
                );

                Err(Error::DeserializationFailed {
                    raw_response,
                    serde_error: e.to_string(),
                    status_codes: log.status_codes,
                })
            }
        }
    }

    /// Makes a signed call without decoding the response.
    ///
    /// The body of a successful attempt is available as
    /// [`ApiResponse::raw_body`]; [`ApiResponse::body`] is always `None`.
    pub async fn execute_raw<B>(&self, request: &RequestConfig<B>) -> Result<ApiResponse<()>>
    where
        B: Serialize,
    {
        let log = self.run(request).await?;
        Ok(log.finish(None))
    }

    /// Runs the attempt loop until a 200 or until the policy is exhausted.
    async fn run<B>(&self, request: &RequestConfig<B>) -> Result<AttemptLog>
    where
        B: Serialize,
    {
        let signer = self
            .inner
            .provider
            .load(&request.edgerc_path, &request.section)
            .map_err(|source| Error::SignerInit {
                section: request.section.clone(),
                source,
            })?;

        let body = match &request.body {
            Some(body) => Some(
                serde_json::to_vec(body).map_err(|e| Error::SerializationFailed(e.to_string()))?,
            ),
            None => None,
        };

        let url = request.url(&self.inner.scheme, signer.host())?;
        let headers = self.merge_headers(&request.headers, body.is_some());
        let policy = self.inner.retry_policy;
        let mut log = AttemptLog::new();

        for attempt in 1..=policy.max_attempts() {
            let http_request =
                self.build_request(request, url.clone(), &headers, body.as_deref(), signer.as_ref())?;

            tracing::debug!(
                method = %request.method,
                url = %url,
                attempt = attempt,
                "Executing signed request"
            );

            match self.inner.http_client.execute(http_request).await {
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        attempt = attempt,
                        method = %request.method,
                        path = %request.path,
                        "Request failed"
                    );
                    log.record_failure(TRANSPORT_FAILURE_STATUS, e.to_string());
                }
                Ok(response) => {
                    let status = response.status().as_u16();

                    tracing::info!(
                        status = status,
                        attempt = attempt,
                        latency_ms = log.started.elapsed().as_millis(),
                        "Received HTTP response"
                    );

                    match response.bytes().await {
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                status = status,
                                attempt = attempt,
                                "Failed to read response body"
                            );
                            log.record_failure(status, e.to_string());
                        }
                        Ok(bytes) if status == 200 => {
                            log.status_codes.push(status);
                            log.success_body = Some(bytes.to_vec());
                            break;
                        }
                        Ok(bytes) => {
                            let raw_response = String::from_utf8_lossy(&bytes).into_owned();
                            tracing::warn!(
                                status = status,
                                attempt = attempt,
                                response = %raw_response,
                                "Unsuccessful status"
                            );
                            log.record_failure(status, raw_response);
                        }
                    }
                }
            }

            if let Some(delay) = policy.delay_after(attempt) {
                tracing::info!(
                    delay_ms = delay.as_millis(),
                    attempt = attempt,
                    "Retrying request after delay"
                );
                tokio::time::sleep(delay).await;
            }
        }

        if !log.succeeded() {
            tracing::warn!(
                attempts = log.status_codes.len(),
                method = %request.method,
                path = %request.path,
                "All attempts failed"
            );
        }

        Ok(log)
    }

    /// Layers request headers over the defaults, then forces the JSON content type.
    fn merge_headers(&self, request_headers: &HeaderMap, has_body: bool) -> HeaderMap {
        let mut merged = self.inner.default_headers.clone();

        for name in request_headers.keys() {
            merged.remove(name);
            for value in request_headers.get_all(name) {
                merged.append(name.clone(), value.clone());
            }
        }

        if has_body {
            merged.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        merged
    }

    /// Builds and signs the request for one attempt.
    fn build_request<B>(
        &self,
        request: &RequestConfig<B>,
        url: Url,
        headers: &HeaderMap,
        body: Option<&[u8]>,
        signer: &dyn Signer,
    ) -> Result<reqwest::Request> {
        let mut builder = self
            .inner
            .http_client
            .request(request.method.clone(), url)
            .headers(headers.clone());

        if let Some(body) = body {
            builder = builder.body(body.to_vec());
        }

        let mut http_request = builder.build()?;
        signer.sign(&mut http_request);
        Ok(http_request)
    }
}

/// Builder for configuring and creating an [`Executor`].
///
/// # Examples
///
/// ```
/// use edgecall::{Executor, RetryPolicy, Signer};
/// use std::path::Path;
/// use std::time::Duration;
///
/// struct Fixed;
///
/// impl Signer for Fixed {
///     fn host(&self) -> &str {
///         "akab-xxxx.luna.akamaiapis.net"
///     }
///
///     fn sign(&self, _request: &mut reqwest::Request) {}
/// }
///
/// let executor = Executor::builder(|_: &Path, _: &str| Ok::<_, std::io::Error>(Fixed))
///     .retry_policy(RetryPolicy::fixed(4, Duration::from_millis(500)))
///     .timeout(Duration::from_secs(10))
///     .default_header("User-Agent", "edgecall/0.1")
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(executor.retry_policy().max_attempts(), 4);
/// ```
pub struct ExecutorBuilder {
    provider: Box<dyn SignerProvider>,
    default_headers: HeaderMap,
    retry_policy: RetryPolicy,
    timeout: Duration,
    scheme: String,
}

impl ExecutorBuilder {
    /// Creates a new `ExecutorBuilder` with default settings.
    pub fn new<P>(provider: P) -> Self
    where
        P: SignerProvider + 'static,
    {
        Self {
            provider: Box::new(provider),
            default_headers: HeaderMap::new(),
            retry_policy: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
            scheme: "https".to_string(),
        }
    }

    /// Sets the retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Sets the maximum number of attempts, keeping the current delay.
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.retry_policy = self.retry_policy.with_max_attempts(max_attempts);
        self
    }

    /// Sets the wait between attempts, keeping the current attempt bound.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_policy = self.retry_policy.with_delay(delay);
        self
    }

    /// Sets the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the URL scheme. Defaults to `https`; `http` is accepted for local servers.
    ///
    /// # Errors
    ///
    /// Returns an error for any other scheme.
    pub fn scheme(mut self, scheme: impl AsRef<str>) -> Result<Self> {
        let scheme = scheme.as_ref().to_ascii_lowercase();
        if scheme != "https" && scheme != "http" {
            return Err(Error::ConfigurationError(format!(
                "Unsupported scheme: {}",
                scheme
            )));
        }
        self.scheme = scheme;
        Ok(self)
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Builds the configured `Executor`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn build(self) -> Result<Executor> {
        let http_client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| {
                Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Executor {
            inner: Arc::new(ExecutorInner {
                http_client,
                provider: self.provider,
                default_headers: self.default_headers,
                retry_policy: self.retry_policy,
                scheme: self.scheme,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    struct Fixed;

    impl Signer for Fixed {
        fn host(&self) -> &str {
            "akab-test.luna.akamaiapis.net"
        }

        fn sign(&self, request: &mut reqwest::Request) {
            request
                .headers_mut()
                .insert("authorization", HeaderValue::from_static("EG1-HMAC-SHA256 test"));
        }
    }

    fn executor() -> Executor {
        Executor::builder(|_: &Path, _: &str| Ok::<_, std::io::Error>(Fixed))
            .default_header("content-type", "text/plain")
            .unwrap()
            .default_header("x-default", "d")
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_body_forces_json_content_type() {
        let executor = executor();
        let mut request_headers = HeaderMap::new();
        request_headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/xml"));

        let merged = executor.merge_headers(&request_headers, true);
        assert_eq!(merged.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(merged.get("x-default").unwrap(), "d");

        let merged = executor.merge_headers(&request_headers, false);
        assert_eq!(merged.get(CONTENT_TYPE).unwrap(), "text/xml");
    }

    #[test]
    fn test_request_headers_replace_defaults() {
        let executor = executor();
        let mut request_headers = HeaderMap::new();
        request_headers.append("x-default", HeaderValue::from_static("a"));
        request_headers.append("x-default", HeaderValue::from_static("b"));

        let merged = executor.merge_headers(&request_headers, false);
        let values: Vec<_> = merged.get_all("x-default").iter().collect();
        assert_eq!(values, vec!["a", "b"]);
    }

    #[test]
    fn test_signing_happens_after_headers() {
        let executor = executor();
        let request = RequestConfig::post("edgerc", "default", "/ccu/v3/invalidate/url")
            .with_params("a=1");
        let url = request.url("https", Fixed.host()).unwrap();
        let headers = executor.merge_headers(&request.headers, true);
        let body = b"{}";

        let built = executor
            .build_request(&request, url, &headers, Some(&body[..]), &Fixed)
            .unwrap();

        assert_eq!(
            built.url().as_str(),
            "https://akab-test.luna.akamaiapis.net/ccu/v3/invalidate/url?a=1"
        );
        assert_eq!(built.headers().get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(
            built.headers().get("authorization").unwrap(),
            "EG1-HMAC-SHA256 test"
        );
        assert_eq!(built.body().and_then(|b| b.as_bytes()), Some(&b"{}"[..]));
    }

    #[test]
    fn test_unsupported_scheme_rejected() {
        let result = Executor::builder(|_: &Path, _: &str| Ok::<_, std::io::Error>(Fixed))
            .scheme("ftp");
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }
}
