//! Per-call request description.

use crate::{Error, Result};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::path::PathBuf;
use url::Url;

/// Everything needed to make one signed call.
///
/// The body type `B` is serialized to JSON; it defaults to
/// [`serde_json::Value`] for requests without a body.
///
/// # Examples
///
/// ```
/// use edgecall::RequestConfig;
/// use serde_json::json;
///
/// let request = RequestConfig::post("~/.edgerc", "ccu", "/ccu/v3/invalidate/url/production")
///     .with_body(json!({ "objects": ["https://www.example.com/index.html"] }))
///     .with_header("accept", "application/json")
///     .unwrap();
///
/// assert_eq!(request.method, http::Method::POST);
/// assert!(request.body.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct RequestConfig<B = serde_json::Value> {
    /// Path to the credentials file handed to the signer provider.
    pub edgerc_path: PathBuf,

    /// Section of the credentials file to sign with.
    pub section: String,

    /// The HTTP method.
    pub method: Method,

    /// The API path, starting with `/`.
    pub path: String,

    /// Raw query string without the leading `?`. Already encoded by the caller.
    pub params: String,

    /// Optional JSON body.
    pub body: Option<B>,

    /// Additional headers for this request.
    pub headers: HeaderMap,
}

impl RequestConfig {
    /// Creates a request without a body.
    pub fn new(
        edgerc_path: impl Into<PathBuf>,
        section: impl Into<String>,
        method: Method,
        path: impl Into<String>,
    ) -> Self {
        Self {
            edgerc_path: edgerc_path.into(),
            section: section.into(),
            method,
            path: path.into(),
            params: String::new(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// Creates a request from a method name such as `"PATCH"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if `method` is not a valid HTTP verb.
    pub fn with_method_str(
        edgerc_path: impl Into<PathBuf>,
        section: impl Into<String>,
        method: &str,
        path: impl Into<String>,
    ) -> Result<Self> {
        if method.is_empty() {
            return Err(Error::ConfigurationError("HTTP method is empty".to_string()));
        }
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|e| Error::ConfigurationError(format!("Invalid HTTP method: {}", e)))?;
        Ok(Self::new(edgerc_path, section, method, path))
    }

    /// Creates a GET request.
    pub fn get(
        edgerc_path: impl Into<PathBuf>,
        section: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self::new(edgerc_path, section, Method::GET, path)
    }

    /// Creates a POST request. Attach a body with [`with_body`](Self::with_body).
    pub fn post(
        edgerc_path: impl Into<PathBuf>,
        section: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self::new(edgerc_path, section, Method::POST, path)
    }

    /// Creates a PUT request.
    pub fn put(
        edgerc_path: impl Into<PathBuf>,
        section: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self::new(edgerc_path, section, Method::PUT, path)
    }

    /// Creates a DELETE request.
    pub fn delete(
        edgerc_path: impl Into<PathBuf>,
        section: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self::new(edgerc_path, section, Method::DELETE, path)
    }
}

impl<B> RequestConfig<B> {
    /// Sets the JSON body, changing the body type.
    pub fn with_body<C>(self, body: C) -> RequestConfig<C> {
        RequestConfig {
            edgerc_path: self.edgerc_path,
            section: self.section,
            method: self.method,
            path: self.path,
            params: self.params,
            body: Some(body),
            headers: self.headers,
        }
    }

    /// Sets the raw query string (without `?`).
    pub fn with_params(mut self, params: impl Into<String>) -> Self {
        self.params = params.into();
        self
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Adds several headers from string pairs.
    ///
    /// # Errors
    ///
    /// Returns an error on the first invalid name or value.
    pub fn with_headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in headers {
            let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
            self.headers.insert(name, value);
        }
        Ok(self)
    }

    /// Builds `{scheme}://{host}{path}`, adding `?{params}` when params are set.
    pub fn url(&self, scheme: &str, host: &str) -> Result<Url> {
        let mut raw = format!("{}://{}{}", scheme, host, self.path);
        if !self.params.is_empty() {
            raw.push('?');
            raw.push_str(&self.params);
        }
        Ok(Url::parse(&raw)?)
    }
}

pub(crate) fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::try_from(name)
        .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
    let value = HeaderValue::try_from(value)
        .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_url_without_params() {
        let request = RequestConfig::get("edgerc", "default", "/papi/v1/contracts");
        let url = request.url("https", "akab-test.luna.akamaiapis.net").unwrap();

        assert_eq!(
            url.as_str(),
            "https://akab-test.luna.akamaiapis.net/papi/v1/contracts"
        );
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_url_with_raw_params() {
        let request = RequestConfig::get("edgerc", "default", "/papi/v1/properties")
            .with_params("contractId=ctr_1&groupId=grp_2");
        let url = request.url("https", "akab-test.luna.akamaiapis.net").unwrap();

        assert_eq!(url.path(), "/papi/v1/properties");
        assert_eq!(url.query(), Some("contractId=ctr_1&groupId=grp_2"));
    }

    #[test]
    fn test_url_with_invalid_host_fails() {
        let request = RequestConfig::get("edgerc", "default", "/x");
        assert!(matches!(
            request.url("https", "bad host.example"),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_method_from_str() {
        let request =
            RequestConfig::with_method_str("edgerc", "default", "PATCH", "/x").unwrap();
        assert_eq!(request.method, Method::PATCH);

        assert!(matches!(
            RequestConfig::with_method_str("edgerc", "default", "", "/x"),
            Err(Error::ConfigurationError(_))
        ));
        assert!(matches!(
            RequestConfig::with_method_str("edgerc", "default", "GE T", "/x"),
            Err(Error::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_invalid_header_rejected() {
        let result = RequestConfig::get("edgerc", "default", "/x").with_header("bad header", "v");
        assert!(matches!(result, Err(Error::ConfigurationError(_))));

        let result = RequestConfig::get("edgerc", "default", "/x").with_header("x-ok", "line\nbreak");
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn test_with_headers_and_body() {
        let request = RequestConfig::put("edgerc", "default", "/x")
            .with_headers([("x-one", "1"), ("x-two", "2")])
            .unwrap()
            .with_body(json!({ "name": "example" }));

        assert_eq!(request.headers.get("x-one").unwrap(), "1");
        assert_eq!(request.headers.get("x-two").unwrap(), "2");
        assert_eq!(request.body, Some(json!({ "name": "example" })));
        assert_eq!(request.method, Method::PUT);
    }
}
