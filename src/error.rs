//! Error types for signed API calls.
//!
//! Only failures that retrying cannot fix surface here. Transport errors,
//! unreadable bodies and non-200 statuses are soft failures: they are recorded
//! on the [`ApiResponse`](crate::ApiResponse) and retried instead.

/// Boxed error returned by [`SignerProvider`](crate::SignerProvider) implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A hard error that aborted a call.
///
/// # Examples
///
/// ```no_run
/// use edgecall::{Error, Executor, RequestConfig};
/// # async fn example(executor: Executor) -> Result<(), Error> {
/// let request = RequestConfig::get("~/.edgerc", "default", "/papi/v1/groups");
///
/// match executor.execute::<_, serde_json::Value>(&request).await {
///     Ok(response) if response.is_success() => println!("{:?}", response.body),
///     Ok(response) => eprintln!("gave up: {:?}", response.status_codes),
///     Err(Error::DeserializationFailed { raw_response, .. }) => {
///         eprintln!("unexpected payload: {}", raw_response);
///     }
///     Err(e) => eprintln!("misconfigured: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The credential signer could not be created for the given section.
    #[error("Failed to initialize signer for section '{section}': {source}")]
    SignerInit {
        /// The credentials section that was requested
        section: String,
        /// The error reported by the signer provider
        #[source]
        source: BoxError,
    },

    /// The request body could not be serialized to JSON.
    #[error("Failed to serialize request body: {0}")]
    SerializationFailed(String),

    /// Invalid configuration was provided, such as a bad header or scheme.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The target URL could not be built from the signer host and request path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP request or client could not be constructed.
    #[error("Failed to build request: {0}")]
    RequestBuild(#[from] reqwest::Error),

    /// A 200 response body did not match the expected type.
    ///
    /// `status_codes` holds every attempt made, ending with the 200 whose body
    /// failed to decode.
    #[error("Failed to deserialize response: {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// Status codes of all attempts, in order
        status_codes: Vec<u16>,
    },
}

impl Error {
    /// Returns `true` if the error was raised before any HTTP attempt was made.
    ///
    /// ```
    /// use edgecall::Error;
    ///
    /// assert!(Error::SerializationFailed("bad".into()).is_preflight());
    /// assert!(!Error::DeserializationFailed {
    ///     raw_response: "oops".into(),
    ///     serde_error: "expected value".into(),
    ///     status_codes: vec![500, 200],
    /// }
    /// .is_preflight());
    /// ```
    pub fn is_preflight(&self) -> bool {
        !matches!(self, Error::DeserializationFailed { .. })
    }

    /// Returns the status codes recorded before the error, if any attempt ran.
    pub fn status_codes(&self) -> Option<&[u16]> {
        match self {
            Error::DeserializationFailed { status_codes, .. } => Some(status_codes),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// A specialized `Result` type for signed API calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signer_init_message_names_section() {
        let err = Error::SignerInit {
            section: "papi".to_string(),
            source: "missing client_token".into(),
        };

        assert!(err.is_preflight());
        assert_eq!(
            err.to_string(),
            "Failed to initialize signer for section 'papi': missing client_token"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_deserialization_failure_keeps_attempts() {
        let err = Error::DeserializationFailed {
            raw_response: "<html>".to_string(),
            serde_error: "expected value at line 1 column 1".to_string(),
            status_codes: vec![503, 200],
        };

        assert_eq!(err.status_codes(), Some(&[503, 200][..]));
        assert_eq!(err.raw_response(), Some("<html>"));
        assert!(!err.is_preflight());
    }
}
