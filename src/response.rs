//! The record of a completed call.
//!
//! An [`ApiResponse`] is returned whether or not any attempt succeeded; the
//! per-attempt status codes and error strings tell the two apart.

use std::time::Duration;

/// Status recorded for an attempt that got no HTTP response at all.
pub const TRANSPORT_FAILURE_STATUS: u16 = 0;

/// The outcome of every attempt made for one call.
///
/// # Examples
///
/// ```no_run
/// use edgecall::{Executor, RequestConfig};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Groups {
///     #[serde(rename = "accountId")]
///     account_id: String,
/// }
///
/// # async fn example(executor: Executor) -> Result<(), edgecall::Error> {
/// let request = RequestConfig::get("~/.edgerc", "default", "/papi/v1/groups");
/// let response = executor.execute::<_, Groups>(&request).await?;
///
/// if let Some(groups) = &response.body {
///     println!("account {} after {} attempt(s)", groups.account_id, response.attempts());
/// } else {
///     for (status, error) in response.status_codes.iter().zip(&response.errors) {
///         eprintln!("{}: {}", status, error);
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// HTTP status of each attempt, in order. `0` marks a transport failure.
    pub status_codes: Vec<u16>,

    /// One message per failed attempt: the response body for non-200
    /// statuses, otherwise the transport or read error.
    pub errors: Vec<String>,

    /// The decoded body of the successful attempt.
    ///
    /// `None` when every attempt failed or when no decoding was requested.
    pub body: Option<T>,

    /// The raw body text of the successful attempt.
    pub raw_body: Option<String>,

    /// Time from the first attempt until the call finished, including waits.
    pub latency: Duration,
}

impl<T> ApiResponse<T> {
    /// The number of attempts made.
    pub fn attempts(&self) -> usize {
        self.status_codes.len()
    }

    /// The status of the final attempt.
    pub fn last_status(&self) -> Option<u16> {
        self.status_codes.last().copied()
    }

    /// Returns `true` if the final attempt returned 200 and its body was read.
    ///
    /// ```
    /// # use edgecall::ApiResponse;
    /// # use std::time::Duration;
    /// let response: ApiResponse<()> = ApiResponse {
    ///     status_codes: vec![0, 502, 200],
    ///     errors: vec!["connection refused".into(), "Bad Gateway".into()],
    ///     body: None,
    ///     raw_body: Some("{}".into()),
    ///     latency: Duration::from_secs(10),
    /// };
    ///
    /// assert!(response.is_success());
    /// assert!(response.was_retried());
    /// ```
    pub fn is_success(&self) -> bool {
        self.last_status() == Some(200) && self.raw_body.is_some()
    }

    /// Returns `true` if more than one attempt was needed.
    pub fn was_retried(&self) -> bool {
        self.attempts() > 1
    }

    /// Consumes the response, returning the decoded body.
    pub fn into_body(self) -> Option<T> {
        self.body
    }

    /// Maps the decoded body, keeping the attempt history.
    pub fn map<U, F>(self, f: F) -> ApiResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        ApiResponse {
            status_codes: self.status_codes,
            errors: self.errors,
            body: self.body.map(f),
            raw_body: self.raw_body,
            latency: self.latency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exhausted() -> ApiResponse<u32> {
        ApiResponse {
            status_codes: vec![TRANSPORT_FAILURE_STATUS, 429, 500],
            errors: vec![
                "error sending request".to_string(),
                "slow down".to_string(),
                "boom".to_string(),
            ],
            body: None,
            raw_body: None,
            latency: Duration::from_millis(30),
        }
    }

    #[test]
    fn test_exhausted_is_not_success() {
        let response = exhausted();
        assert_eq!(response.attempts(), 3);
        assert_eq!(response.last_status(), Some(500));
        assert!(!response.is_success());
        assert_eq!(response.errors.len(), response.attempts());
    }

    #[test]
    fn test_empty_history_is_not_success() {
        let response = ApiResponse::<u32> {
            status_codes: Vec::new(),
            errors: Vec::new(),
            body: None,
            raw_body: None,
            latency: Duration::ZERO,
        };
        assert!(!response.is_success());
        assert!(!response.was_retried());
        assert_eq!(response.last_status(), None);
    }

    #[test]
    fn test_unread_final_200_is_not_success() {
        let response = ApiResponse::<u32> {
            status_codes: vec![200],
            errors: vec!["error decoding response body".to_string()],
            body: None,
            raw_body: None,
            latency: Duration::ZERO,
        };
        assert_eq!(response.last_status(), Some(200));
        assert!(!response.is_success());
    }

    #[test]
    fn test_map_keeps_history() {
        let response = ApiResponse {
            status_codes: vec![500, 200],
            errors: vec!["boom".to_string()],
            body: Some(41u32),
            raw_body: Some("41".to_string()),
            latency: Duration::from_millis(5),
        };

        let mapped = response.map(|n| n + 1);
        assert_eq!(mapped.status_codes, vec![500, 200]);
        assert_eq!(mapped.errors, vec!["boom".to_string()]);
        assert_eq!(mapped.into_body(), Some(42));
    }
}
