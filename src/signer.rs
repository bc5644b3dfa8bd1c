//! The credential signing boundary.
//!
//! The executor never reads credential files or computes signatures itself.
//! A [`SignerProvider`] turns a credentials file and section into a
//! [`Signer`], which knows the API host and decorates each outgoing request
//! with its authentication data (for EdgeGrid, the `Authorization` header).

use crate::error::BoxError;
use std::path::Path;

/// Signs requests for a single credentials section.
///
/// # Examples
///
/// ```
/// use edgecall::Signer;
/// use http::HeaderValue;
///
/// struct StaticToken {
///     host: String,
///     token: HeaderValue,
/// }
///
/// impl Signer for StaticToken {
///     fn host(&self) -> &str {
///         &self.host
///     }
///
///     fn sign(&self, request: &mut reqwest::Request) {
///         request
///             .headers_mut()
///             .insert(http::header::AUTHORIZATION, self.token.clone());
///     }
/// }
/// ```
pub trait Signer: Send + Sync {
    /// The API host requests are sent to, e.g. `akab-xxxx.luna.akamaiapis.net`.
    fn host(&self) -> &str;

    /// Adds authentication to a fully built request.
    ///
    /// Called once per attempt, after all headers and the body are in place.
    fn sign(&self, request: &mut reqwest::Request);
}

/// Creates a [`Signer`] from a credentials file and section.
///
/// Implemented for any `Fn(&Path, &str) -> Result<S, E>` where `S` is a
/// [`Signer`], so a loader function can be passed directly.
pub trait SignerProvider: Send + Sync {
    /// Loads credentials for `section` from the file at `edgerc_path`.
    fn load(&self, edgerc_path: &Path, section: &str) -> Result<Box<dyn Signer>, BoxError>;
}

impl<F, S, E> SignerProvider for F
where
    F: Fn(&Path, &str) -> Result<S, E> + Send + Sync,
    S: Signer + 'static,
    E: Into<BoxError>,
{
    fn load(&self, edgerc_path: &Path, section: &str) -> Result<Box<dyn Signer>, BoxError> {
        match self(edgerc_path, section) {
            Ok(signer) => Ok(Box::new(signer)),
            Err(e) => Err(e.into()),
        }
    }
}
