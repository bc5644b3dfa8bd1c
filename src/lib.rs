//! # edgecall - signed API calls with a fixed retry policy
//!
//! edgecall executes requests against EdgeGrid-authenticated APIs. Each call
//! loads a signer for a credentials section, builds and signs one request per
//! attempt, and retries any unsuccessful attempt after a fixed wait. When the
//! attempts run out the call still returns normally, with every status code
//! and error message recorded.
//!
//! ## Quick Start
//!
//! ```no_run
//! use edgecall::{Executor, RequestConfig, Signer};
//! use serde::Deserialize;
//! use serde_json::json;
//! use std::path::Path;
//!
//! # struct EdgeGrid;
//! # impl Signer for EdgeGrid {
//! #     fn host(&self) -> &str { "akab-xxxx.luna.akamaiapis.net" }
//! #     fn sign(&self, _request: &mut reqwest::Request) {}
//! # }
//! # fn load_edgerc(_path: &Path, _section: &str) -> Result<EdgeGrid, std::io::Error> { Ok(EdgeGrid) }
//! #[derive(Deserialize)]
//! struct Purge {
//!     #[serde(rename = "purgeId")]
//!     purge_id: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), edgecall::Error> {
//!     // Ten attempts, five seconds apart, 30s timeout per attempt.
//!     let executor = Executor::builder(load_edgerc).build()?;
//!
//!     let request = RequestConfig::post("~/.edgerc", "ccu", "/ccu/v3/invalidate/url/production")
//!         .with_body(json!({ "objects": ["https://www.example.com/"] }));
//!
//!     let response = executor.execute::<_, Purge>(&request).await?;
//!     match response.body {
//!         Some(purge) => println!("purge {} queued", purge.purge_id),
//!         None => eprintln!("gave up after {:?}", response.status_codes),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Failures
//!
//! Transport errors, unreadable bodies and any status other than 200 are
//! retried and recorded on the [`ApiResponse`]. Only problems retrying cannot
//! fix are returned as [`Error`]: the signer failing to load, a body that does
//! not serialize, a request that cannot be built, or a 200 body that does not
//! decode.
//!
//! ## Cancellation
//!
//! Calls are futures. Dropping one, for example through `tokio::time::timeout`
//! or `tokio::select!`, stops it at the next await point, including while it
//! waits between attempts.

mod error;
mod executor;
mod request;
mod response;
pub mod retry;
mod signer;

pub use error::{BoxError, Error, Result};
pub use executor::{Executor, ExecutorBuilder, DEFAULT_TIMEOUT};
pub use request::RequestConfig;
pub use response::{ApiResponse, TRANSPORT_FAILURE_STATUS};
pub use retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};
pub use signer::{Signer, SignerProvider};
