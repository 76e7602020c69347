//! Failure taxonomy for one scrape attempt.
//!
//! Every variant is transient from the caller's point of view: the
//! orchestrator turns any of them into a `source: "error"` result and never
//! lets them reach the HTTP layer.

use reqwest::StatusCode;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { status: StatusCode, url: String },
    #[error("navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },
    #[error("content marker `{marker}` not seen within {timeout:?}")]
    ContentTimeout { marker: String, timeout: Duration },
    #[error("content marker `{marker}` missing from {url}")]
    ContentMarkerMissing { marker: String, url: String },
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid selector `{0}`")]
    Selector(String),
    #[error("no page loaded; navigate first")]
    NotNavigated,
    #[error("extraction failed: {0}")]
    Extraction(String),
    #[error("scrape task aborted: {0}")]
    Aborted(String),
}
