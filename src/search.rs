//! Browser hand-off for "search the web" requests.

use thiserror::Error;
use tracing::info;
use url::form_urlencoded;

const SEARCH_ENDPOINT: &str = "https://www.google.com/search?q=";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search prompt is empty")]
    EmptyPrompt,
    #[error("failed to open browser: {0}")]
    Launch(#[from] std::io::Error),
}

/// Spaces become `+`, everything outside the unreserved set is percent-encoded.
pub fn search_url(prefix: &str, prompt: &str) -> String {
    let query = [prefix.trim(), prompt.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
    format!("{SEARCH_ENDPOINT}{encoded}")
}

/// Opens the search in the default browser and returns the URL that was opened.
pub fn open_search(prefix: &str, prompt: &str) -> Result<String, SearchError> {
    if prompt.trim().is_empty() {
        return Err(SearchError::EmptyPrompt);
    }
    let url = search_url(prefix, prompt);
    info!(%url, "opening web search");
    open::that(&url)?;
    Ok(url)
}
