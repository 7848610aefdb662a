use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, USER_AGENT};

use crate::error::{Error, Result};

/// Media type of SPARQL 1.1 JSON results
pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Build the headers sent with every SPARQL request
///
/// The Wikimedia endpoints reject anonymous clients, so the user agent must
/// identify the tool and a contact.
///
/// # Examples
///
/// ```
/// use wikilabel::endpoint::headers::build_sparql_headers;
///
/// let headers = build_sparql_headers("wikilabel/0.1 (someone@example.org)").unwrap();
/// assert!(headers.contains_key("user-agent"));
/// ```
pub fn build_sparql_headers(user_agent: &str) -> Result<HeaderMap> {
    if user_agent.trim().is_empty() {
        return Err(Error::config("endpoint.user_agent", "must not be empty"));
    }

    let mut headers = HeaderMap::new();

    let agent = HeaderValue::from_str(user_agent)
        .map_err(|e| Error::config("endpoint.user_agent", e.to_string()))?;
    headers.insert(USER_AGENT, agent);
    headers.insert(ACCEPT, HeaderValue::from_static(SPARQL_RESULTS_JSON));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

    Ok(headers)
}
