//! Locating and parsing recorded response fixtures.
//!
//! A fixture file is named by the SHA-1 digest of the URI-decoded
//! requested identifier, with an extension chosen by the request's
//! Accept header, and starts with three `# Key: Value` header lines
//! followed by the verbatim response body:
//!
//! ```text
//! # Query: <original query text>
//! # Hashed IRI: <original requested identifier>
//! # Content-type: <media type>
//! <body...>
//! ```

use std::collections::HashMap;

use crate::error::{Result, SuiteError};
use crate::fetch::Fetcher;
use crate::utils::sha1_hex;

pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

const HEADER_LINES: usize = 3;

/// A recorded response, parsed once per resolution call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockedResponse {
    pub query: String,
    pub iri: String,
    pub content_type: String,
    pub body: String,
}

/// The fixture locator for a request: same identifier and accept header
/// in, same locator out, on every call.
pub fn mocked_file_locator(
    mock_folder: &str,
    requested_iri: &str,
    accept_header: &str,
) -> Result<String> {
    let decoded = urlencoding::decode(requested_iri)
        .map_err(|e| SuiteError::fetch(requested_iri, e))?;
    let extension = extension_for_accept(accept_header);
    Ok(format!(
        "{}/{}{}",
        mock_folder.trim_end_matches('/'),
        sha1_hex(&decoded),
        extension
    ))
}

fn extension_for_accept(accept_header: &str) -> &'static str {
    match accept_header {
        SPARQL_RESULTS_JSON => ".srj",
        _ => ".ttl",
    }
}

/// Fetch and parse the fixture recorded for a request. One fetch, one
/// parse; no retry, no caching.
pub async fn resolve_mocked_response(
    fetcher: &Fetcher,
    mock_folder: &str,
    requested_iri: &str,
    accept_header: &str,
) -> Result<MockedResponse> {
    let locator = mocked_file_locator(mock_folder, requested_iri, accept_header)?;
    let document = fetcher.fetch(&locator).await?;
    parse_mocked_response(&document.body, &locator)
}

fn parse_mocked_response(raw: &str, locator: &str) -> Result<MockedResponse> {
    let lines: Vec<&str> = raw.split('\n').collect();
    if lines.len() < HEADER_LINES {
        return Err(SuiteError::TruncatedFixture(locator.to_string()));
    }

    let mut headers = HashMap::new();
    for line in &lines[..HEADER_LINES] {
        let (key, value) = parse_header_line(line)?;
        headers.insert(key, value);
    }

    Ok(MockedResponse {
        query: headers.remove("Query").unwrap_or_default(),
        iri: headers.remove("Hashed IRI").unwrap_or_default(),
        content_type: headers.remove("Content-type").unwrap_or_default(),
        body: lines[HEADER_LINES..].join("\n"),
    })
}

fn parse_header_line(line: &str) -> Result<(String, String)> {
    // Header lines look like `# Key: Value`; strip the comment marker
    // before splitting on the first colon.
    let stripped = line.get(2..).unwrap_or_default();
    let separator = stripped
        .find(':')
        .ok_or_else(|| SuiteError::MalformedFixtureHeader(line.to_string()))?;
    Ok((
        stripped[..separator].trim().to_string(),
        stripped[separator + 1..].trim().to_string(),
    ))
}
