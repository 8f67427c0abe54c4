use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::fetch::{FetchedDocument, Fetcher};
use crate::mock::fetcher::resolve_mocked_response;
use crate::testcase::ldf::LdfTestCase;

/// Built once per suite run; hands each test case the mocking binding
/// its evaluation should use, so the fixture resolver never has to know
/// about individual test cases.
#[derive(Clone)]
pub struct MockContextFactory {
    timeout: Duration,
    fetcher: Arc<Fetcher>,
}

impl MockContextFactory {
    pub fn new(timeout_ms: u64, fetcher: Arc<Fetcher>) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            fetcher,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The per-test binding: fixture replay when the test declares a
    /// fixture folder, live pass-through otherwise.
    pub fn context_for(&self, test_case: &LdfTestCase) -> MockContext {
        MockContext {
            timeout: self.timeout,
            mock_folder: test_case.mock_folder.clone(),
            fetcher: self.fetcher.clone(),
        }
    }
}

/// What the engine's network layer consults instead of issuing live
/// requests.
#[derive(Clone)]
pub struct MockContext {
    timeout: Duration,
    mock_folder: Option<String>,
    fetcher: Arc<Fetcher>,
}

impl MockContext {
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_mocked(&self) -> bool {
        self.mock_folder.is_some()
    }

    /// Answer a request the engine issues during evaluation.
    pub async fn fetch(&self, iri: &str, accept_header: &str) -> Result<FetchedDocument> {
        match &self.mock_folder {
            Some(folder) => {
                tracing::debug!(iri = %iri, folder = %folder, "replaying recorded response");
                let response =
                    resolve_mocked_response(&self.fetcher, folder, iri, accept_header).await?;
                Ok(FetchedDocument {
                    body: response.body,
                    content_type: Some(response.content_type),
                    locator: iri.to_string(),
                })
            }
            None => {
                self.fetcher
                    .fetch_with_accept(iri, Some(accept_header))
                    .await
            }
        }
    }
}
