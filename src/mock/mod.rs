//! Deterministic replay of recorded responses.
//!
//! A test case that carries a fixture folder has every network request
//! the engine issues answered from pre-recorded files instead of a live
//! endpoint; without one, requests pass through to the live fetch layer.

mod context;
mod fetcher;

pub use context::{MockContext, MockContextFactory};
pub use fetcher::{
    MockedResponse, SPARQL_RESULTS_JSON, mocked_file_locator, resolve_mocked_response,
};
