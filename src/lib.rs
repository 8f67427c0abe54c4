//! Harness for running LDF query-engine test manifests.
//!
//! A manifest is a declarative RDF tree of named specifications,
//! included sub-manifests, and leaf test cases. This crate resolves such
//! a tree, builds a runnable test case per entry, evaluates each case
//! against a caller-supplied [`QueryEngine`], and replays recorded
//! response fixtures for any request the engine issues during
//! evaluation, so runs are reproducible without a live data source.

pub mod config;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod logging;
pub mod manifest;
pub mod mock;
pub mod runner;
pub mod testcase;
pub mod utils;

pub use config::{CliArgs, LocatorMapping, SuiteConfig};
pub use error::SuiteError;
pub use fetch::{FetchedDocument, Fetcher};
pub use manifest::{Manifest, ManifestSummary, ResolveContext, resolve_manifest};
pub use mock::{MockContext, MockContextFactory, MockedResponse, resolve_mocked_response};
pub use runner::{TestOutcome, execute_tree, load_manifest, run_manifest};
pub use testcase::{
    DataSource, HandlerRegistry, QueryEngine, QueryOptions, RunnableTest, SourceKind,
    TestCaseHandler,
};
