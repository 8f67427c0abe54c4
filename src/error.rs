//! Error taxonomy for manifest resolution, test construction, evaluation
//! and fixture replay.
//!
//! Failures stay local to the smallest enclosing unit: a construction
//! error aborts one test entry (the resolver drops it), an evaluation
//! error fails one test case, and only resource-graph level failures are
//! fatal to a whole run.

use thiserror::Error;

pub type Result<T, E = SuiteError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SuiteError {
    // Test case construction
    #[error("test entry {0} has no action")]
    MissingAction(String),

    #[error("action of test entry {0} has no query")]
    MissingQuery(String),

    #[error("query of test entry {0} dereferenced to an empty document")]
    EmptyQuery(String),

    #[error("test entry {0} has no expected result")]
    MissingResult(String),

    #[error("test entry {0} declares no data sources")]
    MissingDataSources(String),

    #[error("a data source of test entry {0} lacks a source or sourceType")]
    MalformedDataSource(String),

    // Test case evaluation
    #[error("test entry {0} has no result source to validate against")]
    MissingResultSource(String),

    #[error("unrecognized source kind {kind} on test entry {uri}")]
    UnrecognizedSourceKind { uri: String, kind: String },

    #[error("query of test entry {uri} failed to parse: {cause}")]
    QueryParse { uri: String, cause: String },

    #[error("query of test entry {uri} failed to execute: {cause}")]
    QueryExecution { uri: String, cause: String },

    #[error(
        "result mismatch for test entry {uri}: engine returned {actual} quad(s), expected {expected} quad(s) up to blank-node relabeling"
    )]
    ResultMismatch {
        uri: String,
        expected: usize,
        actual: usize,
    },

    // Fixture replay
    #[error("mocked response header line has no separator: {0:?}")]
    MalformedFixtureHeader(String),

    #[error("mocked response {0} is shorter than its three header lines")]
    TruncatedFixture(String),

    // Documents and resource graphs
    #[error("failed to fetch {locator}: {cause}")]
    Fetch { locator: String, cause: String },

    #[error("cannot parse {locator} as RDF: {cause}")]
    RdfSyntax { locator: String, cause: String },

    #[error("manifest resource {0} could not be resolved")]
    UnresolvableManifest(String),

    // Configuration
    #[error("invalid locator mapping {0:?}, expected URL~PATH")]
    InvalidMapping(String),

    #[error("invalid test filter pattern: {0}")]
    InvalidFilter(String),

    #[error("injected arguments must be a JSON object: {0}")]
    InvalidInjectedArgs(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SuiteError {
    /// Fetch failure with the offending locator attached.
    pub fn fetch(locator: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        SuiteError::Fetch {
            locator: locator.into(),
            cause: cause.to_string(),
        }
    }
}
