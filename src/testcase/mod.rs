//! Test cases and the seams they are built and evaluated through: the
//! handler registry that turns manifest entries into runnable tests, and
//! the engine interface evaluation drives.

pub mod ldf;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use oxigraph::model::Dataset;
use serde::Serialize;

use crate::config::SuiteConfig;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::graph::{Resource, vocab};
use crate::mock::{MockContext, MockContextFactory};

/// A declared data source of a test: an opaque `{kind, value}` pair the
/// engine is configured with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSource {
    /// Source kind IRI.
    pub kind: String,
    /// Endpoint URL or file path.
    pub value: String,
}

impl DataSource {
    /// The recognized kind of this source, if any. Validated lazily, at
    /// evaluation time.
    pub fn source_kind(&self) -> Option<SourceKind> {
        SourceKind::from_iri(&self.kind)
    }
}

/// The source kinds evaluation recognizes. Both flow to the engine as
/// opaque descriptors; the distinction is the engine's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    TriplePatternFragments,
    File,
}

impl SourceKind {
    pub fn from_iri(iri: &str) -> Option<Self> {
        if iri == vocab::ET_TPF {
            Some(SourceKind::TriplePatternFragments)
        } else if iri == vocab::ET_FILE {
            Some(SourceKind::File)
        } else {
            None
        }
    }
}

/// Everything an engine gets alongside the query text.
pub struct QueryOptions {
    pub sources: Vec<DataSource>,
    /// Network binding: recorded fixtures or live access.
    pub context: MockContext,
    /// Engine-specific arguments, forwarded untouched from the config.
    pub injected_args: serde_json::Map<String, serde_json::Value>,
}

/// The query engine under test.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Must accept the query before it is executed.
    async fn parse(&self, query: &str, options: &QueryOptions) -> anyhow::Result<()>;

    /// Execute the query over the configured sources and return the
    /// result quads.
    async fn query(&self, query: &str, options: &QueryOptions) -> anyhow::Result<Dataset>;
}

/// A leaf of the resolved manifest tree.
#[async_trait]
pub trait RunnableTest: Send + Sync {
    fn uri(&self) -> &str;
    fn name(&self) -> Option<&str>;
    fn comment(&self) -> Option<&str>;

    /// Evaluate against the engine; resolves iff the engine's output
    /// matches the recorded expectation.
    async fn test(&self, engine: &dyn QueryEngine, config: &SuiteConfig) -> Result<()>;
}

/// Builds a runnable test from a manifest-entry resource of a type it
/// handles.
#[async_trait]
pub trait TestCaseHandler: Send + Sync {
    async fn build(
        &self,
        resource: &Resource,
        factory: &MockContextFactory,
        fetcher: &Arc<Fetcher>,
    ) -> Result<Box<dyn RunnableTest>>;
}

/// Dispatch from declared test type to handler.
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn TestCaseHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            vocab::ET_LDF_QUERY_EVALUATION_TEST,
            Arc::new(ldf::LdfTestCaseHandler),
        );
        registry
    }

    pub fn register(&mut self, test_type: &str, handler: Arc<dyn TestCaseHandler>) {
        self.handlers.insert(test_type.to_string(), handler);
    }

    /// The handler for the first recognized type, if any.
    pub fn handler_for(&self, types: &[String]) -> Option<&Arc<dyn TestCaseHandler>> {
        types.iter().find_map(|t| self.handlers.get(t))
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
