//! The LDF query evaluation test case: built from one manifest entry,
//! evaluated by handing the engine the query and its declared sources
//! and comparing the returned quads against the recorded expectation.

use std::sync::Arc;

use async_trait::async_trait;
use oxigraph::model::Dataset;

use crate::config::SuiteConfig;
use crate::error::{Result, SuiteError};
use crate::fetch::{FetchedDocument, Fetcher};
use crate::graph::{Resource, isomorphic, parse_quads, vocab};
use crate::mock::MockContextFactory;
use crate::testcase::{
    DataSource, QueryEngine, QueryOptions, RunnableTest, TestCaseHandler,
};

pub struct LdfTestCase {
    uri: String,
    name: Option<String>,
    comment: Option<String>,
    /// Dereferenced text of the action's query.
    pub query_string: String,
    /// Declared sources, in declaration order. Never empty.
    pub data_sources: Vec<DataSource>,
    /// Expected result quads. `None` only when evaluation is expected to
    /// fail.
    pub query_result: Option<Dataset>,
    /// The raw fetched result, kept to re-validate that an expectation
    /// was actually obtained.
    pub result_source: Option<FetchedDocument>,
    /// Fixture folder answering the engine's requests during evaluation.
    pub mock_folder: Option<String>,
    factory: MockContextFactory,
}

/// Raw parts of an [`LdfTestCase`], for callers assembling one without a
/// manifest resource.
pub struct LdfTestCaseProps {
    pub query_string: String,
    pub data_sources: Vec<DataSource>,
    pub query_result: Option<Dataset>,
    pub result_source: Option<FetchedDocument>,
    pub mock_folder: Option<String>,
}

impl LdfTestCase {
    pub fn new(uri: impl Into<String>, props: LdfTestCaseProps, factory: MockContextFactory) -> Self {
        Self {
            uri: uri.into(),
            name: None,
            comment: None,
            query_string: props.query_string,
            data_sources: props.data_sources,
            query_result: props.query_result,
            result_source: props.result_source,
            mock_folder: props.mock_folder,
            factory,
        }
    }

    /// Build a test case from a manifest-entry resource. Fails when the
    /// entry lacks an action, a query, a result, or data sources, or
    /// when the expected result cannot be fetched and parsed.
    pub async fn from_resource(
        resource: &Resource,
        factory: &MockContextFactory,
        fetcher: &Arc<Fetcher>,
    ) -> Result<Self> {
        let uri = resource.value();

        let action = resource
            .property(vocab::MF_ACTION)
            .ok_or_else(|| SuiteError::MissingAction(uri.clone()))?;
        let query_locator = action
            .property(vocab::QT_QUERY)
            .ok_or_else(|| SuiteError::MissingQuery(uri.clone()))?
            .value();
        let result_locator = resource
            .property(vocab::MF_RESULT)
            .ok_or_else(|| SuiteError::MissingResult(uri.clone()))?
            .value();

        let source_resources = resource
            .property(vocab::ET_DATA_SOURCES)
            .and_then(|head| head.list())
            .unwrap_or_default();
        if source_resources.is_empty() {
            return Err(SuiteError::MissingDataSources(uri));
        }
        let mut data_sources = Vec::with_capacity(source_resources.len());
        for source in &source_resources {
            let kind = source
                .property(vocab::ET_SOURCE_TYPE)
                .ok_or_else(|| SuiteError::MalformedDataSource(uri.clone()))?
                .value();
            let value = source
                .property(vocab::ET_SOURCE)
                .ok_or_else(|| SuiteError::MalformedDataSource(uri.clone()))?
                .value();
            data_sources.push(DataSource { kind, value });
        }

        let (query_document, result_document) =
            tokio::try_join!(fetcher.fetch(&query_locator), fetcher.fetch(&result_locator))?;

        let query_string = query_document.body;
        if query_string.trim().is_empty() {
            return Err(SuiteError::EmptyQuery(uri));
        }
        let expected = parse_quads(
            &result_document.body,
            result_document.content_type.as_deref(),
            &result_document.locator,
        )?;

        Ok(Self {
            uri,
            name: resource.property(vocab::MF_NAME).map(|r| r.value()),
            comment: resource
                .property(oxigraph::model::vocab::rdfs::COMMENT)
                .map(|r| r.value()),
            query_string,
            data_sources,
            query_result: Some(expected),
            result_source: Some(result_document),
            mock_folder: action.property(vocab::ET_MOCK_FOLDER).map(|r| r.value()),
            factory: factory.clone(),
        })
    }
}

#[async_trait]
impl RunnableTest for LdfTestCase {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    async fn test(&self, engine: &dyn QueryEngine, config: &SuiteConfig) -> Result<()> {
        if self.result_source.is_none() {
            return Err(SuiteError::MissingResultSource(self.uri.clone()));
        }

        // Source kinds are validated here, not at build time, and an
        // unrecognized kind fails before the engine ever runs.
        for source in &self.data_sources {
            if source.source_kind().is_none() {
                return Err(SuiteError::UnrecognizedSourceKind {
                    uri: self.uri.clone(),
                    kind: source.kind.clone(),
                });
            }
        }

        let expected = self
            .query_result
            .as_ref()
            .ok_or_else(|| SuiteError::MissingResultSource(self.uri.clone()))?;

        let options = QueryOptions {
            sources: self.data_sources.clone(),
            context: self.factory.context_for(self),
            injected_args: config.injected_args.clone(),
        };

        engine
            .parse(&self.query_string, &options)
            .await
            .map_err(|e| SuiteError::QueryParse {
                uri: self.uri.clone(),
                cause: e.to_string(),
            })?;

        let actual = engine
            .query(&self.query_string, &options)
            .await
            .map_err(|e| SuiteError::QueryExecution {
                uri: self.uri.clone(),
                cause: e.to_string(),
            })?;

        if !isomorphic(&actual, expected) {
            return Err(SuiteError::ResultMismatch {
                uri: self.uri.clone(),
                expected: expected.len(),
                actual: actual.len(),
            });
        }
        Ok(())
    }
}

/// Handler for `et:LdfQueryEvaluationTest` entries.
pub struct LdfTestCaseHandler;

#[async_trait]
impl TestCaseHandler for LdfTestCaseHandler {
    async fn build(
        &self,
        resource: &Resource,
        factory: &MockContextFactory,
        fetcher: &Arc<Fetcher>,
    ) -> Result<Box<dyn RunnableTest>> {
        let test_case = LdfTestCase::from_resource(resource, factory, fetcher).await?;
        Ok(Box::new(test_case))
    }
}
