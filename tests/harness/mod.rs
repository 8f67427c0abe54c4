//! Shared pieces for the integration suites: a stub engine with fixed
//! behavior, on-disk test documents, and manifest-entry builders.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use oxigraph::model::Dataset;

use ldf_test_suite::fetch::{FetchedDocument, Fetcher};
use ldf_test_suite::graph::{ManifestGraph, Resource, parse_quads};
use ldf_test_suite::mock::MockContextFactory;
use ldf_test_suite::testcase::{QueryEngine, QueryOptions};

pub const MF: &str = "http://www.w3.org/2001/sw/DataAccess/tests/test-manifest#";
pub const QT: &str = "http://www.w3.org/2001/sw/DataAccess/tests/test-query#";
pub const ET: &str = "https://manudebuck.github.io/engine-ontology/engine-ontology.ttl#";

pub const EXPECTED_TTL: &str = r#"@prefix : <http://ex.org#> . :s1 :o1 "t1", "t2" ."#;
pub const OTHER_TTL: &str = r#"@prefix : <http://ex.org#> . :s1 :o1 "t1" ."#;

pub const PREFIXES: &str = concat!(
    "@prefix mf: <http://www.w3.org/2001/sw/DataAccess/tests/test-manifest#> .\n",
    "@prefix qt: <http://www.w3.org/2001/sw/DataAccess/tests/test-query#> .\n",
    "@prefix et: <https://manudebuck.github.io/engine-ontology/engine-ontology.ttl#> .\n",
    "@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n",
);

/// Quads every passing scenario expects the engine to return.
pub fn expected_quads() -> Dataset {
    parse_quads(EXPECTED_TTL, Some("text/turtle"), "urn:expected")
        .expect("expected fixture parses")
}

/// Write the action and result documents the scenarios dereference.
pub fn write_scenario_documents(dir: &Path) {
    std::fs::write(dir.join("ACTION.ok"), "OK").unwrap();
    std::fs::write(dir.join("ACTION.invalid"), "INVALID").unwrap();
    std::fs::write(dir.join("RESULT.ttl"), EXPECTED_TTL).unwrap();
    std::fs::write(dir.join("RESULT_other.ttl"), OTHER_TTL).unwrap();
}

/// Engine whose `parse` accepts exactly the query text `OK` and whose
/// `query` always returns the two expected quads.
pub struct StubEngine;

#[async_trait]
impl QueryEngine for StubEngine {
    async fn parse(&self, query: &str, _options: &QueryOptions) -> anyhow::Result<()> {
        if query == "OK" {
            Ok(())
        } else {
            Err(anyhow!("invalid data {query}"))
        }
    }

    async fn query(&self, _query: &str, _options: &QueryOptions) -> anyhow::Result<Dataset> {
        Ok(expected_quads())
    }
}

/// A manifest-entry document for `<urn:test:case>`, with the usual
/// shape: one action with a query (and optionally a fixture folder), a
/// result, and one data source.
pub fn entry_turtle(
    query_locator: &str,
    result_locator: &str,
    source_type: &str,
    mock_folder: Option<&str>,
) -> String {
    let mock = mock_folder
        .map(|folder| format!("; et:mockFolder \"{folder}\" "))
        .unwrap_or_default();
    format!(
        "{PREFIXES}\
         <urn:test:case> a et:LdfQueryEvaluationTest ;\n\
           mf:name \"Example test\" ;\n\
           mf:action [ qt:query \"{query_locator}\" {mock}] ;\n\
           mf:result \"{result_locator}\" ;\n\
           et:dataSources ( [ et:source \"http://ex2.org\" ; et:sourceType <{source_type}> ] ) .\n"
    )
}

/// Parse a document and hand back the `<urn:test:case>` resource.
pub fn entry_resource(turtle: &str) -> Resource {
    let graph = ManifestGraph::parse(&FetchedDocument {
        body: turtle.to_string(),
        content_type: Some("text/turtle".to_string()),
        locator: "urn:doc".to_string(),
    })
    .expect("test document parses");
    graph.resource("urn:test:case").expect("entry resource")
}

/// A fetcher without mappings or cache, and a factory with the default
/// test timeout.
pub fn test_context() -> (Arc<Fetcher>, MockContextFactory) {
    let fetcher = Arc::new(Fetcher::new(Vec::new(), None).expect("fetcher"));
    let factory = MockContextFactory::new(3000, fetcher.clone());
    (fetcher, factory)
}
