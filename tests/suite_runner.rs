//! End-to-end runs: manifest on disk, engine stub, aggregated outcomes.

mod harness;

use std::path::Path;

use async_trait::async_trait;
use oxigraph::model::Dataset;
use regex::Regex;

use ldf_test_suite::config::SuiteConfig;
use ldf_test_suite::graph::parse_quads;
use ldf_test_suite::mock::mocked_file_locator;
use ldf_test_suite::runner::run_manifest;
use ldf_test_suite::testcase::{QueryEngine, QueryOptions};

use harness::{PREFIXES, StubEngine, write_scenario_documents};

/// Engine that answers queries by fetching its single source through the
/// test's network binding, so fixture replay is exercised end to end.
struct ReplayEngine;

#[async_trait]
impl QueryEngine for ReplayEngine {
    async fn parse(&self, _query: &str, _options: &QueryOptions) -> anyhow::Result<()> {
        Ok(())
    }

    async fn query(&self, _query: &str, options: &QueryOptions) -> anyhow::Result<Dataset> {
        let source = &options.sources[0];
        let document = options.context.fetch(&source.value, "text/turtle").await?;
        Ok(parse_quads(
            &document.body,
            document.content_type.as_deref(),
            &document.locator,
        )?)
    }
}

fn write_root_manifest(dir: &Path) -> String {
    write_scenario_documents(dir);
    let action = dir.join("ACTION.ok");
    let result_ok = dir.join("RESULT.ttl");
    let result_other = dir.join("RESULT_other.ttl");
    let manifest_path = dir.join("manifest.ttl");
    std::fs::write(
        &manifest_path,
        format!(
            "{PREFIXES}\
             <> a mf:Manifest ;\n\
               rdfs:label \"Root\" ;\n\
               mf:entries ( <urn:test:case-1> <urn:test:case-2> ) .\n\
             <urn:test:case-1> a et:LdfQueryEvaluationTest ;\n\
               mf:name \"passes\" ;\n\
               mf:action [ qt:query \"{action}\" ] ;\n\
               mf:result \"{result_ok}\" ;\n\
               et:dataSources ( [ et:source \"http://ex2.org\" ; et:sourceType et:TPF ] ) .\n\
             <urn:test:case-2> a et:LdfQueryEvaluationTest ;\n\
               mf:name \"mismatches\" ;\n\
               mf:action [ qt:query \"{action}\" ] ;\n\
               mf:result \"{result_other}\" ;\n\
               et:dataSources ( [ et:source \"http://ex2.org\" ; et:sourceType et:File ] ) .\n",
            action = action.display(),
            result_ok = result_ok.display(),
            result_other = result_other.display(),
        ),
    )
    .unwrap();
    manifest_path.to_str().unwrap().to_string()
}

#[tokio::test]
async fn runs_every_entry_and_keeps_going_past_failures() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_root_manifest(dir.path());

    let outcomes = run_manifest(&manifest, &StubEngine, &SuiteConfig::default())
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].uri, "urn:test:case-1");
    assert!(outcomes[0].ok);
    assert!(outcomes[0].error.is_none());
    assert_eq!(outcomes[1].uri, "urn:test:case-2");
    assert!(!outcomes[1].ok);
    assert!(outcomes[1].error.as_deref().unwrap().contains("mismatch"));
}

#[tokio::test]
async fn filter_scopes_execution_to_matching_test_iris() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_root_manifest(dir.path());

    let config = SuiteConfig {
        test_filter: Some(Regex::new("case-1$").unwrap()),
        ..SuiteConfig::default()
    };
    let outcomes = run_manifest(&manifest, &StubEngine, &config).await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].uri, "urn:test:case-1");
}

#[tokio::test]
async fn unknown_specification_yields_no_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_root_manifest(dir.path());

    let config = SuiteConfig {
        specification: Some("urn:spec:absent".to_string()),
        ..SuiteConfig::default()
    };
    let outcomes = run_manifest(&manifest, &StubEngine, &config).await.unwrap();
    assert!(outcomes.is_empty());
}

#[tokio::test]
async fn scoping_to_a_declared_specification_runs_its_subtree_only() {
    let dir = tempfile::tempdir().unwrap();
    write_scenario_documents(dir.path());
    let action = dir.path().join("ACTION.ok");
    let result = dir.path().join("RESULT.ttl");
    let manifest_path = dir.path().join("manifest.ttl");
    std::fs::write(
        &manifest_path,
        format!(
            "{PREFIXES}\
             <> a mf:Manifest ;\n\
               mf:specifications ( <urn:spec:sparql> ) ;\n\
               mf:entries ( <urn:test:outside> ) .\n\
             <urn:spec:sparql> mf:entries ( <urn:test:inside> ) .\n\
             <urn:test:inside> a et:LdfQueryEvaluationTest ;\n\
               mf:action [ qt:query \"{action}\" ] ;\n\
               mf:result \"{result}\" ;\n\
               et:dataSources ( [ et:source \"http://ex2.org\" ; et:sourceType et:TPF ] ) .\n\
             <urn:test:outside> a et:LdfQueryEvaluationTest ;\n\
               mf:action [ qt:query \"{action}\" ] ;\n\
               mf:result \"{result}\" ;\n\
               et:dataSources ( [ et:source \"http://ex2.org\" ; et:sourceType et:TPF ] ) .\n",
            action = action.display(),
            result = result.display(),
        ),
    )
    .unwrap();

    let config = SuiteConfig {
        specification: Some("urn:spec:sparql".to_string()),
        ..SuiteConfig::default()
    };
    let outcomes = run_manifest(
        manifest_path.to_str().unwrap(),
        &StubEngine,
        &config,
    )
    .await
    .unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].uri, "urn:test:inside");
}

#[tokio::test]
async fn fixture_replay_feeds_the_engine_during_evaluation() {
    let dir = tempfile::tempdir().unwrap();
    write_scenario_documents(dir.path());
    let action = dir.path().join("ACTION.ok");
    let result = dir.path().join("RESULT.ttl");

    // Record the response the engine should see for its data source.
    let mock_dir = dir.path().join("mocks");
    std::fs::create_dir(&mock_dir).unwrap();
    let mock_folder = mock_dir.to_str().unwrap().to_string();
    let fixture =
        mocked_file_locator(&mock_folder, "http://ex2.org", "text/turtle").unwrap();
    std::fs::write(
        &fixture,
        format!(
            "# Query: OK\n# Hashed IRI: http://ex2.org\n# Content-type: text/turtle\n{}",
            harness::EXPECTED_TTL
        ),
    )
    .unwrap();

    let manifest_path = dir.path().join("manifest.ttl");
    std::fs::write(
        &manifest_path,
        format!(
            "{PREFIXES}\
             <> a mf:Manifest ; mf:entries ( <urn:test:mocked> ) .\n\
             <urn:test:mocked> a et:LdfQueryEvaluationTest ;\n\
               mf:action [ qt:query \"{action}\" ; et:mockFolder \"{mock_folder}\" ] ;\n\
               mf:result \"{result}\" ;\n\
               et:dataSources ( [ et:source \"http://ex2.org\" ; et:sourceType et:TPF ] ) .\n",
            action = action.display(),
            result = result.display(),
        ),
    )
    .unwrap();

    let outcomes = run_manifest(
        manifest_path.to_str().unwrap(),
        &ReplayEngine,
        &SuiteConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].ok, "replayed fixture should satisfy the test: {:?}", outcomes[0].error);
}
