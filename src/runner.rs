//! Loading and running a whole suite: resolve the manifest tree behind a
//! locator, optionally scope it to one named specification, walk it
//! against the engine under test, and aggregate per-test outcomes.

use std::sync::Arc;
use std::time::Instant;

use futures::future::BoxFuture;
use serde::Serialize;

use crate::config::SuiteConfig;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::graph::ManifestGraph;
use crate::manifest::{Manifest, ResolveContext, resolve_manifest};
use crate::mock::MockContextFactory;
use crate::testcase::{HandlerRegistry, QueryEngine};

/// The outcome of one test case evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    pub uri: String,
    pub name: Option<String>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Resolve the manifest tree behind a locator.
pub async fn load_manifest(locator: &str, config: &SuiteConfig) -> Result<Manifest> {
    let fetcher = Arc::new(Fetcher::new(
        config.mappings.clone(),
        config.cache_dir.clone(),
    )?);
    let factory = MockContextFactory::new(config.timeout_ms, fetcher.clone());
    let ctx = ResolveContext {
        fetcher: fetcher.clone(),
        factory,
        handlers: Arc::new(HandlerRegistry::with_defaults()),
    };

    let graph = ManifestGraph::load(locator, &fetcher).await?;
    let root = graph.root_manifest(locator)?;
    let manifest = resolve_manifest(&root, &ctx).await?;
    tracing::info!(
        manifest = %manifest.uri,
        tests = manifest.test_count(),
        "manifest resolved"
    );
    Ok(manifest)
}

/// Run the manifest behind a locator against an engine and return the
/// aggregated outcomes.
///
/// Scoping to a specification the manifest does not declare yields an
/// empty outcome sequence, not an error.
pub async fn run_manifest(
    locator: &str,
    engine: &dyn QueryEngine,
    config: &SuiteConfig,
) -> Result<Vec<TestOutcome>> {
    let manifest = load_manifest(locator, config).await?;

    let scoped = match &config.specification {
        None => &manifest,
        Some(name) => match manifest
            .specifications
            .as_ref()
            .and_then(|specs| specs.get(name))
        {
            Some(scoped) => scoped,
            None => {
                tracing::info!(specification = %name, "specification absent from manifest, nothing to run");
                return Ok(Vec::new());
            }
        },
    };

    Ok(execute_tree(scoped, engine, config).await)
}

/// Walk a resolved tree depth-first, evaluating every test entry whose
/// IRI passes the configured filter. One entry's failure never aborts
/// its siblings.
pub fn execute_tree<'a>(
    manifest: &'a Manifest,
    engine: &'a dyn QueryEngine,
    config: &'a SuiteConfig,
) -> BoxFuture<'a, Vec<TestOutcome>> {
    Box::pin(async move {
        let mut outcomes = Vec::new();

        for entry in &manifest.test_entries {
            if let Some(filter) = &config.test_filter {
                if !filter.is_match(entry.uri()) {
                    tracing::debug!(test = %entry.uri(), "filtered out");
                    continue;
                }
            }

            let started = Instant::now();
            let result = entry.test(engine, config).await;
            let duration_ms = started.elapsed().as_millis() as u64;
            match result {
                Ok(()) => {
                    tracing::debug!(test = %entry.uri(), duration_ms, "test passed");
                    outcomes.push(TestOutcome {
                        uri: entry.uri().to_string(),
                        name: entry.name().map(str::to_string),
                        ok: true,
                        error: None,
                        duration_ms,
                    });
                }
                Err(error) => {
                    tracing::debug!(test = %entry.uri(), duration_ms, %error, "test failed");
                    outcomes.push(TestOutcome {
                        uri: entry.uri().to_string(),
                        name: entry.name().map(str::to_string),
                        ok: false,
                        error: Some(error.to_string()),
                        duration_ms,
                    });
                }
            }
        }

        for sub in &manifest.sub_manifests {
            outcomes.extend(execute_tree(sub, engine, config).await);
        }

        outcomes
    })
}
