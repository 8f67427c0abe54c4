//! The manifest tree and its resolver.
//!
//! A manifest resource is resolved into named specifications, included
//! sub-manifests, and leaf test cases. Sibling references are resolved
//! concurrently and joined with order-preserving combinators, so the
//! resulting sequences always reflect declaration order no matter which
//! resolution finishes first. Entries that fail to resolve into a valid
//! test case are dropped, never propagated: a manifest's test count may
//! be smaller than its declared entry count.

use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, join_all, try_join_all};
use indexmap::IndexMap;
use oxigraph::model::{Term, vocab::rdfs};
use serde::Serialize;

use crate::error::{Result, SuiteError};
use crate::fetch::Fetcher;
use crate::graph::{ManifestGraph, Resource, vocab};
use crate::mock::MockContextFactory;
use crate::testcase::{HandlerRegistry, RunnableTest};

/// Everything resolution needs, constructed once per run and passed by
/// reference down the tree.
pub struct ResolveContext {
    pub fetcher: Arc<Fetcher>,
    pub factory: MockContextFactory,
    pub handlers: Arc<HandlerRegistry>,
}

/// A resolved node of the test tree. Immutable once constructed.
pub struct Manifest {
    pub uri: String,
    pub label: Option<String>,
    pub comment: Option<String>,
    /// Named sub-specifications execution can be scoped to.
    pub specifications: Option<IndexMap<String, Manifest>>,
    /// Included sub-manifests, in declaration order.
    pub sub_manifests: Vec<Manifest>,
    /// Resolved leaf test cases, in declaration order.
    pub test_entries: Vec<Box<dyn RunnableTest>>,
}

impl Manifest {
    /// Number of test entries in this manifest and all sub-manifests.
    pub fn test_count(&self) -> usize {
        self.test_entries.len()
            + self
                .sub_manifests
                .iter()
                .map(Manifest::test_count)
                .sum::<usize>()
    }

    pub fn summary(&self) -> ManifestSummary {
        ManifestSummary {
            uri: self.uri.clone(),
            label: self.label.clone(),
            comment: self.comment.clone(),
            specifications: self.specifications.as_ref().map(|specs| {
                specs
                    .iter()
                    .map(|(name, manifest)| (name.clone(), manifest.summary()))
                    .collect()
            }),
            sub_manifests: self.sub_manifests.iter().map(Manifest::summary).collect(),
            test_entries: self
                .test_entries
                .iter()
                .map(|test| TestEntrySummary {
                    uri: test.uri().to_string(),
                    name: test.name().map(str::to_string),
                })
                .collect(),
        }
    }
}

impl fmt::Debug for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manifest")
            .field("uri", &self.uri)
            .field("label", &self.label)
            .field(
                "specifications",
                &self
                    .specifications
                    .as_ref()
                    .map(|s| s.keys().collect::<Vec<_>>()),
            )
            .field("sub_manifests", &self.sub_manifests.len())
            .field("test_entries", &self.test_entries.len())
            .finish()
    }
}

/// Serializable view of a resolved tree, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestSummary {
    pub uri: String,
    pub label: Option<String>,
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specifications: Option<IndexMap<String, ManifestSummary>>,
    pub sub_manifests: Vec<ManifestSummary>,
    pub test_entries: Vec<TestEntrySummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestEntrySummary {
    pub uri: String,
    pub name: Option<String>,
}

/// Recursively resolve a manifest resource into a [`Manifest`] tree.
///
/// Fails only when the resource graph itself cannot be retrieved or
/// traversed; malformed individual entries degrade to dropped entries.
pub fn resolve_manifest<'a>(
    resource: &'a Resource,
    ctx: &'a ResolveContext,
) -> BoxFuture<'a, Result<Manifest>> {
    Box::pin(async move {
        let resource = dereference_if_opaque(resource, ctx).await?;
        let resource = &resource;
        let uri = resource.value();
        tracing::debug!(manifest = %uri, "resolving manifest");

        let specifications = match resource
            .property(vocab::MF_SPECIFICATIONS)
            .and_then(|head| head.list())
        {
            None => None,
            Some(spec_resources) => {
                let named = spec_resources.iter().map(|spec| async move {
                    let manifest = resolve_manifest(spec, ctx).await?;
                    Ok::<_, SuiteError>((spec.value(), manifest))
                });
                Some(
                    try_join_all(named)
                        .await?
                        .into_iter()
                        .collect::<IndexMap<_, _>>(),
                )
            }
        };

        // A resource may declare several include lists; flatten them in
        // declaration order before fanning out.
        let sub_resources: Vec<Resource> = resource
            .properties(vocab::MF_INCLUDE)
            .into_iter()
            .filter_map(|head| head.list())
            .flatten()
            .collect();
        let sub_manifests = try_join_all(
            sub_resources
                .iter()
                .map(|sub| resolve_manifest(sub, ctx)),
        )
        .await?;

        let entry_resources: Vec<Resource> = resource
            .properties(vocab::MF_ENTRIES)
            .into_iter()
            .filter_map(|head| head.list())
            .flatten()
            .collect();
        let built = join_all(
            entry_resources
                .iter()
                .map(|entry| build_entry(entry, ctx)),
        )
        .await;
        let mut test_entries = Vec::new();
        for (outcome, entry) in built.into_iter().zip(&entry_resources) {
            match outcome {
                Ok(Some(test)) => test_entries.push(test),
                Ok(None) => {
                    tracing::debug!(entry = %entry.value(), "no handler for test entry type, skipping")
                }
                Err(error) => {
                    tracing::warn!(entry = %entry.value(), %error, "dropping test entry that failed to resolve")
                }
            }
        }

        Ok(Manifest {
            uri,
            label: resource.property(rdfs::LABEL).map(|r| r.value()),
            comment: resource.property(rdfs::COMMENT).map(|r| r.value()),
            specifications,
            sub_manifests,
            test_entries,
        })
    })
}

/// A manifest referenced from another document carries no triples in the
/// referencing graph; fetch its own document and continue there.
async fn dereference_if_opaque(resource: &Resource, ctx: &ResolveContext) -> Result<Resource> {
    let iri = match resource.term() {
        Term::NamedNode(node) => node.as_str().to_string(),
        _ => return Ok(resource.clone()),
    };
    if resource.is_described() {
        return Ok(resource.clone());
    }

    let document_locator = match iri.split_once('#') {
        Some((document, _)) => document.to_string(),
        None => iri.clone(),
    };
    tracing::debug!(manifest = %iri, document = %document_locator, "dereferencing manifest document");
    let graph = ManifestGraph::load(&document_locator, &ctx.fetcher).await?;
    let referenced = graph.resource(&iri)?;
    if referenced.is_described() {
        Ok(referenced)
    } else {
        graph.root_manifest(&iri)
    }
}

async fn build_entry(
    resource: &Resource,
    ctx: &ResolveContext,
) -> Result<Option<Box<dyn RunnableTest>>> {
    let types = resource.types();
    let Some(handler) = ctx.handlers.handler_for(&types) else {
        return Ok(None);
    };
    let test = handler.build(resource, &ctx.factory, &ctx.fetcher).await?;
    Ok(Some(test))
}
