//! Read-only view over a parsed RDF document.
//!
//! The resolver only ever asks a manifest document a handful of
//! questions: the value of a property, all values of a property, and the
//! members of an rdf list. `ManifestGraph`/`Resource` answer exactly
//! those, from the quad sequence in parse order — declaration order in
//! the document is what manifest semantics are defined over, and
//! set-backed stores do not preserve it.

use std::path::Path;
use std::sync::Arc;

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::dataset::CanonicalizationAlgorithm;
use oxigraph::model::{Dataset, NamedNode, Quad, Subject, Term, vocab::rdf};

use crate::error::{Result, SuiteError};
use crate::fetch::{FetchedDocument, Fetcher, locator_to_iri};

/// IRIs of the manifest vocabulary the resolver consumes.
pub mod vocab {
    use oxigraph::model::NamedNodeRef;

    pub const MF_MANIFEST: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/2001/sw/DataAccess/tests/test-manifest#Manifest",
    );
    pub const MF_ACTION: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/2001/sw/DataAccess/tests/test-manifest#action",
    );
    pub const MF_RESULT: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/2001/sw/DataAccess/tests/test-manifest#result",
    );
    pub const MF_NAME: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/2001/sw/DataAccess/tests/test-manifest#name",
    );
    pub const MF_INCLUDE: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/2001/sw/DataAccess/tests/test-manifest#include",
    );
    pub const MF_ENTRIES: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/2001/sw/DataAccess/tests/test-manifest#entries",
    );
    pub const MF_SPECIFICATIONS: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/2001/sw/DataAccess/tests/test-manifest#specifications",
    );
    pub const QT_QUERY: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
        "http://www.w3.org/2001/sw/DataAccess/tests/test-query#query",
    );
    pub const ET_DATA_SOURCES: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
        "https://manudebuck.github.io/engine-ontology/engine-ontology.ttl#dataSources",
    );
    pub const ET_SOURCE: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
        "https://manudebuck.github.io/engine-ontology/engine-ontology.ttl#source",
    );
    pub const ET_SOURCE_TYPE: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
        "https://manudebuck.github.io/engine-ontology/engine-ontology.ttl#sourceType",
    );
    pub const ET_MOCK_FOLDER: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
        "https://manudebuck.github.io/engine-ontology/engine-ontology.ttl#mockFolder",
    );

    /// Source kind: a Triple Pattern Fragments endpoint.
    pub const ET_TPF: &str =
        "https://manudebuck.github.io/engine-ontology/engine-ontology.ttl#TPF";
    /// Source kind: a plain data file.
    pub const ET_FILE: &str =
        "https://manudebuck.github.io/engine-ontology/engine-ontology.ttl#File";
    /// Test entry type handled by the LDF test case builder.
    pub const ET_LDF_QUERY_EVALUATION_TEST: &str =
        "https://manudebuck.github.io/engine-ontology/engine-ontology.ttl#LdfQueryEvaluationTest";
}

/// One parsed manifest document, quads kept in parse order. Cheap to
/// clone; clones share the parsed document.
#[derive(Clone)]
pub struct ManifestGraph {
    inner: Arc<GraphInner>,
}

struct GraphInner {
    quads: Vec<Quad>,
    iri: String,
}

impl ManifestGraph {
    /// Parse a fetched document, picking the RDF format from its media
    /// type, then its extension, defaulting to Turtle.
    pub fn parse(document: &FetchedDocument) -> Result<Self> {
        let format = rdf_format_for(document.content_type.as_deref(), &document.locator);
        let iri = locator_to_iri(&document.locator);
        let quads = parse_quads_with_format(&document.body, format, &iri)?;
        Ok(Self {
            inner: Arc::new(GraphInner { quads, iri }),
        })
    }

    /// Fetch and parse the document behind a locator.
    pub async fn load(locator: &str, fetcher: &Fetcher) -> Result<Self> {
        let document = fetcher.fetch(locator).await?;
        Self::parse(&document)
    }

    /// The IRI of the document this graph was parsed from.
    pub fn iri(&self) -> &str {
        &self.inner.iri
    }

    pub fn resource(&self, iri: &str) -> Result<Resource> {
        let node = NamedNode::new(iri)
            .map_err(|_| SuiteError::UnresolvableManifest(iri.to_string()))?;
        Ok(Resource {
            graph: self.clone(),
            term: Term::NamedNode(node),
        })
    }

    /// The manifest resource of this document: the resource named by the
    /// locator itself, or failing that the first subject typed
    /// `mf:Manifest`.
    pub fn root_manifest(&self, locator: &str) -> Result<Resource> {
        let iri = locator_to_iri(locator);
        let by_iri = self.resource(&iri)?;
        if self.has_subject(&by_iri.term) {
            return Ok(by_iri);
        }
        for quad in &self.inner.quads {
            if quad.predicate.as_ref() == rdf::TYPE
                && quad.object == Term::NamedNode(vocab::MF_MANIFEST.into_owned())
            {
                if let Subject::NamedNode(subject) = &quad.subject {
                    return Ok(Resource {
                        graph: self.clone(),
                        term: Term::NamedNode(subject.clone()),
                    });
                }
            }
        }
        Err(SuiteError::UnresolvableManifest(locator.to_string()))
    }

    fn has_subject(&self, term: &Term) -> bool {
        self.inner
            .quads
            .iter()
            .any(|quad| subject_matches(&quad.subject, term))
    }

    fn objects(&self, subject: &Term, predicate: oxigraph::model::NamedNodeRef<'_>) -> Vec<Term> {
        self.inner
            .quads
            .iter()
            .filter(|quad| {
                quad.predicate.as_ref() == predicate && subject_matches(&quad.subject, subject)
            })
            .map(|quad| quad.object.clone())
            .collect()
    }
}

fn subject_matches(subject: &Subject, term: &Term) -> bool {
    match (subject, term) {
        (Subject::NamedNode(a), Term::NamedNode(b)) => a == b,
        (Subject::BlankNode(a), Term::BlankNode(b)) => a == b,
        _ => false,
    }
}

/// A node of the manifest document, with the narrow read-only accessors
/// the resolver needs.
#[derive(Clone)]
pub struct Resource {
    graph: ManifestGraph,
    term: Term,
}

impl Resource {
    pub fn term(&self) -> &Term {
        &self.term
    }

    /// Lexical value: the IRI, blank node label, or literal value.
    pub fn value(&self) -> String {
        match &self.term {
            Term::NamedNode(node) => node.as_str().to_string(),
            Term::BlankNode(node) => node.as_str().to_string(),
            Term::Literal(literal) => literal.value().to_string(),
            other => other.to_string(),
        }
    }

    /// First value of a property, in document order.
    pub fn property(&self, predicate: oxigraph::model::NamedNodeRef<'_>) -> Option<Resource> {
        self.properties(predicate).into_iter().next()
    }

    /// All values of a property, in document order.
    pub fn properties(&self, predicate: oxigraph::model::NamedNodeRef<'_>) -> Vec<Resource> {
        self.graph
            .objects(&self.term, predicate)
            .into_iter()
            .map(|term| Resource {
                graph: self.graph.clone(),
                term,
            })
            .collect()
    }

    /// Whether the document says anything about this resource.
    pub fn is_described(&self) -> bool {
        self.graph.has_subject(&self.term)
    }

    /// All `rdf:type` IRIs of this resource.
    pub fn types(&self) -> Vec<String> {
        self.properties(rdf::TYPE)
            .into_iter()
            .map(|r| r.value())
            .collect()
    }

    fn is_nil(&self) -> bool {
        matches!(&self.term, Term::NamedNode(node) if node.as_ref() == rdf::NIL)
    }

    /// Members of the rdf list rooted at this resource, in list order.
    /// `None` if this resource is not a list head.
    pub fn list(&self) -> Option<Vec<Resource>> {
        if self.is_nil() {
            return Some(Vec::new());
        }
        let mut items = vec![self.property(rdf::FIRST)?];
        let mut node = self.clone();
        while let Some(rest) = node.property(rdf::REST) {
            if rest.is_nil() {
                break;
            }
            match rest.property(rdf::FIRST) {
                Some(first) => items.push(first),
                // Dangling rest pointer: stop at the well-formed prefix.
                None => break,
            }
            node = rest;
        }
        Some(items)
    }
}

/// Parse a document body into a quad dataset, for set-semantics use
/// (expected results, isomorphism checks).
pub fn parse_quads(body: &str, content_type: Option<&str>, locator: &str) -> Result<Dataset> {
    let format = rdf_format_for(content_type, locator);
    let quads = parse_quads_with_format(body, format, &locator_to_iri(locator))?;
    Ok(quads.into_iter().collect())
}

fn parse_quads_with_format(body: &str, format: RdfFormat, base_iri: &str) -> Result<Vec<Quad>> {
    let parser = match RdfParser::from_format(format).with_base_iri(base_iri) {
        Ok(parser) => parser,
        Err(_) => RdfParser::from_format(format),
    };
    let mut quads = Vec::new();
    for quad in parser.for_reader(body.as_bytes()) {
        quads.push(quad.map_err(|e| SuiteError::RdfSyntax {
            locator: base_iri.to_string(),
            cause: e.to_string(),
        })?);
    }
    Ok(quads)
}

fn rdf_format_for(content_type: Option<&str>, locator: &str) -> RdfFormat {
    content_type
        .and_then(RdfFormat::from_media_type)
        .or_else(|| {
            Path::new(locator)
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(RdfFormat::from_extension)
        })
        .unwrap_or(RdfFormat::Turtle)
}

/// Graph isomorphism: equality up to blank-node relabeling, ignoring
/// statement order.
pub fn isomorphic(a: &Dataset, b: &Dataset) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.canonicalize(CanonicalizationAlgorithm::Unstable);
    b.canonicalize(CanonicalizationAlgorithm::Unstable);
    a == b
}
