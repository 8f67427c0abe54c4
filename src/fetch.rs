//! Document fetching: HTTP(S) via reqwest, plain paths and `file://`
//! locators via the filesystem, with locator remapping and an optional
//! on-disk cache for remote documents.

use std::path::{Path, PathBuf};

use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::config::LocatorMapping;
use crate::error::{Result, SuiteError};
use crate::utils::sha1_hex;

/// A fetched document: body, media type when known, and the locator it
/// was actually read from (after remapping).
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub body: String,
    pub content_type: Option<String>,
    pub locator: String,
}

pub struct Fetcher {
    client: reqwest::Client,
    mappings: Vec<LocatorMapping>,
    cache_dir: Option<PathBuf>,
}

impl Fetcher {
    pub fn new(mappings: Vec<LocatorMapping>, cache_dir: Option<PathBuf>) -> Result<Self> {
        if let Some(dir) = &cache_dir {
            std::fs::create_dir_all(dir)?;
        }
        Ok(Self {
            client: reqwest::Client::new(),
            mappings,
            cache_dir,
        })
    }

    pub async fn fetch(&self, locator: &str) -> Result<FetchedDocument> {
        self.fetch_with_accept(locator, None).await
    }

    pub async fn fetch_with_accept(
        &self,
        locator: &str,
        accept: Option<&str>,
    ) -> Result<FetchedDocument> {
        let mapped = self.apply_mappings(locator);
        if is_remote(&mapped) {
            self.fetch_remote(&mapped, accept).await
        } else {
            self.fetch_file(&mapped).await
        }
    }

    fn apply_mappings(&self, locator: &str) -> String {
        for mapping in &self.mappings {
            if let Some(mapped) = mapping.apply(locator) {
                tracing::debug!(from = %locator, to = %mapped, "remapped locator");
                return mapped;
            }
        }
        locator.to_string()
    }

    async fn fetch_remote(&self, locator: &str, accept: Option<&str>) -> Result<FetchedDocument> {
        if let Some(cached) = self.read_cache(locator).await {
            tracing::debug!(locator = %locator, "serving document from cache");
            return Ok(cached);
        }

        let mut request = self.client.get(locator);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        let response = request
            .send()
            .await
            .map_err(|e| SuiteError::fetch(locator, e))?
            .error_for_status()
            .map_err(|e| SuiteError::fetch(locator, e))?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
        let body = response
            .text()
            .await
            .map_err(|e| SuiteError::fetch(locator, e))?;

        let document = FetchedDocument {
            body,
            content_type,
            locator: locator.to_string(),
        };
        self.write_cache(&document).await;
        Ok(document)
    }

    async fn fetch_file(&self, locator: &str) -> Result<FetchedDocument> {
        let path = locator.strip_prefix("file://").unwrap_or(locator);
        let body = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SuiteError::fetch(locator, e))?;
        Ok(FetchedDocument {
            body,
            content_type: media_type_for_path(path),
            locator: locator.to_string(),
        })
    }

    async fn read_cache(&self, locator: &str) -> Option<FetchedDocument> {
        let dir = self.cache_dir.as_ref()?;
        let key = sha1_hex(locator);
        let body = tokio::fs::read_to_string(dir.join(&key)).await.ok()?;
        let content_type = tokio::fs::read_to_string(dir.join(format!("{key}.type")))
            .await
            .ok()
            .filter(|v| !v.is_empty());
        Some(FetchedDocument {
            body,
            content_type,
            locator: locator.to_string(),
        })
    }

    async fn write_cache(&self, document: &FetchedDocument) {
        let Some(dir) = self.cache_dir.as_ref() else {
            return;
        };
        let key = sha1_hex(&document.locator);
        if let Err(error) = tokio::fs::write(dir.join(&key), &document.body).await {
            tracing::warn!(locator = %document.locator, %error, "failed to cache document body");
            return;
        }
        let content_type = document.content_type.as_deref().unwrap_or_default();
        if let Err(error) = tokio::fs::write(dir.join(format!("{key}.type")), content_type).await {
            tracing::warn!(locator = %document.locator, %error, "failed to cache document media type");
        }
    }
}

fn is_remote(locator: &str) -> bool {
    locator.starts_with("http://") || locator.starts_with("https://")
}

/// Turn a locator into something usable as an IRI, mapping bare
/// filesystem paths onto the `file:` scheme.
pub fn locator_to_iri(locator: &str) -> String {
    if locator.contains("://") || locator.starts_with("urn:") {
        return locator.to_string();
    }
    let path = Path::new(locator);
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", absolute.display())
}

fn media_type_for_path(path: &str) -> Option<String> {
    let extension = Path::new(path).extension()?.to_str()?;
    let media_type = match extension {
        "ttl" => "text/turtle",
        "nt" => "application/n-triples",
        "nq" => "application/n-quads",
        "trig" => "application/trig",
        "srj" => "application/sparql-results+json",
        "json" | "jsonld" => "application/ld+json",
        "rq" | "sparql" => "application/sparql-query",
        _ => return None,
    };
    Some(media_type.to_string())
}
