use clap::Parser;
use regex::Regex;
use std::path::PathBuf;

use crate::error::{Result, SuiteError};

pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

/// A `URL~PATH` pair remapping an external locator prefix onto a local
/// path, so remote manifests can be resolved from a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorMapping {
    pub url: String,
    pub path: String,
}

impl LocatorMapping {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.split_once('~') {
            Some((url, path)) if !url.is_empty() && !path.is_empty() => Ok(Self {
                url: url.to_string(),
                path: path.to_string(),
            }),
            _ => Err(SuiteError::InvalidMapping(raw.to_string())),
        }
    }

    /// Parse a comma separated list of `URL~PATH` pairs.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>> {
        raw.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(|part| Self::parse(part.trim()))
            .collect()
    }

    /// Rewrite `locator` if it starts with the mapped URL prefix.
    pub fn apply(&self, locator: &str) -> Option<String> {
        locator
            .strip_prefix(&self.url)
            .map(|rest| format!("{}{}", self.path, rest))
    }
}

/// Configuration for one suite run, constructed once and passed by
/// reference through the call graph.
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    /// Cache directory for fetched documents. Absent disables caching.
    pub cache_dir: Option<PathBuf>,
    /// Scope execution to one named specification of the manifest.
    pub specification: Option<String>,
    /// Only run test entries whose IRI matches.
    pub test_filter: Option<Regex>,
    /// Locator prefix remappings, applied before any fetch.
    pub mappings: Vec<LocatorMapping>,
    /// Timeout handed to the engine's network layer, in milliseconds.
    pub timeout_ms: u64,
    /// Opaque engine-specific arguments, forwarded untouched.
    pub injected_args: serde_json::Map<String, serde_json::Value>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            specification: None,
            test_filter: None,
            mappings: Vec::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            injected_args: serde_json::Map::new(),
        }
    }
}

impl SuiteConfig {
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let test_filter = args
            .test_filter
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| SuiteError::InvalidFilter(e.to_string()))?;

        let mut mappings = Vec::new();
        for raw in &args.mappings {
            mappings.extend(LocatorMapping::parse_list(raw)?);
        }

        let injected_args = match args.injected_args.as_deref() {
            None => serde_json::Map::new(),
            Some(raw) => match serde_json::from_str(raw) {
                Ok(serde_json::Value::Object(map)) => map,
                Ok(other) => return Err(SuiteError::InvalidInjectedArgs(other.to_string())),
                Err(e) => return Err(SuiteError::InvalidInjectedArgs(e.to_string())),
            },
        };

        Ok(Self {
            cache_dir: args.cache.clone(),
            specification: args.specification.clone(),
            test_filter,
            mappings,
            timeout_ms: args.timeout,
            injected_args,
        })
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "ldf-suite",
    about = "Resolves LDF query-engine test manifests and reports the test tree"
)]
pub struct CliArgs {
    /// Manifest locator: a URL or a file path
    pub manifest: String,

    /// Scope to one named specification declared by the manifest
    #[arg(short, long)]
    pub specification: Option<String>,

    /// Regex filtering test entry IRIs
    #[arg(short = 'f', long = "filter")]
    pub test_filter: Option<String>,

    /// Directory to cache fetched documents in; omit to disable caching
    #[arg(short, long, env = "LDF_SUITE_CACHE")]
    pub cache: Option<PathBuf>,

    /// URL~PATH locator mappings, comma separated; may be repeated
    #[arg(short, long = "mapping")]
    pub mappings: Vec<String>,

    /// Timeout in milliseconds handed to the engine's network layer
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout: u64,

    /// JSON object with engine-specific arguments
    #[arg(long)]
    pub injected_args: Option<String>,

    /// Emit the resolved tree as JSON
    #[arg(long)]
    pub json: bool,
}
