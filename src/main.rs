use anyhow::Result;
use clap::Parser;

use ldf_test_suite::config::{CliArgs, SuiteConfig};
use ldf_test_suite::logging::{LogFormat, init_logging};
use ldf_test_suite::manifest::ManifestSummary;
use ldf_test_suite::runner::load_manifest;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(LogFormat::from_env());

    let config = SuiteConfig::from_args(&args)?;
    let manifest = load_manifest(&args.manifest, &config).await?;

    let summary = match &config.specification {
        None => Some(manifest.summary()),
        Some(name) => manifest
            .specifications
            .as_ref()
            .and_then(|specs| specs.get(name))
            .map(|scoped| scoped.summary()),
    };

    let Some(summary) = summary else {
        // Mirrors run-time scoping: an unknown specification is empty,
        // not an error.
        eprintln!(
            "specification {:?} not declared by {}; nothing to report",
            config.specification.as_deref().unwrap_or_default(),
            args.manifest
        );
        return Ok(());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_tree(&summary, 0);
    }
    Ok(())
}

fn print_tree(summary: &ManifestSummary, depth: usize) {
    let indent = "  ".repeat(depth);
    let label = summary.label.as_deref().unwrap_or(&summary.uri);
    println!("{indent}{label}");
    for test in &summary.test_entries {
        let name = test.name.as_deref().unwrap_or(&test.uri);
        println!("{indent}  - {name}");
    }
    if let Some(specifications) = &summary.specifications {
        for (name, spec) in specifications {
            println!("{indent}  [specification] {name}");
            print_tree(spec, depth + 2);
        }
    }
    for sub in &summary.sub_manifests {
        print_tree(sub, depth + 1);
    }
}
