//! `disenum-gen`: generates enumeration sources for one target language from
//! the SISO enumerations registry.
//!
//! **Outputs** (under `<out>`, laid out by the root namespace):
//! - one source file per enumeration, bitfield, dictionary and
//!   classification node
//! - `uid_registry.json`: registry UID → fully-qualified name
//!
//! **Usage:**
//! ```text
//! disenum-gen --registry <xml> --language <java|cpp|csharp|python>
//!             [--out <dir>] [--namespace <root>] [--overrides <toml>] [--verbose]
//! ```
//!
//! Progress goes to stdout; log output and diagnostics go to stderr.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use disenum_codegen::{GeneratorConfig, Overrides, TargetLanguage};
use tracing_subscriber::EnvFilter;

/// Generate enumeration sources from the SISO registry.
#[derive(Parser)]
#[command(
    name = "disenum-gen",
    about = "Generate Java, C++, C# or Python enumerations from the SISO registry"
)]
struct Args {
    /// Registry XML file.
    #[arg(long)]
    registry: PathBuf,

    /// Target language: java, cpp, csharp or python.
    #[arg(long)]
    language: TargetLanguage,

    /// Output root directory.
    #[arg(long, default_value = "generated")]
    out: PathBuf,

    /// Root package or namespace. Defaults to the language's conventional root.
    #[arg(long)]
    namespace: Option<String>,

    /// Override table (TOML) replacing the built-in one.
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = GeneratorConfig::new(&args.registry, args.language, &args.out)
        .context("Failed to load the built-in override table")?;
    if let Some(path) = &args.overrides {
        config.overrides = Overrides::load(path)
            .with_context(|| format!("Failed to load override table {}", path.display()))?;
    }
    if let Some(namespace) = args.namespace {
        config.root_namespace = namespace;
    }

    println!(
        "Generating {} sources from {} into {} (namespace {})",
        config.language,
        config.registry.display(),
        config.out_dir.display(),
        config.root_namespace
    );

    let report = disenum_codegen::generate(&config)
        .with_context(|| format!("Failed to generate from {}", config.registry.display()))?;

    println!(
        "Generated {} enumerations, {} bitfields, {} dictionaries, {} classifications",
        report.enumeration_count,
        report.bitfield_count,
        report.dictionary_count,
        report.classification_count
    );
    println!(
        "Files written: {} ({} UIDs registered)",
        report.files.len(),
        report.uid_count
    );
    if report.diagnostic_count > 0 {
        println!(
            "{} diagnostics reported (see stderr)",
            report.diagnostic_count
        );
    }

    println!("Generation complete.");
    Ok(())
}
