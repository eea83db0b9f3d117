//! disenum code generator.
//!
//! Turns the SISO enumerations registry into source identifiers. The run is
//! two sequential scans of the registry:
//!
//! 1. [`UidTable::build`] names every declared type, so cross-references
//!    may point forward.
//! 2. [`ModelBuilder`] materializes rows and classification trees,
//!    resolving each node's identifier as it closes, and splits oversized
//!    enumerations.
//!
//! [`generate`] then flattens the model into symbols and writes one file
//! per symbol through the language's template, followed by the
//! `uid_registry.json` map from registry UID to fully-qualified name.
//!
//! ```
//! use disenum_codegen::{resolve_str, config::Overrides};
//!
//! let xml = r#"<ebv>
//!   <enum uid="50" name="Status" size="8">
//!     <enumrow value="0" description="Unknown"/>
//!     <enumrow value="1" description="Unknown"/>
//!   </enum>
//! </ebv>"#;
//! let resolution = resolve_str(xml, &Overrides::default(), 4096)?;
//! let rows = &resolution.model.enumerations[0].rows;
//! assert_eq!(rows[1].name, "Unknown1");
//! # Ok::<(), disenum_codegen::CodegenError>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod builder;
pub mod config;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod identifier;
pub mod mapping;
pub mod normalize;
pub mod overflow;
pub mod path;
pub mod symbols;
pub mod uid_table;

use std::io::BufRead;
use std::path::{Path, PathBuf};

use disenum_registry::{RegistryModel, RegistryReader};

pub use builder::ModelBuilder;
pub use config::{GeneratorConfig, Overrides};
pub use diagnostics::{DiagnosticKind, Diagnostics};
pub use error::CodegenError;
pub use mapping::TargetLanguage;
pub use uid_table::UidTable;

/// Output of both resolution passes.
#[derive(Debug)]
pub struct Resolution {
    /// The resolved model.
    pub model: RegistryModel,
    /// The UID table from pass 1.
    pub table: UidTable,
    /// Every non-fatal finding, in recording order.
    pub diagnostics: Diagnostics,
}

/// Runs both passes over a registry file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if a scope
/// runs out of unique names.
pub fn resolve_path(
    registry: &Path,
    overrides: &Overrides,
    row_ceiling: usize,
) -> Result<Resolution, CodegenError> {
    let mut diagnostics = Diagnostics::new();
    let (model, table) = resolve_readers(
        RegistryReader::from_path(registry)?,
        RegistryReader::from_path(registry)?,
        overrides,
        row_ceiling,
        &mut diagnostics,
    )?;
    Ok(Resolution {
        model,
        table,
        diagnostics,
    })
}

/// Runs both passes over a registry held in memory.
///
/// # Errors
///
/// Returns an error if the text cannot be parsed, or if a scope runs out of
/// unique names.
pub fn resolve_str(
    xml: &str,
    overrides: &Overrides,
    row_ceiling: usize,
) -> Result<Resolution, CodegenError> {
    let mut diagnostics = Diagnostics::new();
    resolve_readers(
        RegistryReader::from_str(xml),
        RegistryReader::from_str(xml),
        overrides,
        row_ceiling,
        &mut diagnostics,
    )
    .map(|(model, table)| Resolution {
        model,
        table,
        diagnostics,
    })
}

fn resolve_readers<R: BufRead>(
    mut first: RegistryReader<R>,
    mut second: RegistryReader<R>,
    overrides: &Overrides,
    row_ceiling: usize,
    diagnostics: &mut Diagnostics,
) -> Result<(RegistryModel, UidTable), CodegenError> {
    let table = UidTable::build(&mut first, overrides, diagnostics)?;
    let model = ModelBuilder::new(&table, overrides, diagnostics, row_ceiling).build(&mut second)?;
    Ok((model, table))
}

/// Report of what was generated.
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Number of enumerations emitted, satellites included.
    pub enumeration_count: usize,
    /// Number of bitfields emitted.
    pub bitfield_count: usize,
    /// Number of dictionaries emitted.
    pub dictionary_count: usize,
    /// Number of classification symbols emitted.
    pub classification_count: usize,
    /// Number of UIDs in the registry file.
    pub uid_count: usize,
    /// Number of non-fatal diagnostics.
    pub diagnostic_count: usize,
    /// Files written, relative to the output root.
    pub files: Vec<PathBuf>,
}

/// Resolves the configured registry and writes every artifact.
///
/// # Errors
///
/// Returns the first fatal error: an unreadable or malformed registry, an
/// exhausted uniqueness scope, or a failed write.
pub fn generate(config: &GeneratorConfig) -> Result<GenerationReport, CodegenError> {
    tracing::info!(
        registry = %config.registry.display(),
        language = %config.language,
        out = %config.out_dir.display(),
        "generating"
    );
    let resolution = resolve_path(&config.registry, &config.overrides, config.row_ceiling)?;
    let symbols = symbols::collect_symbols(&resolution.model);
    let emitted = emit::emit_all(&symbols, config, resolution.model.revision.as_ref())?;

    let classification_count = symbols
        .iter()
        .filter(|s| matches!(s.body, symbols::SymbolBody::Classification { .. }))
        .count();
    Ok(GenerationReport {
        enumeration_count: resolution.model.enumerations.len(),
        bitfield_count: resolution.model.bitfields.len(),
        dictionary_count: resolution.model.dictionaries.len(),
        classification_count,
        uid_count: emitted.registry.len(),
        diagnostic_count: resolution.diagnostics.len(),
        files: emitted.files,
    })
}
