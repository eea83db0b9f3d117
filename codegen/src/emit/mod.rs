//! Emission adapter: renders symbols through per-language templates and
//! writes one file per symbol.
//!
//! Files are written before their UIDs enter the [`SymbolRegistry`], and the
//! registry itself is written last.

pub mod cpp;
pub mod csharp;
pub mod java;
pub mod python;

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use disenum_registry::{
    BitfieldType, ClassificationTree, CrossReference, DictionaryType, EnumerationType, NodeId,
    Revision,
};

use crate::config::GeneratorConfig;
use crate::error::CodegenError;
use crate::identifier::NameScope;
use crate::mapping::{escape_keyword, one_line, TargetLanguage};
use crate::symbols::{Symbol, SymbolBody, SymbolRegistry};

/// File name of the UID → fully-qualified-name registry.
pub const UID_REGISTRY_FILE: &str = "uid_registry.json";

/// Line-oriented source buffer.
#[derive(Debug, Default)]
pub struct SourceFile {
    /// Accumulated text.
    pub buf: String,
}

impl SourceFile {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one line.
    pub fn line(&mut self, s: &str) {
        self.buf.push_str(s);
        self.buf.push('\n');
    }

    /// Appends an empty line.
    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Returns the text.
    #[must_use]
    pub fn finish(self) -> String {
        self.buf
    }
}

/// Writes `content` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`CodegenError::Io`] naming the path and `symbol`.
pub fn write_file(path: &Path, content: &str, symbol: &str) -> Result<(), CodegenError> {
    let io = |source| CodegenError::Io {
        path: path.to_path_buf(),
        symbol: symbol.to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io)?;
    }
    fs::write(path, content).map_err(io)
}

/// Text safe to place inside a block or line comment.
#[must_use]
pub fn comment_text(s: &str) -> String {
    one_line(s).replace("*/", "* /")
}

/// Category of a declared type, for typed cross-references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// Scalar enumeration.
    Enumeration,
    /// Bitfield.
    Bitfield,
    /// Dictionary.
    Dictionary,
}

/// Where a declared type was placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Type category.
    pub kind: TypeKind,
    /// Emitted identifier.
    pub identifier: String,
    /// Fully-qualified name.
    pub fqn: String,
    /// Importable module (Python) or containing namespace.
    pub module: String,
    /// File path relative to the output root, `/`-separated.
    pub file: String,
}

/// Everything a template needs besides the symbol payload.
#[derive(Debug)]
pub struct RenderContext<'a> {
    /// Target language.
    pub language: TargetLanguage,
    /// Namespace segments, root namespace first.
    pub namespace: &'a [String],
    /// Emitted identifier of the symbol.
    pub identifier: &'a str,
    /// Registry UID of the symbol.
    pub uid: Option<&'a str>,
    /// Registry revision, if declared.
    pub revision: Option<&'a Revision>,
    types: &'a HashMap<String, TypeRef>,
}

impl RenderContext<'_> {
    /// Namespace joined with the language separator.
    #[must_use]
    pub fn namespace_path(&self) -> String {
        self.namespace.join(self.language.separator())
    }

    /// Member identifier escaped for the target language. A member may not
    /// repeat the name of its enclosing type.
    #[must_use]
    pub fn member(&self, name: &str) -> String {
        let mut member = escape_keyword(self.language, name);
        if member == self.identifier {
            member.push('_');
        }
        member
    }

    /// Target of a cross-reference when it names an emitted enumeration.
    /// Other references render as primitives.
    #[must_use]
    pub fn enumeration_ref(&self, xref: Option<&CrossReference>) -> Option<&TypeRef> {
        let xref = xref?;
        xref.type_name()?;
        self.types
            .get(xref.uid())
            .filter(|t| t.kind == TypeKind::Enumeration)
    }

    /// One-line provenance note for file headers.
    #[must_use]
    pub fn provenance(&self) -> String {
        let mut note = String::from("Generated by disenum-gen");
        if let Some(r) = self.revision {
            note.push_str(&format!(" from {} ({})", one_line(&r.title), one_line(&r.date)));
        }
        if let Some(uid) = self.uid {
            note.push_str(&format!("; UID {uid}"));
        }
        note.push('.');
        note
    }
}

/// All-ones mask of `length` bits.
#[must_use]
pub fn mask(length: u32) -> u64 {
    if length >= 64 {
        u64::MAX
    } else {
        (1u64 << length) - 1
    }
}

/// Member scope of one rendered type, seeded with the names the template
/// declares itself. Rows claim their names after the language mapping, so
/// two rows that map to the same member end up distinct.
#[must_use]
pub fn member_scope(fixed: &[&str]) -> NameScope {
    let mut scope = NameScope::new();
    for name in fixed {
        scope.reserve(name);
    }
    scope
}

/// Numeric codes along a classification node's path, root first.
#[must_use]
pub fn codes(tree: &ClassificationTree, node: NodeId) -> Vec<i64> {
    let mut codes: Vec<i64> = std::iter::once(tree.node(node).value)
        .chain(tree.ancestors(node).map(|(_, n)| n.value))
        .collect();
    codes.reverse();
    codes
}

/// A per-language renderer.
pub trait Template: Sync {
    /// Renders a scalar enumeration.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::UniquenessExhausted`] if the rows run out of
    /// member names.
    fn enumeration(&self, cx: &RenderContext<'_>, e: &EnumerationType) -> Result<String, CodegenError>;
    /// Renders a bitfield.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::UniquenessExhausted`] if the fields run out of
    /// member names.
    fn bitfield(&self, cx: &RenderContext<'_>, b: &BitfieldType) -> Result<String, CodegenError>;
    /// Renders a dictionary.
    fn dictionary(&self, cx: &RenderContext<'_>, d: &DictionaryType) -> String;
    /// Renders one classification node.
    fn classification(
        &self,
        cx: &RenderContext<'_>,
        tree: &ClassificationTree,
        node: NodeId,
    ) -> String;
    /// Contents of the marker file every package directory needs, if any.
    fn package_marker(&self) -> Option<(&'static str, &'static str)> {
        None
    }
}

/// The template of a language.
#[must_use]
pub fn template_for(language: TargetLanguage) -> &'static dyn Template {
    match language {
        TargetLanguage::Java => &java::JavaTemplate,
        TargetLanguage::Cpp => &cpp::CppTemplate,
        TargetLanguage::CSharp => &csharp::CSharpTemplate,
        TargetLanguage::Python => &python::PythonTemplate,
    }
}

/// Where one symbol lands.
#[derive(Debug, Clone)]
struct Placement {
    namespace: Vec<String>,
    identifier: String,
    module: String,
    file: PathBuf,
    fqn: String,
}

/// Assigns every symbol a namespace, identifier and file. Identifiers are
/// made unique per output directory, ignoring case.
fn plan(symbols: &[Symbol<'_>], config: &GeneratorConfig) -> Result<Vec<Placement>, CodegenError> {
    let language = config.language;
    let root = config.root_segments();
    let namespaces: Vec<Vec<String>> = symbols
        .iter()
        .map(|symbol| {
            let mut namespace = root.clone();
            namespace.extend(symbol.namespace.iter().map(|s| language.namespace_segment(s)));
            namespace
        })
        .collect();

    let mut dirs: HashMap<PathBuf, NameScope> = HashMap::new();
    if language == TargetLanguage::Python {
        // A module may not share its name with a sibling package.
        for namespace in &namespaces {
            let mut parent = PathBuf::new();
            for segment in namespace {
                dirs.entry(parent.clone()).or_default().reserve(segment);
                parent.push(segment);
            }
        }
    }

    let mut placements = Vec::with_capacity(symbols.len());
    for (symbol, namespace) in symbols.iter().zip(namespaces) {
        let dir: PathBuf = namespace.iter().collect();
        let scope = dirs.entry(dir.clone()).or_default();

        let escaped = escape_keyword(language, &symbol.name);
        let (identifier, stem) = match language {
            TargetLanguage::Python => {
                let stem = scope.claim(&language.file_stem(&escaped))?;
                (escaped, stem)
            }
            _ => {
                let identifier = scope.claim(&escaped)?;
                (identifier.clone(), identifier)
            }
        };
        let sep = language.separator();
        let ns = namespace.join(sep);
        let module = match language {
            TargetLanguage::Python => format!("{ns}.{stem}"),
            _ => ns,
        };
        placements.push(Placement {
            fqn: format!("{module}{sep}{identifier}"),
            file: dir.join(format!("{stem}.{}", language.extension())),
            namespace,
            identifier,
            module,
        });
    }
    Ok(placements)
}

/// Result of writing every symbol.
#[derive(Debug)]
pub struct EmitReport {
    /// Files written, relative to the output root.
    pub files: Vec<PathBuf>,
    /// UID → fully-qualified-name map, as written.
    pub registry: SymbolRegistry,
}

/// Renders and writes every symbol, then the package markers, then the UID
/// registry.
///
/// # Errors
///
/// Returns [`CodegenError::Io`] on the first failed write, and
/// [`CodegenError::UniquenessExhausted`] if a directory or a type runs out
/// of names.
pub fn emit_all(
    symbols: &[Symbol<'_>],
    config: &GeneratorConfig,
    revision: Option<&Revision>,
) -> Result<EmitReport, CodegenError> {
    let template = template_for(config.language);
    let placements = plan(symbols, config)?;

    let mut types: HashMap<String, TypeRef> = HashMap::new();
    for (symbol, placement) in symbols.iter().zip(&placements) {
        let kind = match symbol.body {
            SymbolBody::Enumeration(_) => TypeKind::Enumeration,
            SymbolBody::Bitfield(_) => TypeKind::Bitfield,
            SymbolBody::Dictionary(_) => TypeKind::Dictionary,
            SymbolBody::Classification { .. } => continue,
        };
        if let Some(uid) = symbol.uid {
            types.entry(uid.to_string()).or_insert_with(|| TypeRef {
                kind,
                identifier: placement.identifier.clone(),
                fqn: placement.fqn.clone(),
                module: placement.module.clone(),
                file: slash_path(&placement.file),
            });
        }
    }

    let mut registry = SymbolRegistry::new(config.language.as_str(), &config.root_namespace, revision);
    let mut files = Vec::with_capacity(placements.len() + 1);
    for (symbol, placement) in symbols.iter().zip(&placements) {
        let cx = RenderContext {
            language: config.language,
            namespace: &placement.namespace,
            identifier: &placement.identifier,
            uid: symbol.uid,
            revision,
            types: &types,
        };
        let content = match symbol.body {
            SymbolBody::Enumeration(e) => template.enumeration(&cx, e)?,
            SymbolBody::Bitfield(b) => template.bitfield(&cx, b)?,
            SymbolBody::Dictionary(d) => template.dictionary(&cx, d),
            SymbolBody::Classification { tree, node } => template.classification(&cx, tree, node),
        };
        write_file(&config.out_dir.join(&placement.file), &content, &symbol.label())?;
        files.push(placement.file.clone());
        if let Some(uid) = symbol.uid {
            registry.record(uid, placement.fqn.clone());
        }
    }

    if let Some((marker, content)) = template.package_marker() {
        let mut dirs = BTreeSet::new();
        for placement in &placements {
            let mut dir = PathBuf::new();
            for segment in &placement.namespace {
                dir.push(segment);
                dirs.insert(dir.clone());
            }
        }
        for dir in dirs {
            let file = dir.join(marker);
            write_file(&config.out_dir.join(&file), content, "package marker")?;
            files.push(file);
        }
    }

    registry.write(&config.out_dir.join(UID_REGISTRY_FILE))?;
    files.push(PathBuf::from(UID_REGISTRY_FILE));
    tracing::info!(files = files.len(), uids = registry.len(), "emission complete");
    Ok(EmitReport { files, registry })
}

fn slash_path(path: &Path) -> String {
    path.iter()
        .map(|c| c.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::symbols::ENUMERATIONS;
    use disenum_registry::{BitSize, EnumerationRow};

    fn enumeration(name: &str) -> EnumerationType {
        EnumerationType {
            uid: "7".into(),
            raw_name: name.into(),
            name: name.into(),
            bit_size: BitSize::Eight,
            footnote: None,
            rows: vec![EnumerationRow {
                value: 1,
                range_end: None,
                description: "Platform".into(),
                footnote: None,
                cross_reference: None,
                base_name: "Platform".into(),
                name: "Platform".into(),
            }],
        }
    }

    fn symbol(e: &EnumerationType) -> Symbol<'_> {
        Symbol {
            uid: Some(e.uid.as_str()),
            namespace: vec![ENUMERATIONS.to_string()],
            name: e.name.clone(),
            body: SymbolBody::Enumeration(e),
        }
    }

    #[test]
    fn source_file_collects_lines() {
        let mut f = SourceFile::new();
        f.line("a");
        f.blank();
        f.line("b");
        assert_eq!(f.finish(), "a\n\nb\n");
    }

    #[test]
    fn member_scope_suffixes_fixed_names() {
        let mut scope = member_scope(&["bits", "SIZE_BITS"]);
        assert_eq!(scope.claim("bits").unwrap(), "bits1");
        assert_eq!(scope.claim("size_bits").unwrap(), "size_bits1");
        assert_eq!(scope.claim("nation").unwrap(), "nation");
    }

    #[test]
    fn masks() {
        assert_eq!(mask(1), 1);
        assert_eq!(mask(3), 0b111);
        assert_eq!(mask(64), u64::MAX);
    }

    #[test]
    fn comments_cannot_close_early() {
        assert_eq!(comment_text("a */ b\nc"), "a * / b c");
    }

    #[test]
    fn placement_follows_language_conventions() {
        let e = enumeration("EntityKind");
        let symbols = [symbol(&e)];
        let mut config = GeneratorConfig::new("r.xml", TargetLanguage::Python, "out").unwrap();
        config.root_namespace = "opendis".into();
        let p = &plan(&symbols, &config).unwrap()[0];
        assert_eq!(p.fqn, "opendis.enumerations.entity_kind.EntityKind");
        assert_eq!(slash_path(&p.file), "opendis/enumerations/entity_kind.py");

        config.language = TargetLanguage::Cpp;
        config.root_namespace = "dis".into();
        let p = &plan(&symbols, &config).unwrap()[0];
        assert_eq!(p.fqn, "dis::enumerations::EntityKind");
        assert_eq!(slash_path(&p.file), "dis/enumerations/EntityKind.hpp");
    }

    #[test]
    fn clashing_files_in_one_directory_are_suffixed() {
        let a = enumeration("Tank");
        let b = enumeration("TANK");
        let symbols = [symbol(&a), symbol(&b)];
        let config = GeneratorConfig::new("r.xml", TargetLanguage::Java, "out").unwrap();
        let placements = plan(&symbols, &config).unwrap();
        assert_eq!(placements[0].identifier, "Tank");
        assert_eq!(placements[1].identifier, "TANK1");
    }

    #[test]
    fn python_modules_avoid_package_names() {
        let e = enumeration("Enumerations");
        let mut symbols = vec![symbol(&e)];
        symbols[0].namespace.clear();
        let other = enumeration("EntityKind");
        symbols.push(symbol(&other));
        let config = GeneratorConfig::new("r.xml", TargetLanguage::Python, "out").unwrap();
        let placements = plan(&symbols, &config).unwrap();
        assert_eq!(slash_path(&placements[0].file), "opendis/enumerations1.py");
        assert_eq!(slash_path(&placements[1].file), "opendis/enumerations/entity_kind.py");
    }

    #[test]
    fn every_template_renders_an_enumeration() {
        let e = enumeration("EntityKind");
        let types = HashMap::new();
        for language in TargetLanguage::ALL {
            let namespace = vec!["root".to_string(), ENUMERATIONS.to_string()];
            let cx = RenderContext {
                language,
                namespace: &namespace,
                identifier: "EntityKind",
                uid: Some("7"),
                revision: None,
                types: &types,
            };
            let text = template_for(language).enumeration(&cx, &e).unwrap();
            assert!(text.contains("EntityKind"), "{language}: {text}");
            assert!(text.contains("Platform"), "{language}: {text}");
            assert!(text.contains("UID 7"), "{language}: {text}");
        }
    }
}
