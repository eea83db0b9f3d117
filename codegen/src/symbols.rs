//! Emit-ready symbols and the UID → fully-qualified-name registry.

use std::collections::BTreeMap;
use std::path::Path;

use disenum_registry::{
    BitfieldType, ClassificationTree, DictionaryType, EnumerationType, NodeId, RegistryModel,
    Revision,
};
use serde::Serialize;

use crate::error::CodegenError;
use crate::path::{namespace_of, segment};

/// Logical namespace of scalar enumerations.
pub const ENUMERATIONS: &str = "enumerations";
/// Logical namespace of bitfields.
pub const BITFIELDS: &str = "bitfields";
/// Logical namespace of dictionaries.
pub const DICTIONARIES: &str = "dictionaries";

/// What a symbol renders.
#[derive(Debug, Clone, Copy)]
pub enum SymbolBody<'m> {
    /// A scalar enumeration or one of its satellites.
    Enumeration(&'m EnumerationType),
    /// A bitfield.
    Bitfield(&'m BitfieldType),
    /// A dictionary.
    Dictionary(&'m DictionaryType),
    /// One classification node below the path-only levels.
    Classification {
        /// Owning tree.
        tree: &'m ClassificationTree,
        /// The node.
        node: NodeId,
    },
}

/// One resolved node ready for emission: a logical namespace, an
/// identifier and its data.
#[derive(Debug, Clone)]
pub struct Symbol<'m> {
    /// Registry UID, when the node has one.
    pub uid: Option<&'m str>,
    /// Logical namespace segments below the root namespace.
    pub namespace: Vec<String>,
    /// Resolved identifier.
    pub name: String,
    /// Payload.
    pub body: SymbolBody<'m>,
}

impl Symbol<'_> {
    /// Short description used in logs and error messages.
    #[must_use]
    pub fn label(&self) -> String {
        match self.uid {
            Some(uid) => format!("{} (UID {uid})", self.name),
            None => self.name.clone(),
        }
    }
}

/// Flattens the model into symbols: types first, then every tree in
/// pre-order.
#[must_use]
pub fn collect_symbols(model: &RegistryModel) -> Vec<Symbol<'_>> {
    let mut symbols = Vec::with_capacity(model.type_count() + model.classification_count());
    for e in &model.enumerations {
        symbols.push(Symbol {
            uid: Some(e.uid.as_str()),
            namespace: vec![ENUMERATIONS.to_string()],
            name: e.name.clone(),
            body: SymbolBody::Enumeration(e),
        });
    }
    for b in &model.bitfields {
        symbols.push(Symbol {
            uid: Some(b.uid.as_str()),
            namespace: vec![BITFIELDS.to_string()],
            name: b.name.clone(),
            body: SymbolBody::Bitfield(b),
        });
    }
    for d in &model.dictionaries {
        symbols.push(Symbol {
            uid: Some(d.uid.as_str()),
            namespace: vec![DICTIONARIES.to_string()],
            name: d.name.clone(),
            body: SymbolBody::Dictionary(d),
        });
    }
    for tree in &model.trees {
        for id in tree.pre_order() {
            let node = tree.node(id);
            if node.level.is_path_only() {
                continue;
            }
            symbols.push(Symbol {
                uid: node.uid.as_deref(),
                namespace: namespace_of(tree, id),
                name: node
                    .resolved_name()
                    .map_or_else(|| segment(tree, id), str::to_string),
                body: SymbolBody::Classification { tree, node: id },
            });
        }
    }
    symbols
}

#[derive(Debug, Clone, Serialize)]
struct RevisionEntry {
    title: String,
    date: String,
}

/// The global UID → fully-qualified-name map, written as
/// `uid_registry.json` after every symbol file.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolRegistry {
    language: String,
    root_namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    revision: Option<RevisionEntry>,
    symbols: BTreeMap<String, String>,
}

impl SymbolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(language: &str, root_namespace: &str, revision: Option<&Revision>) -> Self {
        Self {
            language: language.to_string(),
            root_namespace: root_namespace.to_string(),
            revision: revision.map(|r| RevisionEntry {
                title: r.title.clone(),
                date: r.date.clone(),
            }),
            symbols: BTreeMap::new(),
        }
    }

    /// Records a written symbol. The first entry for a UID wins, so
    /// satellites never displace their primary.
    pub fn record(&mut self, uid: &str, fqn: String) -> bool {
        if self.symbols.contains_key(uid) {
            return false;
        }
        self.symbols.insert(uid.to_string(), fqn);
        true
    }

    /// Fully-qualified name recorded for a UID.
    #[must_use]
    pub fn get(&self, uid: &str) -> Option<&str> {
        self.symbols.get(uid).map(String::as_str)
    }

    /// Number of recorded UIDs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Serializes the registry as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::Serialize`] if serialization fails.
    pub fn to_json(&self) -> Result<String, CodegenError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Writes the registry to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write(&self, path: &Path) -> Result<(), CodegenError> {
        let json = self.to_json()?;
        crate::emit::write_file(path, &json, "uid registry")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use disenum_registry::{uids, BitSize, ClassificationNode, Hierarchy, Level};

    fn model() -> RegistryModel {
        let mut tree = ClassificationTree::new(Hierarchy::EntityTypes, uids::ENTITY_TYPES);
        let country = tree
            .attach(None, ClassificationNode::new(Level::Country, 225, "USA"))
            .unwrap();
        tree.set_resolved_name(country, "USA".into()).unwrap();
        let kind = tree
            .attach(Some(country), ClassificationNode::new(Level::Kind, 1, "Platform"))
            .unwrap();
        tree.set_resolved_name(kind, "Platform".into()).unwrap();
        let domain = tree
            .attach(Some(kind), ClassificationNode::new(Level::Domain, 1, "Land"))
            .unwrap();
        tree.set_resolved_name(domain, "Land".into()).unwrap();
        let tank = tree
            .attach(
                Some(domain),
                ClassificationNode::new(Level::Category, 1, "Tank").with_uid(Some("1001".into())),
            )
            .unwrap();
        tree.set_resolved_name(tank, "Tank".into()).unwrap();

        RegistryModel {
            enumerations: vec![EnumerationType {
                uid: "7".into(),
                raw_name: "Entity Kind".into(),
                name: "EntityKind".into(),
                bit_size: BitSize::Eight,
                footnote: None,
                rows: Vec::new(),
            }],
            trees: vec![tree],
            ..RegistryModel::default()
        }
    }

    #[test]
    fn path_only_levels_are_not_symbols() {
        let model = model();
        let symbols = collect_symbols(&model);
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].namespace, vec![ENUMERATIONS]);
        assert_eq!(symbols[1].name, "Tank");
        assert_eq!(symbols[1].uid, Some("1001"));
        assert_eq!(symbols[1].namespace, vec!["entities", "USA", "Platform", "Land"]);
    }

    #[test]
    fn first_registration_wins() {
        let mut registry = SymbolRegistry::new("java", "dis", None);
        assert!(registry.record("500", "dis.Foo".into()));
        assert!(!registry.record("500", "dis.FooAdditional".into()));
        assert_eq!(registry.get("500"), Some("dis.Foo"));
    }

    #[test]
    fn json_lists_symbols_by_uid() {
        let revision = Revision {
            title: "SISO-REF-010".into(),
            date: "2023".into(),
        };
        let mut registry = SymbolRegistry::new("cpp", "dis", Some(&revision));
        registry.record("4", "dis::enumerations::DisPduType".into());
        let value: serde_json::Value = serde_json::from_str(&registry.to_json().unwrap()).unwrap();
        assert_eq!(value["symbols"]["4"], "dis::enumerations::DisPduType");
        assert_eq!(value["revision"]["title"], "SISO-REF-010");
        assert_eq!(value["language"], "cpp");
    }
}
