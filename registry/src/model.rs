//! Core registry model types.
//!
//! These types represent one generation run's view of the enumerations
//! registry. Everything is owned and rebuilt from scratch per run. The
//! top-level container is [`RegistryModel`].

use std::fmt;

use crate::error::RegistryError;

/// Storage width of a scalar enumeration.
///
/// The registry declares an arbitrary bit count; emitted types round it up
/// to the next supported width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BitSize {
    /// Up to 8 bits.
    Eight,
    /// 9 to 16 bits.
    Sixteen,
    /// 17 bits and above.
    ThirtyTwo,
}

impl BitSize {
    /// Rounds a declared size up to a supported width.
    #[must_use]
    pub fn from_declared(bits: u32) -> Self {
        match bits {
            0..=8 => BitSize::Eight,
            9..=16 => BitSize::Sixteen,
            _ => BitSize::ThirtyTwo,
        }
    }

    /// Returns the width in bits.
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            BitSize::Eight => 8,
            BitSize::Sixteen => 16,
            BitSize::ThirtyTwo => 32,
        }
    }
}

/// A UID cross-reference from a row to another declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrossReference {
    /// The UID names a type known to the UID table.
    Typed {
        /// Referenced UID.
        uid: String,
        /// Resolved name of the referenced type.
        type_name: String,
    },
    /// The UID has no table entry; the field is emitted as a primitive.
    Unresolved {
        /// Referenced UID.
        uid: String,
    },
}

impl CrossReference {
    /// Returns the referenced UID.
    #[must_use]
    pub fn uid(&self) -> &str {
        match self {
            CrossReference::Typed { uid, .. } | CrossReference::Unresolved { uid } => uid,
        }
    }

    /// Returns the referenced type name when the reference resolved.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        match self {
            CrossReference::Typed { type_name, .. } => Some(type_name),
            CrossReference::Unresolved { .. } => None,
        }
    }
}

/// One row of a scalar enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationRow {
    /// Numeric value.
    pub value: i64,
    /// Upper bound when the row was declared as a value range.
    pub range_end: Option<i64>,
    /// Raw description text.
    pub description: String,
    /// Optional footnote.
    pub footnote: Option<String>,
    /// UID cross-reference, if the row declares one.
    pub cross_reference: Option<CrossReference>,
    /// Identifier after normalization and numeric disambiguation, before
    /// the sibling suffix is applied.
    pub base_name: String,
    /// Final identifier, unique within the owning enumeration.
    pub name: String,
}

/// A scalar enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationType {
    /// Registry UID.
    pub uid: String,
    /// Name attribute as written in the registry.
    pub raw_name: String,
    /// Resolved type name.
    pub name: String,
    /// Storage width.
    pub bit_size: BitSize,
    /// Optional footnote.
    pub footnote: Option<String>,
    /// Rows in declaration order.
    pub rows: Vec<EnumerationRow>,
}

/// One field of a bitfield.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitfieldRow {
    /// Name attribute as written in the registry.
    pub raw_name: String,
    /// Resolved field identifier.
    pub name: String,
    /// Position of the least significant bit.
    pub bit_position: u32,
    /// Field width; at least 1.
    pub length: u32,
    /// Raw description text.
    pub description: String,
    /// UID cross-reference, if the field is typed by another declaration.
    pub cross_reference: Option<CrossReference>,
}

/// A bitfield record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitfieldType {
    /// Registry UID.
    pub uid: String,
    /// Name attribute as written in the registry.
    pub raw_name: String,
    /// Resolved type name.
    pub name: String,
    /// Declared total width.
    pub total_bits: u32,
    /// Fields in declaration order.
    pub rows: Vec<BitfieldRow>,
}

impl BitfieldType {
    /// Sum of all field widths.
    #[must_use]
    pub fn used_bits(&self) -> u32 {
        self.rows.iter().map(|r| r.length).sum()
    }

    /// Bits left over as padding; zero when the fields overflow.
    #[must_use]
    pub fn padding_bits(&self) -> u32 {
        self.total_bits.saturating_sub(self.used_bits())
    }
}

/// One entry of a dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryRow {
    /// Textual code.
    pub value: String,
    /// Raw description text.
    pub description: String,
    /// Resolved identifier, unique within the dictionary.
    pub name: String,
}

/// A dictionary of textual codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryType {
    /// Registry UID.
    pub uid: String,
    /// Name attribute as written in the registry.
    pub raw_name: String,
    /// Resolved type name.
    pub name: String,
    /// Entries in declaration order.
    pub rows: Vec<DictionaryRow>,
}

/// Level of a classification node.
///
/// Entity and object trees nest `Country ▸ Kind ▸ Domain ▸ Category ▸
/// SubCategory ▸ Specific ▸ Extra`; jammer trees nest `JammerKind ▸
/// JammerCategory ▸ JammerSubCategory ▸ JammerSpecific`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Country code (entity trees only).
    Country,
    /// Entity or object kind.
    Kind,
    /// Platform, munition or supply domain.
    Domain,
    /// Category.
    Category,
    /// Subcategory.
    SubCategory,
    /// Specific.
    Specific,
    /// Extra.
    Extra,
    /// Jammer kind.
    JammerKind,
    /// Jammer category.
    JammerCategory,
    /// Jammer subcategory.
    JammerSubCategory,
    /// Jammer specific.
    JammerSpecific,
}

impl Level {
    /// Returns the display name used in fallback path segments.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Country => "Country",
            Level::Kind => "Kind",
            Level::Domain => "Domain",
            Level::Category => "Category",
            Level::SubCategory => "SubCategory",
            Level::Specific => "Specific",
            Level::Extra => "Extra",
            Level::JammerKind => "JammerKind",
            Level::JammerCategory => "JammerCategory",
            Level::JammerSubCategory => "JammerSubCategory",
            Level::JammerSpecific => "JammerSpecific",
        }
    }

    /// Returns true if a node of level `child` may be attached under `self`.
    #[must_use]
    pub fn accepts_child(self, child: Level) -> bool {
        matches!(
            (self, child),
            (Level::Country, Level::Kind)
                | (Level::Kind, Level::Domain)
                | (Level::Domain, Level::Category)
                | (Level::Category, Level::SubCategory)
                | (Level::SubCategory, Level::Specific)
                | (Level::Specific, Level::Extra)
                | (Level::JammerKind, Level::JammerCategory)
                | (Level::JammerCategory, Level::JammerSubCategory)
                | (Level::JammerSubCategory, Level::JammerSpecific)
        )
    }

    /// Returns true if the level may start a tree.
    #[must_use]
    pub fn is_root(self) -> bool {
        matches!(self, Level::Country | Level::Kind | Level::JammerKind)
    }

    /// Returns true if the level only contributes a path segment and is
    /// never emitted as a symbol of its own.
    #[must_use]
    pub fn is_path_only(self) -> bool {
        matches!(self, Level::Country | Level::Kind | Level::Domain)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which classification hierarchy a tree belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hierarchy {
    /// `<cet>` entity types.
    EntityTypes,
    /// `<cot>` object types.
    ObjectTypes,
    /// `<jammer_technique>` jammer techniques.
    JammerTechniques,
}

impl Hierarchy {
    /// Returns the logical package segment under which the tree is emitted.
    #[must_use]
    pub fn package(self) -> &'static str {
        match self {
            Hierarchy::EntityTypes => "entities",
            Hierarchy::ObjectTypes => "objecttypes",
            Hierarchy::JammerTechniques => "jammers",
        }
    }
}

/// Index of a node inside its [`ClassificationTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the raw arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One node of a classification tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationNode {
    /// Level tag.
    pub level: Level,
    /// Numeric code at this level.
    pub value: i64,
    /// Registry UID, when declared.
    pub uid: Option<String>,
    /// Raw description text.
    pub raw_description: String,
    resolved_name: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl ClassificationNode {
    /// Creates an unattached node.
    #[must_use]
    pub fn new(level: Level, value: i64, raw_description: impl Into<String>) -> Self {
        Self {
            level,
            value,
            uid: None,
            raw_description: raw_description.into(),
            resolved_name: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Sets the registry UID.
    #[must_use]
    pub fn with_uid(mut self, uid: Option<String>) -> Self {
        self.uid = uid;
        self
    }

    /// Returns the resolved identifier, once assigned.
    #[must_use]
    pub fn resolved_name(&self) -> Option<&str> {
        self.resolved_name.as_deref()
    }

    /// Returns the parent node, `None` for roots.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the children in declaration order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// An arena-backed classification tree.
///
/// Parents are stored as indices, so a child never owns its parent.
#[derive(Debug, Clone)]
pub struct ClassificationTree {
    /// Which hierarchy this tree encodes.
    pub hierarchy: Hierarchy,
    /// UID of the top-level registry subtree.
    pub uid: String,
    nodes: Vec<ClassificationNode>,
    roots: Vec<NodeId>,
}

impl ClassificationTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new(hierarchy: Hierarchy, uid: impl Into<String>) -> Self {
        Self {
            hierarchy,
            uid: uid.into(),
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Attaches `node` under `parent` (or as a root when `parent` is `None`).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LevelMismatch`] when the parent level does
    /// not accept the child level.
    pub fn attach(
        &mut self,
        parent: Option<NodeId>,
        mut node: ClassificationNode,
    ) -> Result<NodeId, RegistryError> {
        let parent_level = parent.map(|p| self.node(p).level);
        let allowed = match parent_level {
            Some(level) => level.accepts_child(node.level),
            None => node.level.is_root(),
        };
        if !allowed {
            return Err(RegistryError::LevelMismatch {
                parent: parent_level,
                child: node.level,
            });
        }

        let id = NodeId(self.nodes.len());
        node.parent = parent;
        node.resolved_name = None;
        node.children.clear();
        self.nodes.push(node);
        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.roots.push(id),
        }
        Ok(id)
    }

    /// Returns an existing child of `parent` with the given level and value.
    #[must_use]
    pub fn find_child(&self, parent: Option<NodeId>, level: Level, value: i64) -> Option<NodeId> {
        self.children_of(parent)
            .iter()
            .copied()
            .find(|&id| self.node(id).level == level && self.node(id).value == value)
    }

    /// Returns the children of `parent`, or the roots when `parent` is `None`.
    #[must_use]
    pub fn children_of(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            Some(p) => &self.node(p).children,
            None => &self.roots,
        }
    }

    /// Returns the node with the given id.
    ///
    /// Ids are only handed out by [`attach`](Self::attach), so every id
    /// obtained from this tree is valid.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &ClassificationNode {
        &self.nodes[id.0]
    }

    /// Assigns the resolved identifier of a node.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NameAlreadySet`] if the node already has one.
    pub fn set_resolved_name(&mut self, id: NodeId, name: String) -> Result<(), RegistryError> {
        let node = &mut self.nodes[id.0];
        if node.resolved_name.is_some() {
            return Err(RegistryError::NameAlreadySet(id.0));
        }
        node.resolved_name = Some(name);
        Ok(())
    }

    /// Iterates from `id`'s parent up to its root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.node(id).parent,
        }
    }

    /// Number of nodes on the path from the root to `id`, inclusive.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count() + 1
    }

    /// Iterates every node in pre-order (parents before children).
    pub fn pre_order(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.node(id).children.iter().rev().copied());
            Some(id)
        })
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Iterator over a node's ancestors, nearest first.
pub struct Ancestors<'a> {
    tree: &'a ClassificationTree,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = (NodeId, &'a ClassificationNode);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.tree.node(id);
        self.next = node.parent;
        Some((id, node))
    }
}

/// The `<revision>` marker of a registry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    /// Revision title.
    pub title: String,
    /// Revision date as written.
    pub date: String,
}

/// Everything pass 2 materializes from one registry file.
#[derive(Debug, Default)]
pub struct RegistryModel {
    /// First revision marker found, if any.
    pub revision: Option<Revision>,
    /// Scalar enumerations, after overflow splitting.
    pub enumerations: Vec<EnumerationType>,
    /// Bitfields.
    pub bitfields: Vec<BitfieldType>,
    /// Dictionaries.
    pub dictionaries: Vec<DictionaryType>,
    /// Classification trees.
    pub trees: Vec<ClassificationTree>,
}

impl RegistryModel {
    /// Total number of declared types.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.enumerations.len() + self.bitfields.len() + self.dictionaries.len()
    }

    /// Total number of classification nodes across all trees.
    #[must_use]
    pub fn classification_count(&self) -> usize {
        self.trees.iter().map(ClassificationTree::len).sum()
    }
}

/// Well-known registry UIDs.
pub mod uids {
    /// Entity type tree (`<cet>`). Only this subtree is processed.
    pub const ENTITY_TYPES: &str = "30";
    /// Object type tree (`<cot>`). Only this subtree is processed.
    pub const OBJECT_TYPES: &str = "226";
    /// Jammer technique tree.
    pub const JAMMER_TECHNIQUES: &str = "284";

    /// Country enumeration.
    pub const COUNTRY: &str = "29";
    /// Entity kind enumeration.
    pub const ENTITY_KIND: &str = "7";
    /// Platform domain enumeration.
    pub const PLATFORM_DOMAIN: &str = "8";
    /// Munition domain enumeration.
    pub const MUNITION_DOMAIN: &str = "14";
    /// Supply domain enumeration.
    pub const SUPPLY_DOMAIN: &str = "600";
    /// Object kind enumeration.
    pub const OBJECT_KIND: &str = "225";

    /// Entity kind value selecting the munition domain table.
    pub const KIND_MUNITION: i64 = 2;
    /// Entity kind value selecting the supply domain table.
    pub const KIND_SUPPLY: i64 = 9;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_tree() -> (ClassificationTree, NodeId, NodeId) {
        let mut tree = ClassificationTree::new(Hierarchy::EntityTypes, uids::ENTITY_TYPES);
        let country = tree
            .attach(None, ClassificationNode::new(Level::Country, 225, "United States"))
            .unwrap();
        let kind = tree
            .attach(Some(country), ClassificationNode::new(Level::Kind, 1, "Platform"))
            .unwrap();
        let domain = tree
            .attach(Some(kind), ClassificationNode::new(Level::Domain, 1, "Land"))
            .unwrap();
        let category = tree
            .attach(Some(domain), ClassificationNode::new(Level::Category, 1, "Tank"))
            .unwrap();
        (tree, country, category)
    }

    #[test]
    fn bit_size_rounds_up() {
        assert_eq!(BitSize::from_declared(1), BitSize::Eight);
        assert_eq!(BitSize::from_declared(8), BitSize::Eight);
        assert_eq!(BitSize::from_declared(9), BitSize::Sixteen);
        assert_eq!(BitSize::from_declared(16), BitSize::Sixteen);
        assert_eq!(BitSize::from_declared(17), BitSize::ThirtyTwo);
        assert_eq!(BitSize::from_declared(32).bits(), 32);
    }

    #[test]
    fn attach_rejects_wrong_level() {
        let (mut tree, country, _) = sample_tree();
        let err = tree
            .attach(Some(country), ClassificationNode::new(Level::Specific, 3, "x"))
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::LevelMismatch {
                parent: Some(Level::Country),
                child: Level::Specific
            }
        ));
        assert!(tree
            .attach(None, ClassificationNode::new(Level::Category, 1, "x"))
            .is_err());
    }

    #[test]
    fn ancestors_walk_to_root() {
        let (tree, country, category) = sample_tree();
        let levels: Vec<Level> = tree.ancestors(category).map(|(_, n)| n.level).collect();
        assert_eq!(levels, vec![Level::Domain, Level::Kind, Level::Country]);
        assert_eq!(tree.depth(category), 4);
        assert_eq!(tree.depth(country), 1);
    }

    #[test]
    fn resolved_name_is_set_once() {
        let (mut tree, _, category) = sample_tree();
        tree.set_resolved_name(category, "Tank".to_string()).unwrap();
        assert_eq!(tree.node(category).resolved_name(), Some("Tank"));
        assert!(tree.set_resolved_name(category, "Other".to_string()).is_err());
    }

    #[test]
    fn pre_order_visits_parents_first() {
        let (tree, country, category) = sample_tree();
        let order: Vec<NodeId> = tree.pre_order().collect();
        assert_eq!(order.len(), 4);
        assert_eq!(order.first(), Some(&country));
        assert_eq!(order.last(), Some(&category));
    }

    #[test]
    fn find_child_matches_level_and_value() {
        let (tree, country, _) = sample_tree();
        assert!(tree.find_child(Some(country), Level::Kind, 1).is_some());
        assert!(tree.find_child(Some(country), Level::Kind, 2).is_none());
        assert_eq!(tree.find_child(None, Level::Country, 225), Some(country));
    }

    #[test]
    fn bitfield_padding() {
        let row = |len| BitfieldRow {
            raw_name: "f".into(),
            name: "f".into(),
            bit_position: 0,
            length: len,
            description: String::new(),
            cross_reference: None,
        };
        let bf = BitfieldType {
            uid: "1".into(),
            raw_name: "b".into(),
            name: "b".into(),
            total_bits: 8,
            rows: vec![row(3), row(1)],
        };
        assert_eq!(bf.used_bits(), 4);
        assert_eq!(bf.padding_bits(), 4);
    }
}
