//! Namespace paths of classification nodes.
//!
//! Entity and object roots take their leading segments from path-lookup
//! enumerations. [`PathTable`] maps each logical lookup to the enumeration
//! UID and tree level it serves; [`path`] walks the parent chain.

use disenum_registry::{uids, ClassificationTree, Level, NodeId};

/// A path-lookup enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathTable {
    /// Country codes.
    Country,
    /// Entity kinds.
    EntityKind,
    /// Platform domains.
    PlatformDomain,
    /// Munition domains.
    MunitionDomain,
    /// Supply domains.
    SupplyDomain,
    /// Object kinds.
    ObjectKind,
}

impl PathTable {
    /// Every lookup table.
    pub const ALL: [PathTable; 6] = [
        PathTable::Country,
        PathTable::EntityKind,
        PathTable::PlatformDomain,
        PathTable::MunitionDomain,
        PathTable::SupplyDomain,
        PathTable::ObjectKind,
    ];

    /// Registry UID of the backing enumeration.
    #[must_use]
    pub fn uid(self) -> &'static str {
        match self {
            PathTable::Country => uids::COUNTRY,
            PathTable::EntityKind => uids::ENTITY_KIND,
            PathTable::PlatformDomain => uids::PLATFORM_DOMAIN,
            PathTable::MunitionDomain => uids::MUNITION_DOMAIN,
            PathTable::SupplyDomain => uids::SUPPLY_DOMAIN,
            PathTable::ObjectKind => uids::OBJECT_KIND,
        }
    }

    /// The lookup backed by enumeration `uid`, if any.
    #[must_use]
    pub fn from_uid(uid: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.uid() == uid)
    }

    /// Tree level whose segment the table names.
    #[must_use]
    pub fn level(self) -> Level {
        match self {
            PathTable::Country => Level::Country,
            PathTable::EntityKind | PathTable::ObjectKind => Level::Kind,
            PathTable::PlatformDomain | PathTable::MunitionDomain | PathTable::SupplyDomain => {
                Level::Domain
            }
        }
    }

    /// Domain table selected by an entity kind code.
    #[must_use]
    pub fn domain_for_kind(kind: i64) -> Self {
        match kind {
            uids::KIND_MUNITION => PathTable::MunitionDomain,
            uids::KIND_SUPPLY => PathTable::SupplyDomain,
            _ => PathTable::PlatformDomain,
        }
    }
}

/// The flattened path segment of one node: its resolved identifier with
/// underscores removed, or `<Level><value>` while unresolved.
#[must_use]
pub fn segment(tree: &ClassificationTree, id: NodeId) -> String {
    let node = tree.node(id);
    match node.resolved_name() {
        Some(name) => name.replace('_', ""),
        None => format!("{}{}", node.level, node.value),
    }
}

/// Segments from the root down to `id` itself, root first.
#[must_use]
pub fn path(tree: &ClassificationTree, id: NodeId) -> Vec<String> {
    let mut segments: Vec<String> = std::iter::once(id)
        .chain(tree.ancestors(id).map(|(ancestor, _)| ancestor))
        .map(|n| segment(tree, n))
        .collect();
    segments.reverse();
    segments
}

/// Segments of the namespace that contains `id`: the hierarchy package
/// followed by every ancestor's segment.
#[must_use]
pub fn namespace_of(tree: &ClassificationTree, id: NodeId) -> Vec<String> {
    let mut segments = path(tree, id);
    segments.pop();
    segments.insert(0, tree.hierarchy.package().to_string());
    segments
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use disenum_registry::{ClassificationNode, Hierarchy};

    #[test]
    fn kind_selects_domain_table() {
        assert_eq!(PathTable::domain_for_kind(1), PathTable::PlatformDomain);
        assert_eq!(PathTable::domain_for_kind(2), PathTable::MunitionDomain);
        assert_eq!(PathTable::domain_for_kind(9), PathTable::SupplyDomain);
        assert_eq!(PathTable::domain_for_kind(3), PathTable::PlatformDomain);
    }

    #[test]
    fn tables_round_trip_through_uid() {
        for table in PathTable::ALL {
            assert_eq!(PathTable::from_uid(table.uid()), Some(table));
        }
        assert_eq!(PathTable::from_uid("4"), None);
        assert_eq!(PathTable::ObjectKind.level(), Level::Kind);
    }

    #[test]
    fn path_is_root_first_without_underscores() {
        let mut tree = ClassificationTree::new(Hierarchy::EntityTypes, uids::ENTITY_TYPES);
        let country = tree
            .attach(None, ClassificationNode::new(Level::Country, 225, "United_States"))
            .unwrap();
        tree.set_resolved_name(country, "United_States".into()).unwrap();
        let kind = tree
            .attach(Some(country), ClassificationNode::new(Level::Kind, 1, "Platform"))
            .unwrap();
        tree.set_resolved_name(kind, "Platform".into()).unwrap();
        let domain = tree
            .attach(Some(kind), ClassificationNode::new(Level::Domain, 1, "Land"))
            .unwrap();
        tree.set_resolved_name(domain, "Land".into()).unwrap();
        let tank = tree
            .attach(Some(domain), ClassificationNode::new(Level::Category, 1, "Tank"))
            .unwrap();

        assert_eq!(path(&tree, tank), vec!["UnitedStates", "Platform", "Land", "Category1"]);
        assert_eq!(
            namespace_of(&tree, tank),
            vec!["entities", "UnitedStates", "Platform", "Land"]
        );
    }
}
