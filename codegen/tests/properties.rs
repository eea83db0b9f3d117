//! Property-based tests for identifier resolution.

use std::collections::HashSet;

use proptest::prelude::*;

use disenum_codegen::{resolve_str, Overrides};
use disenum_codegen::identifier::{compose_with_ancestors, lookup_key, NameScope};
use disenum_codegen::normalize::{is_numeric, normalize, UNDEFINED_NAME};
use disenum_codegen::overflow::split;
use disenum_codegen::path::path;
use disenum_registry::{
    uids, BitSize, ClassificationNode, ClassificationTree, EnumerationRow, EnumerationType,
    Hierarchy, Level,
};

// =============================================================================
// Normalization
// =============================================================================

proptest! {
    /// resolving the same registry twice assigns the same identifiers
    #[test]
    fn prop_resolution_deterministic(descriptions in prop::collection::vec("[A-Za-z0-9 ()-]{0,12}", 1..40)) {
        let mut xml = String::from(r#"<ebv><enum uid="50" name="Sample" size="8">"#);
        for (value, description) in descriptions.iter().enumerate() {
            xml.push_str(&format!(r#"<enumrow value="{value}" description="{description}"/>"#));
        }
        xml.push_str("</enum></ebv>");

        let names = || -> Vec<String> {
            let resolution = resolve_str(&xml, &Overrides::default(), 4096).unwrap();
            resolution.model.enumerations[0].rows.iter().map(|r| r.name.clone()).collect()
        };
        let first = names();
        prop_assert_eq!(first.len(), descriptions.len());
        prop_assert_eq!(first, names());
    }

    /// output is a non-empty identifier fragment that never starts with a digit
    #[test]
    fn prop_normalize_is_identifier(raw in "\\PC{0,40}") {
        let s = normalize(&raw);
        prop_assert!(!s.is_empty());
        prop_assert!(s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        prop_assert!(!s.starts_with(|c: char| c.is_ascii_digit()));
        prop_assert!(!s.contains("__"));
    }
}

// =============================================================================
// Uniqueness
// =============================================================================

proptest! {
    /// every claim in one scope is distinct, ignoring case
    #[test]
    fn prop_siblings_unique(bases in prop::collection::vec("[A-Za-z]{1,3}", 1..60)) {
        let mut scope = NameScope::new();
        let mut seen = HashSet::new();
        for base in &bases {
            let name = scope.claim(base).unwrap();
            prop_assert!(name.starts_with(base.as_str()));
            prop_assert!(seen.insert(lookup_key(&name)), "duplicate {}", name);
        }
    }

    /// no two children of any resolved tree node share a name, ignoring case
    #[test]
    fn prop_resolved_siblings_unique(
        categories in prop::collection::vec(
            ("[A-Za-z0-9 ]{0,6}", prop::collection::vec("[A-Za-z0-9 ]{0,6}", 0..5)),
            1..16,
        ),
    ) {
        let mut xml = String::from(r#"<ebv><cet uid="30"><entity kind="1" domain="1" country="225">"#);
        for (c, (description, subcategories)) in categories.iter().enumerate() {
            xml.push_str(&format!(r#"<category value="{c}" description="{description}">"#));
            for (s, sub) in subcategories.iter().enumerate() {
                xml.push_str(&format!(r#"<subcategory value="{s}" description="{sub}"/>"#));
            }
            xml.push_str("</category>");
        }
        xml.push_str("</entity></cet></ebv>");

        let resolution = resolve_str(&xml, &Overrides::default(), 4096).unwrap();
        let tree = &resolution.model.trees[0];
        let parents = std::iter::once(None).chain(tree.pre_order().map(Some));
        for parent in parents {
            let mut seen = HashSet::new();
            for &child in tree.children_of(parent) {
                let name = tree.node(child).resolved_name().unwrap();
                prop_assert!(seen.insert(lookup_key(name)), "duplicate {} under {:?}", name, parent);
            }
        }
    }

    /// a numeric leaf with at least one named ancestor never stays numeric
    #[test]
    fn prop_no_numeric_identifiers(
        leaf in 0u32..10_000,
        parents in prop::collection::vec("[0-9]{1,3}|[A-Za-z][A-Za-z ]{0,10}", 0..4),
        named in "[A-Za-z][A-Za-z ]{0,10}",
    ) {
        let mut ancestors: Vec<String> = parents;
        ancestors.push(named);
        let resolved = compose_with_ancestors(
            normalize(&leaf.to_string()),
            ancestors.iter().map(String::as_str),
        );
        prop_assert!(!is_numeric(&resolved), "{}", resolved);
        prop_assert!(resolved.ends_with(&leaf.to_string()));
    }
}

// =============================================================================
// Paths and overflow
// =============================================================================

proptest! {
    /// a node's path extends its parent's path by one segment
    #[test]
    fn prop_path_extends_parent(categories in 1usize..5, subcategories in 0usize..4) {
        let mut tree = ClassificationTree::new(Hierarchy::EntityTypes, uids::ENTITY_TYPES);
        let country = tree.attach(None, ClassificationNode::new(Level::Country, 225, "USA")).unwrap();
        let kind = tree.attach(Some(country), ClassificationNode::new(Level::Kind, 1, "Platform")).unwrap();
        let domain = tree.attach(Some(kind), ClassificationNode::new(Level::Domain, 1, "Land")).unwrap();
        for c in 0..categories {
            let cat = tree
                .attach(Some(domain), ClassificationNode::new(Level::Category, c as i64, format!("C{c}")))
                .unwrap();
            tree.set_resolved_name(cat, format!("C_{c}")).unwrap();
            for s in 0..subcategories {
                tree.attach(Some(cat), ClassificationNode::new(Level::SubCategory, s as i64, "0"))
                    .unwrap();
            }
        }
        for id in tree.pre_order() {
            let segments = path(&tree, id);
            prop_assert_eq!(segments.len(), tree.depth(id));
            if let Some(parent) = tree.node(id).parent() {
                let parent_segments = path(&tree, parent);
                prop_assert_eq!(&segments[..segments.len() - 1], &parent_segments[..]);
            }
        }
    }

    /// splitting keeps every row exactly once, in order, within the ceiling
    #[test]
    fn prop_overflow_complete(rows in 0usize..300, ceiling in 1usize..120) {
        let ty = EnumerationType {
            uid: "500".into(),
            raw_name: "Foo".into(),
            name: "Foo".into(),
            bit_size: BitSize::Sixteen,
            footnote: None,
            rows: (0..rows)
                .map(|i| EnumerationRow {
                    value: i as i64,
                    range_end: None,
                    description: format!("Row {i}"),
                    footnote: None,
                    cross_reference: None,
                    base_name: format!("Row_{i}"),
                    name: format!("Row_{i}"),
                })
                .collect(),
        };
        let mut types = NameScope::new();
        types.claim("Foo").unwrap();
        let parts = split(ty, ceiling, &mut types).unwrap();

        prop_assert_eq!(parts.len(), rows.div_ceil(ceiling).max(1));
        prop_assert_eq!(parts[0].name.as_str(), "Foo");
        let values: Vec<i64> = parts.iter().flat_map(|p| p.rows.iter().map(|r| r.value)).collect();
        prop_assert_eq!(values, (0..rows as i64).collect::<Vec<_>>());
        prop_assert!(parts.iter().all(|p| p.rows.len() <= ceiling));
        let names: HashSet<&str> = parts.iter().map(|p| p.name.as_str()).collect();
        prop_assert_eq!(names.len(), parts.len());
    }
}

#[test]
fn undefined_name_is_stable() {
    assert_eq!(normalize(UNDEFINED_NAME), UNDEFINED_NAME);
}
