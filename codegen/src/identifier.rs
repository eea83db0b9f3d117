//! Identifier resolution: normalization, numeric disambiguation through the
//! parent chain, and per-scope uniqueness.

use std::collections::HashSet;

use crate::diagnostics::Diagnostics;
use crate::error::CodegenError;
use crate::normalize::{is_numeric, normalize, UNDEFINED_NAME};

/// Maximum number of candidates tried before a scope is declared exhausted.
pub const MAX_SUFFIX_ATTEMPTS: usize = 1000;

/// The set of identifiers already taken under one parent.
///
/// Comparison is case-insensitive; the upper-cased identifier is the lookup
/// key, while the returned identifier keeps its case.
#[derive(Debug, Default, Clone)]
pub struct NameScope {
    taken: HashSet<String>,
}

impl NameScope {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `base`, or the first free `base1`, `base2`, ...
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::UniquenessExhausted`] after
    /// [`MAX_SUFFIX_ATTEMPTS`] collisions.
    pub fn claim(&mut self, base: &str) -> Result<String, CodegenError> {
        for attempt in 0..MAX_SUFFIX_ATTEMPTS {
            let candidate = if attempt == 0 {
                base.to_string()
            } else {
                format!("{base}{attempt}")
            };
            if self.taken.insert(lookup_key(&candidate)) {
                return Ok(candidate);
            }
        }
        Err(CodegenError::UniquenessExhausted {
            name: base.to_string(),
            attempts: MAX_SUFFIX_ATTEMPTS,
        })
    }

    /// Marks `name` as taken without suffixing. Returns false if it already
    /// was.
    pub fn reserve(&mut self, name: &str) -> bool {
        self.taken.insert(lookup_key(name))
    }

    /// Returns true if `name` is taken, ignoring case.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.taken.contains(&lookup_key(name))
    }

    /// Number of claimed identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.taken.len()
    }

    /// Returns true if nothing has been claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}

/// Internal lookup key of an identifier.
#[must_use]
pub fn lookup_key(name: &str) -> String {
    name.to_uppercase()
}

/// Prefixes a numeric identifier with its ancestors' descriptions until it
/// contains a letter.
///
/// `ancestors` yields raw parent descriptions, nearest first. When every
/// ancestor is exhausted the result keeps a single leading underscore.
#[must_use]
pub fn compose_with_ancestors<'a, I>(base: String, ancestors: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    if !is_numeric(&base) {
        return base;
    }
    let mut composite = base.trim_start_matches('_').to_string();
    for raw in ancestors {
        let prefix = normalize(raw);
        let prefix = prefix.trim_matches('_');
        composite = format!("{prefix}_{composite}");
        if !is_numeric(&composite) {
            return composite;
        }
    }
    format!("_{composite}")
}

/// Result of resolving one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    /// Identifier before the uniqueness suffix.
    pub base: String,
    /// Final identifier.
    pub name: String,
}

/// Resolves the identifier of one node.
///
/// `fixed` short-circuits normalization (special cases and aliases); it
/// still takes part in uniqueness. `subject` names the node in diagnostics.
///
/// # Errors
///
/// Returns [`CodegenError::UniquenessExhausted`] if the scope is exhausted.
pub fn resolve<'a, I>(
    raw: &str,
    fixed: Option<&str>,
    ancestors: I,
    scope: &mut NameScope,
    diagnostics: &mut Diagnostics,
    subject: &str,
) -> Result<ResolvedName, CodegenError>
where
    I: IntoIterator<Item = &'a str>,
{
    let base = match fixed {
        Some(name) => name.to_string(),
        None => {
            let normalized = normalize(raw);
            if normalized == UNDEFINED_NAME {
                diagnostics.malformed_text(subject, raw);
            }
            compose_with_ancestors(normalized, ancestors)
        }
    };
    let name = scope.claim(&base)?;
    Ok(ResolvedName { base, name })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const NO_ANCESTORS: [&str; 0] = [];

    #[test]
    fn duplicate_siblings_get_suffixes() {
        let mut scope = NameScope::new();
        assert_eq!(scope.claim("Unknown").unwrap(), "Unknown");
        assert_eq!(scope.claim("Unknown").unwrap(), "Unknown1");
        assert_eq!(scope.claim("Unknown").unwrap(), "Unknown2");
    }

    #[test]
    fn uniqueness_ignores_case() {
        let mut scope = NameScope::new();
        assert_eq!(scope.claim("Tank").unwrap(), "Tank");
        assert_eq!(scope.claim("TANK").unwrap(), "TANK1");
        assert!(scope.contains("tank1"));
    }

    #[test]
    fn suffix_skips_names_already_taken() {
        let mut scope = NameScope::new();
        scope.claim("Other1").unwrap();
        scope.claim("Other").unwrap();
        assert_eq!(scope.claim("Other").unwrap(), "Other2");
    }

    #[test]
    fn exhausted_scope_is_fatal() {
        let mut scope = NameScope::new();
        for _ in 0..MAX_SUFFIX_ATTEMPTS {
            scope.claim("Spare").unwrap();
        }
        assert!(matches!(
            scope.claim("Spare"),
            Err(CodegenError::UniquenessExhausted { attempts: MAX_SUFFIX_ATTEMPTS, .. })
        ));
    }

    #[test]
    fn numeric_label_takes_parent_prefix() {
        let composed = compose_with_ancestors(normalize("0"), ["Fixed_Wing", "Land"]);
        assert_eq!(composed, "Fixed_Wing_0");
    }

    #[test]
    fn numeric_parent_walks_further_up() {
        let composed = compose_with_ancestors(normalize("0"), ["12", "Land"]);
        assert_eq!(composed, "Land_12_0");
    }

    #[test]
    fn numeric_label_at_root_keeps_underscore() {
        assert_eq!(compose_with_ancestors(normalize("7"), NO_ANCESTORS), "_7");
        assert_eq!(compose_with_ancestors(normalize("7"), ["3"]), "_3_7");
    }

    #[test]
    fn non_numeric_label_is_untouched() {
        assert_eq!(
            compose_with_ancestors(normalize("Abrams"), ["Tank"]),
            "Abrams"
        );
    }

    #[test]
    fn empty_descriptions_fall_back_and_report() {
        let mut scope = NameScope::new();
        let mut diagnostics = Diagnostics::quiet();
        let first = resolve("", None, NO_ANCESTORS, &mut scope, &mut diagnostics, "row 1").unwrap();
        let second = resolve("()", None, NO_ANCESTORS, &mut scope, &mut diagnostics, "row 2").unwrap();
        assert_eq!(first.name, UNDEFINED_NAME);
        assert_eq!(second.name, format!("{UNDEFINED_NAME}1"));
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn fixed_names_bypass_normalization() {
        let mut scope = NameScope::new();
        let mut diagnostics = Diagnostics::quiet();
        let r = resolve(
            "Object Types-Areal Object",
            Some("ArealObject"),
            NO_ANCESTORS,
            &mut scope,
            &mut diagnostics,
            "node",
        )
        .unwrap();
        assert_eq!(r.name, "ArealObject");
        assert!(diagnostics.is_empty());
    }
}
