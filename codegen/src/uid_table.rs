//! Pass 1: the global UID → type name table.
//!
//! A single forward scan names every declared enumeration, bitfield and
//! dictionary before any row is built, so pass 2 can type a
//! cross-reference to a declaration that appears later in the file.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::BufRead;

use disenum_registry::{CrossReference, Element, ElementKind, RegistryEvent, RegistryReader, Revision};

use crate::config::Overrides;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::CodegenError;
use crate::identifier::{resolve, NameScope};
use crate::normalize::{normalize, UNDEFINED_NAME};
use crate::path::PathTable;

/// Row identifiers of one path-lookup enumeration being collected.
struct LookupRows {
    table: PathTable,
    type_raw_name: String,
    scope: NameScope,
    labels: BTreeMap<i64, String>,
}

/// Read-only name context shared by the later passes.
#[derive(Debug, Default)]
pub struct UidTable {
    names: HashMap<String, String>,
    missing: HashSet<String>,
    labels: HashMap<PathTable, BTreeMap<i64, String>>,
    types: NameScope,
    revision: Option<Revision>,
}

impl UidTable {
    /// Scans a registry and builds the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry is unreadable or a scope runs out of
    /// unique names.
    pub fn build<R: BufRead>(
        reader: &mut RegistryReader<R>,
        overrides: &Overrides,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self, CodegenError> {
        let mut table = UidTable::default();
        let mut lookup: Option<LookupRows> = None;
        let mut scratch = Diagnostics::quiet();

        loop {
            match reader.next_event()? {
                RegistryEvent::Eof => break,
                RegistryEvent::End(ElementKind::Enum) => {
                    if let Some(rows) = lookup.take() {
                        table.labels.insert(rows.table, rows.labels);
                    }
                }
                RegistryEvent::End(_) => {}
                RegistryEvent::Start(element) => {
                    if element.is_deprecated() {
                        reader.skip_element()?;
                        continue;
                    }
                    match element.kind {
                        ElementKind::Revision => table.record_revision(&element),
                        ElementKind::Enum | ElementKind::Bitfield | ElementKind::Dict => {
                            let Some(uid) = element.uid() else {
                                continue;
                            };
                            if !table.declare(uid, &element, overrides, diagnostics)? {
                                continue;
                            }
                            if element.kind == ElementKind::Enum {
                                lookup = PathTable::from_uid(uid).map(|t| LookupRows {
                                    table: t,
                                    type_raw_name: element.attr("name").unwrap_or_default().to_string(),
                                    scope: NameScope::new(),
                                    labels: BTreeMap::new(),
                                });
                            }
                        }
                        ElementKind::EnumRow | ElementKind::EnumRowRange => {
                            if let Some(rows) = lookup.as_mut() {
                                let value = match element.int("value")? {
                                    Some(v) => v,
                                    None => element.required_int("value_min")?,
                                };
                                let description = element.description();
                                let fixed =
                                    overrides.enumeration_row(rows.table.uid(), value, description);
                                let resolved = resolve(
                                    description,
                                    fixed,
                                    [rows.type_raw_name.as_str()],
                                    &mut rows.scope,
                                    &mut scratch,
                                    "",
                                )?;
                                rows.labels.insert(value, resolved.name);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        tracing::debug!(
            declared = table.names.len(),
            missing = table.missing.len(),
            lookups = table.labels.len(),
            "uid table built"
        );
        Ok(table)
    }

    fn record_revision(&mut self, element: &Element) {
        if self.revision.is_none() {
            self.revision = Some(Revision {
                title: element.attr("title").unwrap_or_default().to_string(),
                date: element.attr("date").unwrap_or_default().to_string(),
            });
        }
    }

    /// Names one declaration. Returns false when the UID was already seen.
    fn declare(
        &mut self,
        uid: &str,
        element: &Element,
        overrides: &Overrides,
        diagnostics: &mut Diagnostics,
    ) -> Result<bool, CodegenError> {
        if self.names.contains_key(uid) || self.missing.contains(uid) {
            diagnostics.push(
                DiagnosticKind::DuplicateUid,
                format!("{} {uid}", element.tag),
                "UID declared more than once; the first declaration is kept",
            );
            return Ok(false);
        }

        let base = match overrides.uid_name(uid) {
            Some(name) => name.to_string(),
            None => normalize(element.attr("name").unwrap_or_default()),
        };
        if base == UNDEFINED_NAME {
            diagnostics.push(
                DiagnosticKind::MissingName,
                format!("{} {uid}", element.tag),
                "declaration has no usable name; references to it are untyped",
            );
            self.missing.insert(uid.to_string());
            return Ok(true);
        }
        let name = self.types.claim(&base)?;
        self.names.insert(uid.to_string(), name);
        Ok(true)
    }

    /// Resolved type name of a UID.
    #[must_use]
    pub fn name(&self, uid: &str) -> Option<&str> {
        self.names.get(uid).map(String::as_str)
    }

    /// Returns true if the UID was declared without a derivable name.
    #[must_use]
    pub fn is_missing(&self, uid: &str) -> bool {
        self.missing.contains(uid)
    }

    /// Resolves a cross-reference, recording a diagnostic when the UID has
    /// no name.
    pub fn cross_reference(
        &self,
        uid: &str,
        subject: &str,
        diagnostics: &mut Diagnostics,
    ) -> CrossReference {
        match self.name(uid) {
            Some(type_name) => CrossReference::Typed {
                uid: uid.to_string(),
                type_name: type_name.to_string(),
            },
            None => {
                diagnostics.unresolved_reference(subject, uid);
                CrossReference::Unresolved {
                    uid: uid.to_string(),
                }
            }
        }
    }

    /// Row identifier of `value` in a path-lookup enumeration.
    #[must_use]
    pub fn label(&self, table: PathTable, value: i64) -> Option<&str> {
        self.labels.get(&table)?.get(&value).map(String::as_str)
    }

    /// A copy of the global type scope, for names claimed after pass 1.
    #[must_use]
    pub fn type_scope(&self) -> NameScope {
        self.types.clone()
    }

    /// Revision marker of the registry.
    #[must_use]
    pub fn revision(&self) -> Option<&Revision> {
        self.revision.as_ref()
    }

    /// Number of named UIDs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no UID was named.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const REGISTRY: &str = r#"<ebv>
        <revision title="SISO-REF-010" date="2023-08-01"/>
        <revision title="older" date="2020-01-01"/>
        <enum uid="4" name="DIS-PDU Type" size="8">
            <enumrow value="1" description="Entity State"/>
        </enum>
        <enum uid="29" name="Country" size="16">
            <enumrow value="0" description="Other"/>
            <enumrow value="225" description="United States of America (USA)"/>
        </enum>
        <bitfield uid="12" name="Entity Marking" size="8"/>
        <bitfield uid="13" name="Entity Marking" size="8"/>
        <enum uid="40" name="" size="8"/>
        <dict uid="12" name="Duplicate"/>
        <enum uid="99" name="Gone" deprecated="true"><enumrow value="1" description="x"/></enum>
    </ebv>"#;

    fn build() -> (UidTable, Diagnostics) {
        let mut reader = RegistryReader::from_str(REGISTRY);
        let mut diagnostics = Diagnostics::quiet();
        let overrides = Overrides::builtin().unwrap();
        let table = UidTable::build(&mut reader, &overrides, &mut diagnostics).unwrap();
        (table, diagnostics)
    }

    #[test]
    fn overrides_win_over_registry_names() {
        let (table, _) = build();
        assert_eq!(table.name("4"), Some("DisPduType"));
        assert_eq!(table.name("29"), Some("Country"));
    }

    #[test]
    fn type_names_are_globally_unique() {
        let (table, _) = build();
        assert_eq!(table.name("12"), Some("Entity_Marking"));
        assert_eq!(table.name("13"), Some("Entity_Marking1"));
    }

    #[test]
    fn duplicates_and_missing_names_are_reported() {
        let (table, diagnostics) = build();
        assert!(table.is_missing("40"));
        assert_eq!(table.name("40"), None);
        assert_eq!(diagnostics.count(DiagnosticKind::DuplicateUid), 1);
        assert_eq!(diagnostics.count(DiagnosticKind::MissingName), 1);
        assert_eq!(table.name("99"), None);
    }

    #[test]
    fn first_revision_wins() {
        let (table, _) = build();
        assert_eq!(table.revision().unwrap().title, "SISO-REF-010");
    }

    #[test]
    fn lookup_rows_are_resolved() {
        let (table, _) = build();
        assert_eq!(
            table.label(PathTable::Country, 225),
            Some("United_States_of_America_USA")
        );
        assert_eq!(table.label(PathTable::Country, 1), None);
        assert_eq!(table.label(PathTable::EntityKind, 1), None);
    }

    #[test]
    fn unknown_reference_is_untyped() {
        let (table, _) = build();
        let mut diagnostics = Diagnostics::quiet();
        let xref = table.cross_reference("999", "bitfield 12 row f", &mut diagnostics);
        assert_eq!(xref, CrossReference::Unresolved { uid: "999".into() });
        assert_eq!(diagnostics.count(DiagnosticKind::UnresolvedReference), 1);
        assert!(table.cross_reference("4", "row", &mut diagnostics).type_name().is_some());
    }
}
