//! Pass 2: the hierarchical model builder.
//!
//! Consumes registry events and materializes enumerations, bitfields,
//! dictionaries and classification trees. Every element is resolved when it
//! closes; a classification tree is complete when its top-level subtree
//! closes. Deprecated elements and unselected subtrees are skipped without
//! consuming a uniqueness slot.

use std::collections::{HashMap, HashSet};
use std::io::BufRead;

use disenum_registry::{
    uids, BitSize, BitfieldRow, BitfieldType, ClassificationNode, ClassificationTree,
    DictionaryRow, DictionaryType, Element, ElementKind, EnumerationRow, EnumerationType,
    Hierarchy, Level, NodeId, RegistryEvent, RegistryModel, RegistryReader,
};

use crate::config::Overrides;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::CodegenError;
use crate::identifier::{resolve, NameScope};
use crate::overflow;
use crate::path::PathTable;
use crate::uid_table::UidTable;

/// What to do when an open element closes.
enum Open {
    Type,
    Row(Element),
    Tree,
    Node(NodeId),
    Root,
    Other,
}

/// A type declaration being filled with rows.
enum TypeFrame {
    Enumeration(EnumerationType, NameScope),
    Bitfield(BitfieldType, NameScope),
    Dictionary(DictionaryType, NameScope),
}

/// A classification tree being assembled.
struct TreeFrame {
    tree: ClassificationTree,
    scopes: HashMap<Option<NodeId>, NameScope>,
    cursor: Vec<NodeId>,
}

impl TreeFrame {
    fn new(hierarchy: Hierarchy, uid: &str) -> Self {
        Self {
            tree: ClassificationTree::new(hierarchy, uid),
            scopes: HashMap::new(),
            cursor: Vec::new(),
        }
    }

    fn parent(&self) -> Option<NodeId> {
        self.cursor.last().copied()
    }

    /// Resolves one node in its sibling scope.
    fn resolve_node(
        &mut self,
        id: NodeId,
        overrides: &Overrides,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), CodegenError> {
        let node = self.tree.node(id);
        let fixed = overrides.special_case(&self.tree.uid, &node.raw_description);
        let subject = format!("{} {} in tree {}", node.level, node.value, self.tree.uid);
        let scope = self.scopes.entry(node.parent()).or_default();
        let resolved = resolve(
            &node.raw_description,
            fixed,
            self.tree.ancestors(id).map(|(_, a)| a.raw_description.as_str()),
            scope,
            diagnostics,
            &subject,
        )?;
        self.tree.set_resolved_name(id, resolved.name)?;
        Ok(())
    }
}

/// Builds the registry model from a second scan of the registry.
pub struct ModelBuilder<'a> {
    table: &'a UidTable,
    overrides: &'a Overrides,
    diagnostics: &'a mut Diagnostics,
    row_ceiling: usize,
    types: NameScope,
    emitted: HashSet<String>,
    model: RegistryModel,
    open: Vec<Open>,
    current: Option<TypeFrame>,
    tree: Option<TreeFrame>,
}

impl<'a> ModelBuilder<'a> {
    /// Creates a builder over a finished UID table.
    pub fn new(
        table: &'a UidTable,
        overrides: &'a Overrides,
        diagnostics: &'a mut Diagnostics,
        row_ceiling: usize,
    ) -> Self {
        Self {
            table,
            overrides,
            diagnostics,
            row_ceiling,
            types: table.type_scope(),
            emitted: HashSet::new(),
            model: RegistryModel {
                revision: table.revision().cloned(),
                ..RegistryModel::default()
            },
            open: Vec::new(),
            current: None,
            tree: None,
        }
    }

    /// Consumes every event of `reader` and returns the model.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed XML, a missing required attribute, a
    /// classification element under the wrong parent level, or an exhausted
    /// uniqueness scope.
    pub fn build<R: BufRead>(
        mut self,
        reader: &mut RegistryReader<R>,
    ) -> Result<RegistryModel, CodegenError> {
        loop {
            match reader.next_event()? {
                RegistryEvent::Eof => break,
                RegistryEvent::Start(element) => {
                    if element.is_deprecated() {
                        tracing::trace!(tag = %element.tag, position = element.position, "skipping deprecated element");
                        reader.skip_element()?;
                        continue;
                    }
                    match self.start(element)? {
                        Some(open) => self.open.push(open),
                        None => reader.skip_element()?,
                    }
                }
                RegistryEvent::End(_) => {
                    if let Some(open) = self.open.pop() {
                        self.end(open)?;
                    }
                }
            }
        }
        tracing::debug!(
            enumerations = self.model.enumerations.len(),
            bitfields = self.model.bitfields.len(),
            dictionaries = self.model.dictionaries.len(),
            classifications = self.model.classification_count(),
            "model built"
        );
        Ok(self.model)
    }

    /// Handles an opening element. `None` skips the element's subtree.
    fn start(&mut self, element: Element) -> Result<Option<Open>, CodegenError> {
        match element.kind {
            ElementKind::Enum | ElementKind::Bitfield | ElementKind::Dict => {
                if self.current.is_some() || self.tree.is_some() {
                    return Ok(None);
                }
                self.open_type(&element)
            }
            ElementKind::EnumRow
            | ElementKind::EnumRowRange
            | ElementKind::BitfieldRow
            | ElementKind::DictRow => {
                let accepted = matches!(
                    (&self.current, element.kind),
                    (
                        Some(TypeFrame::Enumeration(..)),
                        ElementKind::EnumRow | ElementKind::EnumRowRange
                    ) | (Some(TypeFrame::Bitfield(..)), ElementKind::BitfieldRow)
                        | (Some(TypeFrame::Dictionary(..)), ElementKind::DictRow)
                );
                Ok(accepted.then_some(Open::Row(element)))
            }
            ElementKind::Cet => Ok(self.open_selected(&element, uids::ENTITY_TYPES, Hierarchy::EntityTypes)),
            ElementKind::Cot => Ok(self.open_selected(&element, uids::OBJECT_TYPES, Hierarchy::ObjectTypes)),
            ElementKind::JammerTechnique => {
                let uid = element.uid().unwrap_or(uids::JAMMER_TECHNIQUES).to_string();
                Ok(self.open_tree(&uid, Hierarchy::JammerTechniques))
            }
            ElementKind::Entity | ElementKind::Object => self.open_root(&element),
            ElementKind::Category
            | ElementKind::SubCategory
            | ElementKind::SubCategoryRange
            | ElementKind::Specific
            | ElementKind::Extra
            | ElementKind::JammerKind
            | ElementKind::JammerCategory
            | ElementKind::JammerSubCategory
            | ElementKind::JammerSpecific => self.open_node(&element),
            ElementKind::Revision | ElementKind::Other => Ok(Some(Open::Other)),
        }
    }

    fn open_type(&mut self, element: &Element) -> Result<Option<Open>, CodegenError> {
        let Some(uid) = element.uid() else {
            tracing::debug!(tag = %element.tag, position = element.position, "declaration without uid skipped");
            return Ok(None);
        };
        let Some(name) = self.table.name(uid) else {
            return Ok(None);
        };
        if !self.emitted.insert(uid.to_string()) {
            return Ok(None);
        }
        let raw_name = element.attr("name").unwrap_or_default().to_string();
        let frame = match element.kind {
            ElementKind::Enum => {
                let declared = element.int("size")?.unwrap_or(8);
                TypeFrame::Enumeration(
                    EnumerationType {
                        uid: uid.to_string(),
                        raw_name,
                        name: name.to_string(),
                        bit_size: BitSize::from_declared(u32::try_from(declared).unwrap_or(u32::MAX)),
                        footnote: element.attr("footnote").map(str::to_string),
                        rows: Vec::new(),
                    },
                    NameScope::new(),
                )
            }
            ElementKind::Bitfield => TypeFrame::Bitfield(
                BitfieldType {
                    uid: uid.to_string(),
                    raw_name,
                    name: name.to_string(),
                    total_bits: u32::try_from(element.required_int("size")?).unwrap_or(0),
                    rows: Vec::new(),
                },
                NameScope::new(),
            ),
            _ => TypeFrame::Dictionary(
                DictionaryType {
                    uid: uid.to_string(),
                    raw_name,
                    name: name.to_string(),
                    rows: Vec::new(),
                },
                NameScope::new(),
            ),
        };
        self.current = Some(frame);
        Ok(Some(Open::Type))
    }

    /// Opens a `<cet>` or `<cot>` only when it carries exactly `selected_uid`.
    fn open_selected(
        &mut self,
        element: &Element,
        selected_uid: &str,
        hierarchy: Hierarchy,
    ) -> Option<Open> {
        if element.uid() != Some(selected_uid) {
            tracing::debug!(tag = %element.tag, uid = ?element.uid(), "unselected subtree skipped");
            return None;
        }
        self.open_tree(selected_uid, hierarchy)
    }

    fn open_tree(&mut self, uid: &str, hierarchy: Hierarchy) -> Option<Open> {
        if self.tree.is_some() || self.current.is_some() {
            return None;
        }
        self.tree = Some(TreeFrame::new(hierarchy, uid));
        Some(Open::Tree)
    }

    /// Materializes the leading path nodes of an `<entity>` or `<object>`.
    fn open_root(&mut self, element: &Element) -> Result<Option<Open>, CodegenError> {
        let Some(frame) = self.tree.as_mut() else {
            return Ok(None);
        };
        if !frame.cursor.is_empty() {
            return Ok(None);
        }
        let kind = element.required_int("kind")?;
        let domain = element.required_int("domain")?;
        let steps = match frame.tree.hierarchy {
            Hierarchy::EntityTypes => vec![
                (PathTable::Country, element.required_int("country")?),
                (PathTable::EntityKind, kind),
                (PathTable::domain_for_kind(kind), domain),
            ],
            Hierarchy::ObjectTypes => vec![
                (PathTable::ObjectKind, kind),
                (PathTable::PlatformDomain, domain),
            ],
            Hierarchy::JammerTechniques => return Ok(None),
        };

        let mut parent = None;
        for (lookup, code) in steps {
            parent = Some(path_node(frame, self.table, self.diagnostics, parent, lookup, code)?);
        }
        if let Some(last) = parent {
            frame.cursor.push(last);
        }
        Ok(Some(Open::Root))
    }

    fn open_node(&mut self, element: &Element) -> Result<Option<Open>, CodegenError> {
        let Some(frame) = self.tree.as_mut() else {
            return Ok(None);
        };
        let level = match element.kind {
            ElementKind::Category => Level::Category,
            ElementKind::SubCategory | ElementKind::SubCategoryRange => Level::SubCategory,
            ElementKind::Specific => Level::Specific,
            ElementKind::Extra => Level::Extra,
            ElementKind::JammerKind => Level::JammerKind,
            ElementKind::JammerCategory => Level::JammerCategory,
            ElementKind::JammerSubCategory => Level::JammerSubCategory,
            _ => Level::JammerSpecific,
        };
        let value = match element.int("value")? {
            Some(v) => v,
            None => element.required_int("value_min")?,
        };
        let node = ClassificationNode::new(level, value, element.description())
            .with_uid(element.uid().map(str::to_string));
        let parent = frame.parent();
        let id = frame.tree.attach(parent, node)?;
        frame.cursor.push(id);
        Ok(Some(Open::Node(id)))
    }

    fn end(&mut self, open: Open) -> Result<(), CodegenError> {
        match open {
            Open::Other => {}
            Open::Row(element) => self.close_row(&element)?,
            Open::Type => self.close_type()?,
            Open::Node(id) => {
                if let Some(frame) = self.tree.as_mut() {
                    frame.cursor.pop();
                    frame.resolve_node(id, self.overrides, self.diagnostics)?;
                }
            }
            Open::Root => {
                if let Some(frame) = self.tree.as_mut() {
                    frame.cursor.pop();
                }
            }
            Open::Tree => {
                if let Some(frame) = self.tree.take() {
                    tracing::debug!(
                        uid = %frame.tree.uid,
                        nodes = frame.tree.len(),
                        "classification tree closed"
                    );
                    self.model.trees.push(frame.tree);
                }
            }
        }
        Ok(())
    }

    fn close_row(&mut self, element: &Element) -> Result<(), CodegenError> {
        let Some(frame) = self.current.as_mut() else {
            return Ok(());
        };
        match frame {
            TypeFrame::Enumeration(ty, scope) => {
                let (value, range_end) = match element.int("value")? {
                    Some(v) => (v, None),
                    None => (
                        element.required_int("value_min")?,
                        element.int("value_max")?,
                    ),
                };
                let subject = format!("enum {} row {value}", ty.uid);
                let description = element.description().to_string();
                let fixed = self.overrides.enumeration_row(&ty.uid, value, &description);
                let resolved = resolve(
                    &description,
                    fixed,
                    [ty.raw_name.as_str()],
                    scope,
                    self.diagnostics,
                    &subject,
                )?;
                let cross_reference = element
                    .attr("xref")
                    .map(|uid| self.table.cross_reference(uid.trim(), &subject, self.diagnostics));
                ty.rows.push(EnumerationRow {
                    value,
                    range_end,
                    description,
                    footnote: element.attr("footnote").map(str::to_string),
                    cross_reference,
                    base_name: resolved.base,
                    name: resolved.name,
                });
            }
            TypeFrame::Bitfield(ty, scope) => {
                let raw_name = element
                    .attr("name")
                    .unwrap_or_else(|| element.description())
                    .to_string();
                let subject = format!("bitfield {} row {raw_name:?}", ty.uid);
                let resolved = resolve(
                    &raw_name,
                    None,
                    [ty.raw_name.as_str()],
                    scope,
                    self.diagnostics,
                    &subject,
                )?;
                let bit_position = u32::try_from(element.required_int("bit_position")?).unwrap_or(0);
                let length = u32::try_from(element.int("length")?.unwrap_or(1))
                    .unwrap_or(1)
                    .max(1);
                let cross_reference = element
                    .attr("xref")
                    .map(|uid| self.table.cross_reference(uid.trim(), &subject, self.diagnostics));
                ty.rows.push(BitfieldRow {
                    raw_name,
                    name: resolved.name,
                    bit_position,
                    length,
                    description: element.attr("description").unwrap_or_default().to_string(),
                    cross_reference,
                });
            }
            TypeFrame::Dictionary(ty, scope) => {
                let value = element.required("value")?.to_string();
                let description = element.attr("description").unwrap_or(value.as_str()).to_string();
                let subject = format!("dict {} row {value:?}", ty.uid);
                let resolved = resolve(
                    &description,
                    None,
                    [ty.raw_name.as_str()],
                    scope,
                    self.diagnostics,
                    &subject,
                )?;
                ty.rows.push(DictionaryRow {
                    value,
                    description,
                    name: resolved.name,
                });
            }
        }
        Ok(())
    }

    fn close_type(&mut self) -> Result<(), CodegenError> {
        match self.current.take() {
            Some(TypeFrame::Enumeration(ty, _)) => {
                let parts = overflow::split(ty, self.row_ceiling, &mut self.types)?;
                self.model.enumerations.extend(parts);
            }
            Some(TypeFrame::Bitfield(ty, _)) => {
                let overflow = ty.rows.iter().any(|r| {
                    r.bit_position.saturating_add(r.length) > ty.total_bits
                });
                if ty.used_bits() > ty.total_bits || overflow {
                    self.diagnostics.push(
                        DiagnosticKind::BitfieldOverflow,
                        format!("bitfield {}", ty.uid),
                        format!(
                            "fields use {} bits but the declared size is {}",
                            ty.used_bits(),
                            ty.total_bits
                        ),
                    );
                }
                self.model.bitfields.push(ty);
            }
            Some(TypeFrame::Dictionary(ty, _)) => self.model.dictionaries.push(ty),
            None => {}
        }
        Ok(())
    }
}

/// Finds or creates one path-only node named from a lookup table.
fn path_node(
    frame: &mut TreeFrame,
    table: &UidTable,
    diagnostics: &mut Diagnostics,
    parent: Option<NodeId>,
    lookup: PathTable,
    code: i64,
) -> Result<NodeId, CodegenError> {
    let level = lookup.level();
    if let Some(id) = frame.tree.find_child(parent, level, code) {
        return Ok(id);
    }

    let label = match table.label(lookup, code) {
        Some(label) => label.to_string(),
        None => {
            diagnostics.push(
                DiagnosticKind::UnresolvedReference,
                format!("{level} {code} in tree {}", frame.tree.uid),
                format!("code {code} has no row in enumeration {}", lookup.uid()),
            );
            format!("{level}{code}")
        }
    };
    let id = frame
        .tree
        .attach(parent, ClassificationNode::new(level, code, label.clone()))?;
    let name = frame.scopes.entry(parent).or_default().claim(&label)?;
    frame.tree.set_resolved_name(id, name)?;
    Ok(id)
}
