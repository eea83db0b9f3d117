//! Python 3 module templates.

use std::fmt::Write as FmtWrite;

use disenum_registry::{BitfieldType, ClassificationTree, DictionaryType, EnumerationType, NodeId};

use super::{codes, comment_text, mask, member_scope, RenderContext, SourceFile, Template};
use crate::error::CodegenError;
use crate::mapping::{escape_string, to_snake_case};

/// Renders Python modules.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonTemplate;

fn open(cx: &RenderContext<'_>, title: &str) -> SourceFile {
    let mut f = SourceFile::new();
    let _ = writeln!(f.buf, "\"\"\"{}", escape_string(&comment_text(title)));
    f.blank();
    f.line(&cx.provenance());
    f.line("\"\"\"");
    f.blank();
    f
}

impl Template for PythonTemplate {
    fn enumeration(&self, cx: &RenderContext<'_>, e: &EnumerationType) -> Result<String, CodegenError> {
        let name = cx.identifier;
        let mut members = member_scope(&["bit_size", "name", "value"]);
        let mut f = open(cx, &e.raw_name);
        f.line("from enum import IntEnum");
        f.blank();
        f.blank();
        let _ = writeln!(f.buf, "class {name}(IntEnum):");
        let _ = writeln!(f.buf, "    \"\"\"{}\"\"\"", escape_string(&comment_text(&e.raw_name)));
        f.blank();
        for row in &e.rows {
            let member = members.claim(&cx.member(&row.name))?;
            let _ = writeln!(f.buf, "    {member} = {}  # {}", row.value, comment_text(&row.description));
        }
        f.blank();
        f.line("    @property");
        f.line("    def bit_size(self) -> int:");
        let _ = writeln!(f.buf, "        return {}", e.bit_size.bits());
        Ok(f.finish())
    }

    fn bitfield(&self, cx: &RenderContext<'_>, b: &BitfieldType) -> Result<String, CodegenError> {
        let name = cx.identifier;
        let mut members = member_scope(&["bits", "SIZE_BITS", "PADDING_BITS"]);
        let mut f = open(cx, &b.raw_name);
        let mut imports: Vec<String> = b
            .rows
            .iter()
            .filter_map(|r| cx.enumeration_ref(r.cross_reference.as_ref()))
            .map(|t| format!("from {} import {}", t.module, t.identifier))
            .collect();
        imports.sort();
        imports.dedup();
        for import in &imports {
            f.line(import);
        }
        if !imports.is_empty() {
            f.blank();
        }
        f.blank();
        let _ = writeln!(f.buf, "class {name}:");
        let _ = writeln!(f.buf, "    \"\"\"{}\"\"\"", escape_string(&comment_text(&b.raw_name)));
        f.blank();
        let _ = writeln!(f.buf, "    SIZE_BITS = {}", b.total_bits);
        let _ = writeln!(f.buf, "    PADDING_BITS = {}", b.padding_bits());
        f.blank();
        f.line("    def __init__(self, bits: int = 0) -> None:");
        f.line("        self.bits = bits");
        for row in &b.rows {
            let member = members.claim(&cx.member(&to_snake_case(&row.name)))?;
            let extract = format!("(self.bits >> {}) & 0x{:X}", row.bit_position, mask(row.length));
            f.blank();
            f.line("    @property");
            match cx.enumeration_ref(row.cross_reference.as_ref()) {
                Some(target) => {
                    let _ = writeln!(f.buf, "    def {member}(self) -> {}:", target.identifier);
                    let _ = writeln!(f.buf, "        \"\"\"{}\"\"\"", escape_string(&comment_text(&row.description)));
                    let _ = writeln!(f.buf, "        return {}({extract})", target.identifier);
                }
                None => {
                    let _ = writeln!(f.buf, "    def {member}(self) -> int:");
                    let _ = writeln!(f.buf, "        \"\"\"{}\"\"\"", escape_string(&comment_text(&row.description)));
                    let _ = writeln!(f.buf, "        return {extract}");
                }
            }
        }
        Ok(f.finish())
    }

    fn dictionary(&self, cx: &RenderContext<'_>, d: &DictionaryType) -> String {
        let name = cx.identifier;
        let mut f = open(cx, &d.raw_name);
        f.blank();
        let _ = writeln!(f.buf, "class {name}:");
        let _ = writeln!(f.buf, "    \"\"\"{}\"\"\"", escape_string(&comment_text(&d.raw_name)));
        f.blank();
        for row in &d.rows {
            let _ = writeln!(
                f.buf,
                "    {} = \"{}\"  # {}",
                cx.member(&row.name),
                escape_string(&row.value),
                comment_text(&row.description)
            );
        }
        if d.rows.is_empty() {
            f.line("    pass");
        }
        f.finish()
    }

    fn classification(
        &self,
        cx: &RenderContext<'_>,
        tree: &ClassificationTree,
        node: NodeId,
    ) -> String {
        let n = tree.node(node);
        let name = cx.identifier;
        let codes = codes(tree, node)
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let mut f = open(cx, &n.raw_description);
        f.blank();
        let _ = writeln!(f.buf, "class {name}:");
        let _ = writeln!(f.buf, "    LEVEL = \"{}\"", n.level);
        let _ = writeln!(f.buf, "    VALUE = {}", n.value);
        let _ = writeln!(f.buf, "    DESCRIPTION = \"{}\"", escape_string(&n.raw_description));
        let _ = writeln!(f.buf, "    CODES = ({codes},)");
        f.finish()
    }

    fn package_marker(&self) -> Option<(&'static str, &'static str)> {
        Some(("__init__.py", ""))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use disenum_registry::{BitfieldRow, CrossReference};

    use crate::emit::{TypeKind, TypeRef};
    use crate::mapping::TargetLanguage;

    #[test]
    fn typed_bitfield_rows_import_their_enumeration() {
        let mut types = HashMap::new();
        types.insert(
            "29".to_string(),
            TypeRef {
                kind: TypeKind::Enumeration,
                identifier: "Country".into(),
                fqn: "opendis.enumerations.country.Country".into(),
                module: "opendis.enumerations.country".into(),
                file: "opendis/enumerations/country.py".into(),
            },
        );
        let row = |name: &str, xref: CrossReference| BitfieldRow {
            raw_name: name.into(),
            name: name.into(),
            bit_position: 0,
            length: 8,
            description: String::new(),
            cross_reference: Some(xref),
        };
        let b = BitfieldType {
            uid: "70".into(),
            raw_name: "Origin".into(),
            name: "Origin".into(),
            total_bits: 16,
            rows: vec![
                row(
                    "Nation",
                    CrossReference::Typed {
                        uid: "29".into(),
                        type_name: "Country".into(),
                    },
                ),
                row("Other", CrossReference::Unresolved { uid: "999".into() }),
            ],
        };
        let namespace = vec!["opendis".to_string(), "bitfields".to_string()];
        let cx = RenderContext {
            language: TargetLanguage::Python,
            namespace: &namespace,
            identifier: "Origin",
            uid: Some("70"),
            revision: None,
            types: &types,
        };
        let text = PythonTemplate.bitfield(&cx, &b).unwrap();
        assert!(text.contains("from opendis.enumerations.country import Country"));
        assert!(text.contains("def nation(self) -> Country:"));
        assert!(text.contains("def other(self) -> int:"));
    }
}
