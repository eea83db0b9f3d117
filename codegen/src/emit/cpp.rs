//! C++17 header templates.

use std::fmt::Write as FmtWrite;

use disenum_registry::{
    BitSize, BitfieldType, ClassificationTree, DictionaryType, EnumerationType, NodeId,
};

use super::{codes, comment_text, mask, member_scope, RenderContext, SourceFile, Template};
use crate::error::CodegenError;
use crate::mapping::escape_string;

/// Renders C++ headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct CppTemplate;

fn underlying(size: BitSize) -> &'static str {
    match size {
        BitSize::Eight => "std::uint8_t",
        BitSize::Sixteen => "std::uint16_t",
        BitSize::ThirtyTwo => "std::uint32_t",
    }
}

fn open(cx: &RenderContext<'_>, title: &str, includes: &[String]) -> SourceFile {
    let mut f = SourceFile::new();
    let _ = writeln!(f.buf, "// {}", comment_text(title));
    let _ = writeln!(f.buf, "// {}", cx.provenance());
    f.line("#pragma once");
    f.blank();
    f.line("#include <cstdint>");
    for include in includes {
        let _ = writeln!(f.buf, "#include {include}");
    }
    f.blank();
    let _ = writeln!(f.buf, "namespace {} {{", cx.namespace_path());
    f.blank();
    f
}

fn close(mut f: SourceFile, cx: &RenderContext<'_>) -> String {
    f.blank();
    let _ = writeln!(f.buf, "}}  // namespace {}", cx.namespace_path());
    f.finish()
}

impl Template for CppTemplate {
    fn enumeration(&self, cx: &RenderContext<'_>, e: &EnumerationType) -> Result<String, CodegenError> {
        let name = cx.identifier;
        let ty = underlying(e.bit_size);
        let mut f = open(cx, &e.raw_name, &[]);
        let _ = writeln!(f.buf, "enum class {name} : {ty} {{");
        for row in &e.rows {
            let _ = writeln!(
                f.buf,
                "    {} = {},  // {}",
                cx.member(&row.name),
                row.value,
                comment_text(&row.description)
            );
        }
        f.line("};");
        f.blank();
        let _ = writeln!(f.buf, "inline const char* description({name} value) {{");
        f.line("    switch (value) {");
        let mut seen = std::collections::HashSet::new();
        for row in &e.rows {
            // duplicate values cannot share a switch
            if !seen.insert(row.value) {
                continue;
            }
            let _ = writeln!(
                f.buf,
                "        case {name}::{}: return \"{}\";",
                cx.member(&row.name),
                escape_string(&row.description)
            );
        }
        f.line("        default: return \"\";");
        f.line("    }");
        f.line("}");
        Ok(close(f, cx))
    }

    fn bitfield(&self, cx: &RenderContext<'_>, b: &BitfieldType) -> Result<String, CodegenError> {
        let name = cx.identifier;
        let mut members = member_scope(&["bits", "kSizeBits", "kPaddingBits"]);
        let includes: Vec<String> = b
            .rows
            .iter()
            .filter_map(|r| cx.enumeration_ref(r.cross_reference.as_ref()))
            .map(|t| format!("\"{}\"", t.file))
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut f = open(cx, &b.raw_name, &includes);
        let _ = writeln!(f.buf, "struct {name} {{");
        let _ = writeln!(f.buf, "    static constexpr unsigned kSizeBits = {};", b.total_bits);
        let _ = writeln!(f.buf, "    static constexpr unsigned kPaddingBits = {};", b.padding_bits());
        f.blank();
        f.line("    std::uint64_t bits = 0;");
        for row in &b.rows {
            let member = members.claim(&cx.member(&row.name))?;
            let extract = format!(
                "static_cast<std::uint32_t>((bits >> {}) & 0x{:X}ULL)",
                row.bit_position,
                mask(row.length)
            );
            f.blank();
            let _ = writeln!(f.buf, "    // {}", comment_text(&row.description));
            match cx.enumeration_ref(row.cross_reference.as_ref()) {
                Some(target) => {
                    let _ = writeln!(
                        f.buf,
                        "    ::{} {member}() const {{ return static_cast<::{}>({extract}); }}",
                        target.fqn, target.fqn
                    );
                }
                None => {
                    let _ = writeln!(
                        f.buf,
                        "    std::uint32_t {member}() const {{ return {extract}; }}"
                    );
                }
            }
        }
        f.line("};");
        Ok(close(f, cx))
    }

    fn dictionary(&self, cx: &RenderContext<'_>, d: &DictionaryType) -> String {
        let name = cx.identifier;
        let mut f = open(cx, &d.raw_name, &[]);
        let _ = writeln!(f.buf, "struct {name} {{");
        for row in &d.rows {
            let _ = writeln!(f.buf, "    // {}", comment_text(&row.description));
            let _ = writeln!(
                f.buf,
                "    static constexpr const char* {} = \"{}\";",
                cx.member(&row.name),
                escape_string(&row.value)
            );
        }
        f.line("};");
        close(f, cx)
    }

    fn classification(
        &self,
        cx: &RenderContext<'_>,
        tree: &ClassificationTree,
        node: NodeId,
    ) -> String {
        let n = tree.node(node);
        let name = cx.identifier;
        let codes = codes(tree, node);
        let list = codes
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let mut f = open(cx, &n.raw_description, &[]);
        let _ = writeln!(f.buf, "struct {name} {{");
        let _ = writeln!(f.buf, "    static constexpr const char* kLevel = \"{}\";", n.level);
        let _ = writeln!(f.buf, "    static constexpr int kValue = {};", n.value);
        let _ = writeln!(
            f.buf,
            "    static constexpr const char* kDescription = \"{}\";",
            escape_string(&n.raw_description)
        );
        let _ = writeln!(
            f.buf,
            "    static constexpr int kCodes[{}] = {{{list}}};",
            codes.len()
        );
        f.line("};");
        close(f, cx)
    }
}
