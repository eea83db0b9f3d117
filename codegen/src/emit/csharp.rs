//! C# templates.

use std::fmt::Write as FmtWrite;

use disenum_registry::{
    BitSize, BitfieldType, ClassificationTree, DictionaryType, EnumerationType, NodeId,
};

use super::{codes, comment_text, mask, member_scope, RenderContext, SourceFile, Template};
use crate::error::CodegenError;
use crate::mapping::escape_string;

/// Renders C# sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct CSharpTemplate;

fn underlying(size: BitSize) -> &'static str {
    match size {
        BitSize::Eight => "byte",
        BitSize::Sixteen => "ushort",
        BitSize::ThirtyTwo => "uint",
    }
}

fn open(cx: &RenderContext<'_>, title: &str) -> SourceFile {
    let mut f = SourceFile::new();
    let _ = writeln!(f.buf, "// {}", cx.provenance());
    let _ = writeln!(f.buf, "namespace {}", cx.namespace_path());
    f.line("{");
    f.line("    /// <summary>");
    let _ = writeln!(f.buf, "    /// {}", xml_text(title));
    f.line("    /// </summary>");
    f
}

fn close(mut f: SourceFile) -> String {
    f.line("}");
    f.finish()
}

fn xml_text(s: &str) -> String {
    comment_text(s)
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

impl Template for CSharpTemplate {
    fn enumeration(&self, cx: &RenderContext<'_>, e: &EnumerationType) -> Result<String, CodegenError> {
        let name = cx.identifier;
        let mut f = open(cx, &e.raw_name);
        let _ = writeln!(f.buf, "    public enum {name} : {}", underlying(e.bit_size));
        f.line("    {");
        for row in &e.rows {
            let _ = writeln!(f.buf, "        /// <summary>{}</summary>", xml_text(&row.description));
            let _ = writeln!(f.buf, "        {} = {},", cx.member(&row.name), row.value);
        }
        f.line("    }");
        Ok(close(f))
    }

    fn bitfield(&self, cx: &RenderContext<'_>, b: &BitfieldType) -> Result<String, CodegenError> {
        let name = cx.identifier;
        let mut members = member_scope(&["Bits", "SizeBits", "PaddingBits"]);
        let mut f = open(cx, &b.raw_name);
        let _ = writeln!(f.buf, "    public readonly struct {name}");
        f.line("    {");
        let _ = writeln!(f.buf, "        public const int SizeBits = {};", b.total_bits);
        let _ = writeln!(f.buf, "        public const int PaddingBits = {};", b.padding_bits());
        f.blank();
        let _ = writeln!(f.buf, "        public {name}(ulong bits) {{ Bits = bits; }}");
        f.blank();
        f.line("        public ulong Bits { get; }");
        for row in &b.rows {
            let member = members.claim(&cx.member(&row.name))?;
            let extract = format!(
                "(uint)((Bits >> {}) & 0x{:X}UL)",
                row.bit_position,
                mask(row.length)
            );
            f.blank();
            let _ = writeln!(f.buf, "        /// <summary>{}</summary>", xml_text(&row.description));
            match cx.enumeration_ref(row.cross_reference.as_ref()) {
                Some(target) => {
                    let _ = writeln!(
                        f.buf,
                        "        public global::{} {member} => (global::{}){extract};",
                        target.fqn, target.fqn
                    );
                }
                None => {
                    let _ = writeln!(f.buf, "        public uint {member} => {extract};");
                }
            }
        }
        f.line("    }");
        Ok(close(f))
    }

    fn dictionary(&self, cx: &RenderContext<'_>, d: &DictionaryType) -> String {
        let name = cx.identifier;
        let mut f = open(cx, &d.raw_name);
        let _ = writeln!(f.buf, "    public static class {name}");
        f.line("    {");
        for row in &d.rows {
            let _ = writeln!(f.buf, "        /// <summary>{}</summary>", xml_text(&row.description));
            let _ = writeln!(
                f.buf,
                "        public const string {} = \"{}\";",
                cx.member(&row.name),
                escape_string(&row.value)
            );
        }
        f.line("    }");
        close(f)
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
        let _ = writeln!(f.buf, "    public static class {name}");
        f.line("    {");
        let _ = writeln!(f.buf, "        public const string Level = \"{}\";", n.level);
        let _ = writeln!(f.buf, "        public const int Value = {};", n.value);
        let _ = writeln!(
            f.buf,
            "        public const string Description = \"{}\";",
            escape_string(&n.raw_description)
        );
        let _ = writeln!(
            f.buf,
            "        public static readonly int[] Codes = {{ {codes} }};"
        );
        f.line("    }");
        close(f)
    }
}
